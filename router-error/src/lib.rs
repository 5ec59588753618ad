//! Error utilities shared across the router adapter crates.
//!
//! `Result<T, E>` is a control flow type; [`std::error::Error`] is a trait
//! for values that can be displayed and chained. This crate keeps those two
//! concepts separate and gives the rest of the workspace a single place to
//! erase concrete error types at boundaries (protocol violation, transport
//! failure, message corruption, ...) without forcing every leaf error to
//! share one enum.
//!
//! [`BoxError`] is the type-erased boundary type. [`ErrorExt`] and
//! [`ErrorContext`] attach structured, logfmt-style context to an error or
//! to a `Result`/`Option` as it propagates. [`OpaqueError`] is a last-resort
//! concrete error for call sites that only have a message or a `Box<dyn
//! Error>` and nothing more specific to report.

#![cfg_attr(test, allow(clippy::float_cmp))]
#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

use std::error::Error as StdError;

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn StdError + Send + Sync>;

mod ext;
mod macros;
pub use ext::{ErrorContext, ErrorExt, OpaqueError};
