//! AMQP wire subset and router-core link surface consumed by the HTTP/2
//! adapter (spec §4.4, §6).
//!
//! This crate has no dependency on the streaming message type in
//! `router-message`; `LinkSource` is generic over the message type it
//! carries so the two crates can depend on each other in one direction
//! only (`router-http2` ties them together).

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod amqp;
pub mod annotations;
pub mod delivery;
pub mod link;

pub use delivery::{DeliveryId, Direction, HttpDisposition, Outcome, StripFlags, map_disposition};
pub use link::{Credit, LinkEvents, LinkHandle, LinkSource};
