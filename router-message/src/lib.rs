//! The streaming, reference-counted message body shared between an
//! incoming and one or more outgoing links: buffer chain, field
//! locators, Q2 per-message flow control, and the cut-through fast path
//! (spec §3, §4.1).
//!
//! This crate owns no link or network state; `router-http2` drives a
//! [`content::MessageContent`] from the HTTP/2 side and hands each
//! consuming stream its own [`handle::MessageHandle`].

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod buffer;
pub mod composed;
pub mod content;
pub mod cut_through;
pub mod field;
pub mod handle;
pub mod weak;
pub mod window;

pub use buffer::{Buffer, BufferList, DEFAULT_BUFFER_CAPACITY};
pub use composed::ComposedField;
pub use content::{DepthCheck, MessageContent, Q2Signal, Q2State, Q2_LOWER, Q2_UPPER};
pub use cut_through::{CutThroughRing, ProduceResult, RESUME_THRESHOLD, RING_SLOTS};
pub use field::{FieldLocator, ParseCursor, Section};
pub use handle::MessageHandle;
pub use weak::{GenerationalTable, SafeHandle};
pub use window::{StreamDataWindow, WindowResult};
