//! The HTTP/2-to-message adapter: wraps the `h2` crate's server/client
//! connections, tracks per-stream state, and translates between HTTP/2
//! frames and `router-message` content (spec §4.2, §4.3).

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod config;
pub mod egress;
pub mod ingress;
pub mod session;
pub mod strip;
pub mod stream;
pub mod translate;

pub use config::{Http2Config, check_alpn};
pub use session::{ClientSession, GoAwayBoundary, ProtocolFault, ServerSession};
pub use stream::{StreamRecord, StreamRole, StreamState};
