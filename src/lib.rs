//! Thin umbrella crate tying the router adapter together (mirrors the
//! teacher's own `rama` umbrella crate): re-exports every member crate's
//! public surface under one name, and carries the out-of-core management
//! entities (`HttpListener`, `HttpConnector` rows) an operator or agent
//! queries from outside the data path.

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub use router_error as error;
pub use router_http2 as http2;
pub use router_message as message;
pub use router_proto as proto;
pub use router_transport as transport;

pub use router_error::BoxError;
pub use router_transport::{HttpConnector, HttpListener, RouterConfig};
