//! The connection actor: raw-connection event loop, TLS glue, the
//! cross-thread activation discipline, the debounced reconnect timer,
//! and the adapter-global connection registry (spec §4.3, §5).

#![cfg_attr(
    not(test),
    warn(clippy::print_stdout, clippy::dbg_macro),
    deny(clippy::unwrap_used, clippy::expect_used)
)]

pub mod activation;
pub mod actor;
pub mod config;
pub mod reconnect;
pub mod registry;
pub mod session_window;
pub mod tls;

pub use activation::{ActivationRegistry, RequestsRestart, wake_producer_on_unblock};
pub use actor::{ActorFlags, ConnectedOutcome, ConnectionActor};
pub use config::{HttpConnector, HttpListener, RouterConfig};
pub use reconnect::ReconnectTimer;
pub use registry::{ConnectionId, ConnectionRegistry};
pub use session_window::{Q3Signal, SessionWindow};
pub use tls::{PlainTextSession, TlsSession};
