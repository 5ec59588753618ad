//! HTTP/2 session tuning, mirroring the window/frame defaults the teacher
//! pins in its own `proto/h2` server config (spec §6: "initial window
//! 65536 and max frame 16384").

use std::time::Duration;

/// Initial flow-control window, per spec §6.
pub const INITIAL_WINDOW_SIZE: u32 = 65_536;
/// Maximum HTTP/2 frame size, per spec §6.
pub const MAX_FRAME_SIZE: u32 = 16_384;
/// Largest slice handed to a single `send_data` call from the egress
/// DATA read callback (spec §4.2 egress step 3).
pub const MAX_DATA_READ_CHUNK: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct Http2Config {
    pub initial_stream_window_size: u32,
    pub initial_conn_window_size: u32,
    pub max_frame_size: u32,
    pub max_concurrent_streams: Option<u32>,
    pub keep_alive_interval: Option<Duration>,
    pub keep_alive_timeout: Duration,
}

impl Default for Http2Config {
    fn default() -> Self {
        Self {
            initial_stream_window_size: INITIAL_WINDOW_SIZE,
            initial_conn_window_size: INITIAL_WINDOW_SIZE,
            max_frame_size: MAX_FRAME_SIZE,
            max_concurrent_streams: Some(200),
            keep_alive_interval: None,
            keep_alive_timeout: Duration::from_secs(20),
        }
    }
}

impl Http2Config {
    pub fn server_builder(&self) -> h2::server::Builder {
        let mut builder = h2::server::Builder::default();
        builder
            .initial_window_size(self.initial_stream_window_size)
            .initial_connection_window_size(self.initial_conn_window_size)
            .max_frame_size(self.max_frame_size);
        if let Some(max) = self.max_concurrent_streams {
            builder.max_concurrent_streams(max);
        }
        builder
    }

    pub fn client_builder(&self) -> h2::client::Builder {
        let mut builder = h2::client::Builder::default();
        builder
            .initial_window_size(self.initial_stream_window_size)
            .initial_connection_window_size(self.initial_conn_window_size)
            .max_frame_size(self.max_frame_size);
        builder
    }
}

/// ALPN check on TLS handshake completion (spec §4.2 "ALPN"): absence is
/// tolerated, but an advertised protocol other than `"h2"` is rejected.
pub fn check_alpn(advertised: Option<&[u8]>) -> Result<(), AlpnMismatch> {
    match advertised {
        None => Ok(()),
        Some(proto) if proto == b"h2" => Ok(()),
        Some(_) => Err(AlpnMismatch),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlpnMismatch;

impl std::fmt::Display for AlpnMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer advertised an ALPN protocol other than h2")
    }
}

impl std::error::Error for AlpnMismatch {}
