//! Fixed and tunable values the adapter needs at runtime, gathered into
//! one type so a future management/config-loading layer has somewhere
//! to plug in without the adapter hard-coding magic numbers
//! (SPEC_FULL "Configuration").

use router_http2::config::{INITIAL_WINDOW_SIZE, MAX_FRAME_SIZE};
use router_message::{Q2_LOWER, Q2_UPPER, RESUME_THRESHOLD, RING_SLOTS};
use std::time::Duration;

/// Session-level (Q3) outgoing-buffer thresholds (spec §4.1 "Session-level
/// flow control").
pub const Q3_UPPER: usize = 256;
pub const Q3_LOWER: usize = 128;

/// Debounce window for scheduling an egress reconnect attempt (spec §5
/// "Cancellation & timeout").
pub const RECONNECT_DEBOUNCE: Duration = Duration::from_secs(2);

/// One `httpListener` row (spec §6 "Management surface"): the adapter
/// accepts inbound connections and routes ingress streams to `address`.
#[derive(Debug, Clone)]
pub struct HttpListener {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub address: String,
    pub ssl_profile: Option<String>,
    pub site_id: String,
}

/// One `httpConnector` row: the adapter establishes outbound connections
/// to `host:port` and forwards deliveries addressed to `address`.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub address: String,
    pub ssl_profile: Option<String>,
    pub site_id: String,
}

/// The adapter's runtime configuration: the fixed thresholds spec.md
/// pins as constants, plus the per-listener/per-connector rows that name
/// where connections come from and go to.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub q2_upper: usize,
    pub q2_lower: usize,
    pub q3_upper: usize,
    pub q3_lower: usize,
    pub cut_through_slots: usize,
    pub cut_through_resume_threshold: usize,
    pub http2_initial_window_size: u32,
    pub http2_max_frame_size: u32,
    pub reconnect_debounce: Duration,
    pub listeners: Vec<HttpListener>,
    pub connectors: Vec<HttpConnector>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            q2_upper: Q2_UPPER,
            q2_lower: Q2_LOWER,
            q3_upper: Q3_UPPER,
            q3_lower: Q3_LOWER,
            cut_through_slots: RING_SLOTS,
            cut_through_resume_threshold: RESUME_THRESHOLD,
            http2_initial_window_size: INITIAL_WINDOW_SIZE,
            http2_max_frame_size: MAX_FRAME_SIZE,
            reconnect_debounce: RECONNECT_DEBOUNCE,
            listeners: Vec::new(),
            connectors: Vec::new(),
        }
    }
}
