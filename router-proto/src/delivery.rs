//! Delivery identity and disposition, and the message-annotation /
//! observable-flag vocabulary named in spec §6.

use std::fmt;

/// Direction of a router-core link relative to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Messages flow into the router (an ingress HTTP/2 request, an
    /// egress HTTP/2 response).
    Incoming,
    /// Messages flow out of the router.
    Outgoing,
}

/// AMQP 1.0 delivery outcomes the adapter maps to HTTP/2 status, per
/// spec §4.2 point 5 and the disposition table in §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Released,
    Modified,
    Rejected,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Accepted => "ACCEPTED",
            Self::Released => "RELEASED",
            Self::Modified => "MODIFIED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Opaque identifier for a router-core delivery. The adapter never
/// constructs deliveries itself; it receives handles from the router-core
/// link surface (spec §4.4) and only ever compares or forwards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryId(pub u64);

/// Disposition mapping table from spec §7, kept as plain data so both the
/// ingress and egress paths in `router-http2` share one source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpDisposition {
    /// Synthesize a status on the HTTP/2 stream and set `END_STREAM`.
    SynthesizeStatus(u16),
    /// Close normally; the exchange already completed.
    NormalClose,
    /// Send an empty DATA frame with `END_STREAM` to close the stream.
    EmptyDataEndStream,
}

/// Map a settled AMQP outcome to the HTTP/2-side action, per the table in
/// spec §7. `resend_released` mirrors the `qd.resend-released` message
/// annotation (spec §6): when set, a `RELEASED` outcome on the ingress
/// side is not surfaced as a synthesized 503 because router-core is
/// expected to re-route the delivery instead.
pub fn map_disposition(
    outcome: Outcome,
    direction: Direction,
    resend_released: bool,
) -> Option<HttpDisposition> {
    use Direction::*;
    use Outcome::*;
    match (outcome, direction) {
        (Accepted, _) => Some(HttpDisposition::NormalClose),
        (Released, Incoming) | (Modified, Incoming) => {
            if resend_released && matches!(outcome, Released) {
                None
            } else {
                Some(HttpDisposition::SynthesizeStatus(503))
            }
        }
        (Rejected, Incoming) => Some(HttpDisposition::SynthesizeStatus(400)),
        (Released, Outgoing) | (Modified, Outgoing) | (Rejected, Outgoing) => {
            Some(HttpDisposition::EmptyDataEndStream)
        }
    }
}

/// Observable-flag byte controlling which router-annotation fields are
/// emitted on the outgoing side (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StripFlags {
    None = 0x00,
    Ingress = 0x01,
    Trace = 0x02,
    All = 0xff,
}

impl StripFlags {
    pub fn strips_ingress(self) -> bool {
        matches!(self, Self::Ingress | Self::All)
    }

    pub fn strips_trace(self) -> bool {
        matches!(self, Self::Trace | Self::All)
    }
}
