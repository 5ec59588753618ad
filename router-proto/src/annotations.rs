//! Message annotations the adapter reads off an incoming delivery before
//! routing, and the router-annotations section it writes for peer routers
//! (spec §6).

/// Message-annotation keys consulted by the adapter.
pub mod keys {
    pub const TO_OVERRIDE: &str = "qd.to-override";
    pub const STREAMING: &str = "qd.streaming";
    pub const RESEND_RELEASED: &str = "qd.resend-released";
    pub const INGRESS_MESH: &str = "qd.ingress-mesh";
    /// Application-properties key carrying the stream's flow-id reference
    /// (spec §6); ignored when translating app-properties to HTTP/2
    /// headers on egress.
    pub const FLOW_ID: &str = "x-opt-skupper-flow-id";
}

/// Parsed values of the message-annotation keys above, after the content
/// has reached the `MessageAnnotations` parse depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageAnnotations {
    pub to_override: Option<String>,
    pub streaming: bool,
    pub resend_released: bool,
    pub ingress_mesh: Option<String>,
}

/// Router annotations: a private section carrying routing metadata
/// consumed only by peer routers (GLOSSARY).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterAnnotations {
    pub ingress_router: Option<String>,
    pub to_override: Option<String>,
    pub trace: Vec<String>,
    pub flags: u8,
    pub ingress_mesh: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_annotations_carry_no_overrides() {
        let a = MessageAnnotations::default();
        assert!(!a.streaming);
        assert!(a.to_override.is_none());
    }
}
