//! Filters router-annotation fields according to the observable strip
//! flags before they're forwarded on the outgoing side (spec §6
//! "Observable flags"; SPEC_FULL "Strips or forwards router
//! annotations").

use router_proto::annotations::RouterAnnotations;
use router_proto::StripFlags;

/// Apply `flags` to `annotations`, clearing whichever fields the flags
/// say must not be observable downstream. `STRIP_NONE` is a no-op;
/// `STRIP_ALL` clears every field this function knows about.
pub fn apply(flags: StripFlags, mut annotations: RouterAnnotations) -> RouterAnnotations {
    if flags.strips_ingress() {
        annotations.ingress_router = None;
        annotations.ingress_mesh = None;
    }
    if flags.strips_trace() {
        annotations.trace.clear();
    }
    if matches!(flags, StripFlags::All) {
        annotations.to_override = None;
        annotations.flags = 0;
    }
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RouterAnnotations {
        RouterAnnotations {
            ingress_router: Some("router-a".to_string()),
            to_override: Some("amqp://mesh/x".to_string()),
            trace: vec!["router-a".to_string(), "router-b".to_string()],
            flags: 0x03,
            ingress_mesh: Some("mesh1".to_string()),
        }
    }

    #[test]
    fn strip_none_changes_nothing() {
        let out = apply(StripFlags::None, sample());
        assert_eq!(out, sample());
    }

    #[test]
    fn strip_ingress_clears_only_ingress_fields() {
        let out = apply(StripFlags::Ingress, sample());
        assert!(out.ingress_router.is_none());
        assert!(out.ingress_mesh.is_none());
        assert_eq!(out.trace.len(), 2);
        assert!(out.to_override.is_some());
    }

    #[test]
    fn strip_trace_clears_only_trace() {
        let out = apply(StripFlags::Trace, sample());
        assert!(out.trace.is_empty());
        assert!(out.ingress_router.is_some());
    }

    #[test]
    fn strip_all_clears_everything_tracked() {
        let out = apply(StripFlags::All, sample());
        assert!(out.ingress_router.is_none());
        assert!(out.ingress_mesh.is_none());
        assert!(out.trace.is_empty());
        assert!(out.to_override.is_none());
        assert_eq!(out.flags, 0);
    }
}
