use super::types::RequestId;
use crate::endpoint::EndpointId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct PendingMount {
    endpoint: EndpointId,
    issued_at: Instant,
}

/// A registration removed from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Released {
    pub endpoint: EndpointId,
    pub elapsed: Duration,
}

/// Outstanding mount requests, keyed by the primitive's request id.
///
/// Holds at most one entry per endpoint. Only touched from the serialized
/// orchestrator context, so it needs no locking.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    entries: HashMap<RequestId, PendingMount>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `request → endpoint`.
    ///
    /// Returns `false` and leaves the registry unchanged if the endpoint already
    /// has an outstanding request or the id is still in use.
    pub fn register(&mut self, request: RequestId, endpoint: EndpointId) -> bool {
        if self.entries.contains_key(&request) || self.request_for(endpoint).is_some() {
            return false;
        }
        self.entries.insert(
            request,
            PendingMount {
                endpoint,
                issued_at: Instant::now(),
            },
        );
        true
    }

    /// Remove and return a registration. Each id is released at most once.
    pub fn release(&mut self, request: RequestId) -> Option<Released> {
        self.entries.remove(&request).map(|pending| Released {
            endpoint: pending.endpoint,
            elapsed: pending.issued_at.elapsed(),
        })
    }

    pub fn request_for(&self, endpoint: EndpointId) -> Option<RequestId> {
        self.entries
            .iter()
            .find(|(_, pending)| pending.endpoint == endpoint)
            .map(|(id, _)| *id)
    }

    pub fn endpoint_for(&self, request: RequestId) -> Option<EndpointId> {
        self.entries.get(&request).map(|pending| pending.endpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_request_per_endpoint() {
        let mut registry = RequestRegistry::new();
        let e = EndpointId(1);

        assert!(registry.register(RequestId::new(1), e));
        assert!(!registry.register(RequestId::new(2), e));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.request_for(e), Some(RequestId::new(1)));
    }

    #[test]
    fn test_request_ids_are_not_shared() {
        let mut registry = RequestRegistry::new();
        assert!(registry.register(RequestId::new(1), EndpointId(1)));
        assert!(!registry.register(RequestId::new(1), EndpointId(2)));
        assert_eq!(registry.endpoint_for(RequestId::new(1)), Some(EndpointId(1)));
    }

    #[test]
    fn test_release_is_exactly_once() {
        let mut registry = RequestRegistry::new();
        registry.register(RequestId::new(42), EndpointId(3));

        let released = registry.release(RequestId::new(42)).unwrap();
        assert_eq!(released.endpoint, EndpointId(3));
        assert!(registry.release(RequestId::new(42)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_can_be_reused_after_release() {
        let mut registry = RequestRegistry::new();
        registry.register(RequestId::new(5), EndpointId(1));
        registry.release(RequestId::new(5));
        assert!(registry.register(RequestId::new(5), EndpointId(2)));
    }
}
