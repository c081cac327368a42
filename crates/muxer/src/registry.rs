//! Shared, ordered collection of protocol handlers.

use std::sync::RwLock;

use crate::handler::Handler;

/// Handler collection keyed by protocol identifier.
///
/// Registration order is preserved and is the order the `ls` listing
/// reports. A reader/writer lock serialises mutation against lookup; every
/// accessor returns owned copies so no caller ever iterates under the lock,
/// and handlers are never invoked while it is held. A handler that mutates
/// the registry from inside its callback therefore only affects future
/// negotiations.
#[derive(Debug, Default)]
pub struct Registry {
    handlers: RwLock<Vec<Handler>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, replacing any existing handler with the same
    /// protocol identifier in place (the original listing position is kept).
    pub fn add(&self, handler: Handler) {
        let mut handlers = self.handlers.write().expect("registry lock is never poisoned");
        match handlers
            .iter_mut()
            .find(|existing| existing.protocol() == handler.protocol())
        {
            Some(slot) => *slot = handler,
            None => handlers.push(handler),
        }
    }

    /// Removes the handler for `protocol`; a missing entry is a no-op.
    pub fn remove(&self, protocol: &str) {
        let mut handlers = self.handlers.write().expect("registry lock is never poisoned");
        handlers.retain(|handler| handler.protocol() != protocol);
    }

    /// Looks up the handler registered for `protocol`.
    #[must_use]
    pub fn find(&self, protocol: &str) -> Option<Handler> {
        let handlers = self.handlers.read().expect("registry lock is never poisoned");
        handlers
            .iter()
            .find(|handler| handler.protocol() == protocol)
            .cloned()
    }

    /// Copies out every registered handler, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Handler> {
        let handlers = self.handlers.read().expect("registry lock is never poisoned");
        handlers.clone()
    }

    /// Copies out the registered protocol identifiers, in registration order.
    #[must_use]
    pub fn protocols(&self) -> Vec<String> {
        let handlers = self.handlers.read().expect("registry lock is never poisoned");
        handlers
            .iter()
            .map(|handler| handler.protocol().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Dispatch;

    fn noop(protocol: &str) -> Handler {
        Handler::new(protocol, Dispatch::Neither)
    }

    #[test]
    fn registration_order_is_preserved() {
        let registry = Registry::new();
        for protocol in ["/c", "/a", "/b"] {
            registry.add(noop(protocol));
        }
        assert_eq!(registry.protocols(), ["/c", "/a", "/b"]);
    }

    #[test]
    fn re_registration_replaces_without_duplicating() {
        let registry = Registry::new();
        registry.add(Handler::new("/foo", Dispatch::from_sync(|_, _| false)));
        registry.add(noop("/bar"));
        registry.add(Handler::new("/foo", Dispatch::from_sync(|_, _| true)));

        assert_eq!(registry.protocols(), ["/foo", "/bar"], "position is kept");

        let replacement = registry.find("/foo").expect("handler is registered");
        let mut stream = std::io::Cursor::new(Vec::new());
        assert!(
            replacement.dispatch_sync("/foo", &mut stream),
            "the second registration wins"
        );
    }

    #[test]
    fn remove_is_silent_on_missing_entries() {
        let registry = Registry::new();
        registry.add(noop("/only"));
        registry.remove("/absent");
        assert_eq!(registry.protocols(), ["/only"]);

        registry.remove("/only");
        assert!(registry.protocols().is_empty());
        assert!(registry.find("/only").is_none());
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let registry = Registry::new();
        registry.add(noop("/a"));
        let snapshot = registry.snapshot();

        registry.add(noop("/b"));
        assert_eq!(snapshot.len(), 1, "earlier snapshot is unaffected");
        assert_eq!(registry.snapshot().len(), 2);
    }
}
