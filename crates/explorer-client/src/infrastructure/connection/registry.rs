//! Message-type handler registry.
//!
//! At most one handler exists per message type; registering again replaces
//! the previous one.  A handler is either *persistent* (stays until removed)
//! or *single-shot* (removed before its first invocation, so a duplicate
//! frame of the same type can never reach it twice).
//!
//! Handlers are always invoked with the registry lock released, so a handler
//! may register or remove handlers itself.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use serde_json::Value;

/// Identifies one registration, so a caller can remove *its own* handler
/// without clobbering a newer one for the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type PersistentHandler = Arc<dyn Fn(Value) + Send + Sync>;
type OnceHandler = Box<dyn FnOnce(Value) + Send>;

enum Handler {
    Persistent(PersistentHandler),
    Once(OnceHandler),
}

struct Registration {
    id: HandlerId,
    handler: Handler,
}

/// Maps message types to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Mutex<HashMap<String, Registration>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent handler for `message_type`.
    pub fn on<F>(&self, message_type: &str, handler: F) -> HandlerId
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.insert(message_type, Handler::Persistent(Arc::new(handler)))
    }

    /// Registers a handler that is removed when the first matching frame
    /// arrives.
    pub fn once<F>(&self, message_type: &str, handler: F) -> HandlerId
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.insert(message_type, Handler::Once(Box::new(handler)))
    }

    /// Removes whatever handler is registered for `message_type`.
    pub fn remove(&self, message_type: &str) -> bool {
        self.lock().remove(message_type).is_some()
    }

    /// Removes the handler for `message_type` only if it is still registration
    /// `id`.
    pub fn remove_if(&self, message_type: &str, id: HandlerId) -> bool {
        let mut entries = self.lock();
        match entries.get(message_type) {
            Some(reg) if reg.id == id => {
                entries.remove(message_type);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, message_type: &str) -> bool {
        self.lock().contains_key(message_type)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `payload` to the handler for `message_type`.
    ///
    /// Returns `false` when no handler is registered (the payload is dropped).
    pub fn dispatch(&self, message_type: &str, payload: Value) -> bool {
        let handler = {
            let mut entries = self.lock();
            let is_once = match entries.get(message_type) {
                None => return false,
                Some(reg) => matches!(reg.handler, Handler::Once(_)),
            };
            if is_once {
                match entries.remove(message_type) {
                    Some(reg) => reg.handler,
                    None => return false,
                }
            } else {
                match entries.get(message_type).map(|reg| &reg.handler) {
                    Some(Handler::Persistent(f)) => Handler::Persistent(Arc::clone(f)),
                    _ => return false,
                }
            }
        };

        match handler {
            Handler::Persistent(f) => f(payload),
            Handler::Once(f) => f(payload),
        }
        true
    }

    fn insert(&self, message_type: &str, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .insert(message_type.to_string(), Registration { id, handler });
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Registration>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<Value>>>, impl Fn(Value) + Send + Sync + Clone) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v| sink.lock().unwrap().push(v))
    }

    #[test]
    fn test_persistent_handler_sees_every_frame() {
        let registry = HandlerRegistry::new();
        let (seen, record) = recorder();
        registry.on("tick", record);

        assert!(registry.dispatch("tick", json!(1)));
        assert!(registry.dispatch("tick", json!(2)));

        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_once_handler_fires_once_and_is_removed() {
        // Arrange
        let registry = HandlerRegistry::new();
        let (seen, record) = recorder();
        registry.once("answer", record);

        // Act
        let first = registry.dispatch("answer", json!("a"));
        let second = registry.dispatch("answer", json!("b"));

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(*seen.lock().unwrap(), vec![json!("a")]);
        assert!(!registry.contains("answer"));
    }

    #[test]
    fn test_new_registration_replaces_previous() {
        let registry = HandlerRegistry::new();
        let (old_seen, old) = recorder();
        let (new_seen, new) = recorder();
        registry.on("t", old);
        registry.on("t", new);

        registry.dispatch("t", json!(null));

        assert!(old_seen.lock().unwrap().is_empty());
        assert_eq!(new_seen.lock().unwrap().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_if_ignores_stale_id() {
        let registry = HandlerRegistry::new();
        let stale = registry.once("t", |_| {});
        let current = registry.once("t", |_| {});

        assert!(!registry.remove_if("t", stale));
        assert!(registry.contains("t"));
        assert!(registry.remove_if("t", current));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dispatch_without_handler_returns_false() {
        let registry = HandlerRegistry::new();
        assert!(!registry.dispatch("nobody", json!({})));
    }

    #[test]
    fn test_handler_may_reregister_itself_without_deadlock() {
        let registry = Arc::new(HandlerRegistry::new());
        let (seen, record) = recorder();
        let inner = Arc::clone(&registry);
        registry.once("t", move |v| {
            record(v);
            inner.once("t", |_| {});
        });

        registry.dispatch("t", json!(1));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(registry.contains("t"));
    }
}
