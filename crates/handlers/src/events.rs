//! Cache invalidation events
//!
//! The surrounding application publishes cache-clear and module lifecycle
//! events on a [`CacheEventBus`]; listeners such as the search handler
//! manager decide which events invalidate their state.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Kind of pluggable module whose lifecycle is reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Searcher implementation for a custom field type
    CustomFieldSearcher,
    /// Custom field type
    CustomFieldType,
    /// JQL function
    JqlFunction,
    /// Anything else, by module key
    Other(String),
}

/// Event delivered to cache listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Every cache must be dropped
    ClearCache,
    /// A module was enabled
    ModuleEnabled(ModuleKind),
    /// A module was disabled
    ModuleDisabled(ModuleKind),
}

/// Receives cache events. Called synchronously on the publishing thread.
pub trait CacheEventListener: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &CacheEvent);
}

/// Synchronous fan-out of cache events to registered listeners.
#[derive(Default)]
pub struct CacheEventBus {
    listeners: RwLock<Vec<Arc<dyn CacheEventListener>>>,
}

impl CacheEventBus {
    /// Bus without listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it receives every event published afterwards
    pub fn subscribe(&self, listener: Arc<dyn CacheEventListener>) {
        self.listeners.write().push(listener);
    }

    /// Deliver `event` to every listener in subscription order
    pub fn publish(&self, event: &CacheEvent) {
        // clone the list so listeners may subscribe while being notified
        let listeners = self.listeners.read().clone();
        tracing::debug!(
            target: "fieldex::handlers",
            ?event,
            listeners = listeners.len(),
            "Publishing cache event"
        );
        for listener in listeners {
            listener.on_event(event);
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl fmt::Debug for CacheEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
