// src/engine/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::exec::TaskHandler;
use crate::types::TaskKind;

/// Maps each task kind to the handler that executes it.
///
/// Populated once at start-up, then shared read-only by every job.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl HandlerRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous registration.
    pub fn register(&mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) {
        trace!(%kind, "registering task handler");
        self.handlers.insert(kind, handler);
    }

    pub fn with(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Unknown kinds resolve to `None`; that is not an error.
    pub fn resolve(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
