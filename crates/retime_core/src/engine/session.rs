//! Shared, serialized access to one engine instance.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::MediaEngine;

/// Exclusive access to the engine for the lifetime of the guard.
pub type EngineGuard<'a> = MutexGuard<'a, Box<dyn MediaEngine>>;

/// Handle to a single engine instance.
///
/// Clones share the same engine. Only one caller can hold the engine at a
/// time; runs use [`try_acquire`](Self::try_acquire) so that a second run
/// is turned away instead of waiting behind the first.
#[derive(Clone)]
pub struct EngineSession {
    engine: Arc<Mutex<Box<dyn MediaEngine>>>,
    name: Arc<str>,
}

impl EngineSession {
    /// Wrap an engine in a new session.
    pub fn new<E: MediaEngine + 'static>(engine: E) -> Self {
        let name: Arc<str> = Arc::from(engine.name());
        Self {
            engine: Arc::new(Mutex::new(Box::new(engine))),
            name,
        }
    }

    /// Name of the wrapped engine.
    pub fn engine_name(&self) -> &str {
        &self.name
    }

    /// Take the engine if nobody else holds it.
    pub fn try_acquire(&self) -> Option<EngineGuard<'_>> {
        self.engine.try_lock()
    }

    /// Take the engine, blocking until it is free.
    pub fn acquire(&self) -> EngineGuard<'_> {
        self.engine.lock()
    }

    /// Whether a caller currently holds the engine.
    pub fn is_busy(&self) -> bool {
        self.engine.is_locked()
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("engine", &self.name)
            .field("busy", &self.is_busy())
            .finish()
    }
}
