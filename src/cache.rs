use std::{
    collections::HashMap,
    future::Future,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Result;
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<Path>>>;

/// Executables resolved during the process's lifetime, by tool name
#[derive(Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached path, or run `resolve` to fill it.
    /// Concurrent callers for the same tool wait for a single resolution; failures are not cached.
    pub async fn get_or_try_resolve<F, Fut>(&self, name: &str, resolve: F) -> Result<Arc<Path>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<Path>>>,
    {
        let slot = self.slot(name);

        slot.get_or_try_init(resolve).await.cloned()
    }

    pub fn cached(&self, name: &str) -> Option<Arc<Path>> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|slot| slot.get().cloned())
    }

    fn slot(&self, name: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        Arc::clone(slots.entry(name.to_owned()).or_default())
    }
}
