//! Per-invocation memo of resolved placeholders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Resolved values keyed by the raw placeholder text. Clones share the same entries.
///
/// A cache must not outlive the invocation it was created for.
#[derive(Clone, Default)]
pub struct ReferenceCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, raw: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(raw)
            .cloned()
    }

    pub fn insert(&self, raw: String, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(raw, value);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Values are secrets; only ever print the size.
impl std::fmt::Debug for ReferenceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ReferenceCache")
            .field("entries", &self.len())
            .finish()
    }
}
