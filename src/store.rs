use std::sync::Arc;

use parking_lot::RwLock;

use crate::encoding::{Dataset, Record};

/// In-memory promotion store
///
/// Holds the current dataset behind a reader-writer lock. Lookups share the
/// lock; replacing the dataset takes it exclusively for a single pointer
/// swap, so readers observe either the old or the new dataset as a whole.
pub struct Store {
    current: RwLock<Arc<Dataset>>,
}

impl Store {
    /// Create a store serving an empty dataset
    pub fn new() -> Self {
        Self::with_dataset(Dataset::new())
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            current: RwLock::new(Arc::new(dataset)),
        }
    }

    /// Install `dataset` as the current dataset, discarding the previous one
    pub fn replace(&self, dataset: Dataset) {
        let next = Arc::new(dataset);
        let previous = {
            let mut current = self.current.write();
            std::mem::replace(&mut *current, next)
        };
        // freed outside the lock, unless a snapshot still holds it
        drop(previous);
    }

    /// Get the record for `id` from the current dataset
    pub fn get(&self, id: &str) -> Option<Record> {
        self.current.read().get(id).cloned()
    }

    /// Handle on the current dataset, unaffected by later replacements
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&*self.current.read())
    }

    /// Number of records in the current dataset
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
