use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::QueryRecord;

pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded, insertion-ordered log of captured queries. Oldest entries are
/// dropped first once `capacity` is exceeded.
pub struct QueryLog {
    inner: Mutex<VecDeque<QueryRecord>>,
    capacity: usize,
}

impl QueryLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueryRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends unless a record equal in every field is already present.
    /// The duplicate check and the append happen under one lock.
    pub fn insert(&self, record: QueryRecord) -> bool {
        let mut inner = self.lock();
        if inner.contains(&record) {
            return false;
        }
        inner.push_back(record);
        while inner.len() > self.capacity {
            inner.pop_front();
        }
        true
    }

    pub fn records(&self) -> Vec<QueryRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
