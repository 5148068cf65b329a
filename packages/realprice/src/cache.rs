//! Explicit TTL cache keyed by string.
//!
//! Replaces ambient process-wide memoization with an injectable component:
//! consumers hold a cache instance and consult it explicitly.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A string-keyed cache whose entries expire after a fixed time-to-live.
///
/// Expired entries are evicted lazily on lookup; there is no background
/// sweeper.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, (Instant, V)>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// A cache whose entries outlive any realistic process lifetime.
    pub fn unbounded() -> Self {
        Self::new(Duration::from_secs(100 * 365 * 24 * 60 * 60))
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.into(), (Instant::now(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
