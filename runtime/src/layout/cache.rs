//! Concurrent memo of layout results keyed by content fingerprint.
//!
//! Entries keep the bytes their key was hashed from, so a fingerprint
//! collision recomputes instead of returning another scan's layout. The
//! oldest entry is evicted once `cache_capacity` is reached.

use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use fnv::FnvHasher;
use tracing::debug;

use super::{LayoutEngine, LayoutResult};
use crate::types::ScanResult;

struct Entry {
    key_bytes: Vec<u8>,
    inserted: u64,
    result: Arc<LayoutResult>,
}

/// Layout results keyed by a fingerprint of the scan and the engine config.
#[derive(Default)]
pub struct LayoutCache {
    entries: DashMap<u64, Entry>,
    clock: AtomicU64,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized scan and config, separated by a byte JSON never emits.
    fn key_bytes(scan: &ScanResult, engine: &LayoutEngine) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(scan).unwrap_or_default();
        bytes.push(0xff);
        bytes.extend(serde_json::to_vec(engine.config()).unwrap_or_default());
        bytes
    }

    fn hash(bytes: &[u8]) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(bytes);
        hasher.finish()
    }

    /// Stable FNV fingerprint of the serialized scan and config.
    pub fn fingerprint(scan: &ScanResult, engine: &LayoutEngine) -> u64 {
        Self::hash(&Self::key_bytes(scan, engine))
    }

    pub fn get_or_compute(&self, scan: &ScanResult, engine: &LayoutEngine) -> Arc<LayoutResult> {
        let capacity = engine.config().cache_capacity;
        if capacity == 0 {
            return Arc::new(engine.layout(scan));
        }

        let key_bytes = Self::key_bytes(scan, engine);
        let key = Self::hash(&key_bytes);
        if let Some(hit) = self.entries.get(&key) {
            if hit.key_bytes == key_bytes {
                return Arc::clone(&hit.result);
            }
            debug!(key, "layout cache fingerprint collision");
        }

        let result = Arc::new(engine.layout(scan));
        if !self.entries.contains_key(&key) {
            self.evict_to(capacity - 1);
        }
        let inserted = self.clock.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            key,
            Entry {
                key_bytes,
                inserted,
                result: Arc::clone(&result),
            },
        );
        result
    }

    /// Drop the oldest entries until at most `keep` remain.
    fn evict_to(&self, keep: usize) {
        while self.entries.len() > keep {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|e| e.value().inserted)
                .map(|e| *e.key());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
