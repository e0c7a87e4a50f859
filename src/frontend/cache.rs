use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

/// The payload the cache stores per stock name (spec §3, §6).
#[derive(Debug, Clone, PartialEq)]
pub struct CachedStock {
    pub name: String,
    pub price: f64,
    pub quantity: u64,
}

struct Inner {
    entries: HashMap<String, CachedStock>,
    /// Recency order, most-recently-used at the back. Small (`capacity`
    /// is a handful of entries by default), so a linear scan to relocate
    /// an entry on promotion is simpler and fast enough than an intrusive
    /// list.
    recency: VecDeque<String>,
    capacity: usize,
}

impl Inner {
    fn touch(&mut self, name: &str) {
        if let Some(pos) = self.recency.iter().position(|n| n == name) {
            self.recency.remove(pos);
        }
        self.recency.push_back(name.to_string());
    }
}

/// Bounded LRU cache for stock lookups (spec §4.3). `get` counts as a
/// writer because it mutates recency — the whole cache is behind one
/// multi-reader/single-writer lock, used here in its exclusive mode for
/// every operation to keep `get`+promote atomic (invariant L1).
pub struct LruStockCache {
    inner: RwLock<Inner>,
}

impl LruStockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::with_capacity(capacity),
                recency: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    /// Promote-on-read if present (invariant L3 depends on `put` and
    /// `get` sharing one recency structure).
    pub async fn get(&self, name: &str) -> Option<CachedStock> {
        let mut guard = self.inner.write().await;
        if let Some(entry) = guard.entries.get(name).cloned() {
            guard.touch(name);
            Some(entry)
        } else {
            None
        }
    }

    pub async fn put(&self, stock: CachedStock) {
        let mut guard = self.inner.write().await;
        let name = stock.name.clone();
        let is_new = !guard.entries.contains_key(&name);
        guard.entries.insert(name.clone(), stock);
        guard.touch(&name);

        if is_new && guard.entries.len() > guard.capacity {
            if let Some(lru_name) = guard.recency.pop_front() {
                guard.entries.remove(&lru_name);
            }
        }
    }

    /// Invariant L1: once this returns, no `get` observes the removed
    /// entry until a subsequent `put` happens.
    pub async fn invalidate(&self, name: &str) {
        let mut guard = self.inner.write().await;
        guard.entries.remove(name);
        if let Some(pos) = guard.recency.iter().position(|n| n == name) {
            guard.recency.remove(pos);
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}
