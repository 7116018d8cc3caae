use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Memoized key -> shard index mapping built by discovery rounds.
///
/// Entries are created once and never updated or removed: key ownership is
/// assumed permanent for the lifetime of the store.
#[derive(Debug, Default)]
pub struct KeyRouter {
    routes: DashMap<String, usize>,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: DashMap::with_capacity(capacity),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.routes.get(key).map(|shard| *shard.value())
    }

    /// Records the owner of `key`. The first record wins; returns `false` if
    /// the key was already mapped, leaving the existing entry untouched.
    pub fn record(&self, key: &str, shard: usize) -> bool {
        match self.routes.entry(key.to_string()) {
            Entry::Occupied(existing) => {
                tracing::warn!(
                    "Key '{}' already routed to shard {}, ignoring shard {}",
                    key,
                    existing.get(),
                    shard
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(shard);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
