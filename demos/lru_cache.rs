//! Capacity-bounded LRU string cache.
//!
//! Standalone demo, unrelated to the catalog service.
//!
//! ```text
//! cargo run --example lru_cache
//! ```

use std::collections::{BTreeMap, HashMap};

/// Recency is a monotonically increasing tick; the smallest tick is the least
/// recently used entry.
pub struct LruCache {
    capacity: usize,
    entries: HashMap<String, (String, u64)>,
    order: BTreeMap<u64, String>,
    tick: u64,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: BTreeMap::new(),
            tick: 0,
        }
    }

    fn touch(&mut self, key: &str) -> Option<u64> {
        let (_, last) = self.entries.get_mut(key)?;
        self.tick += 1;
        let tick = self.tick;
        let previous = std::mem::replace(last, tick);
        self.order.remove(&previous);
        self.order.insert(tick, key.to_string());
        Some(tick)
    }

    /// Marks `key` as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        self.touch(key)?;
        self.entries.get(key).map(|(value, _)| value.as_str())
    }

    /// Inserts or replaces `key`, evicting the least recently used entry when
    /// the cache grows past capacity.
    pub fn add(&mut self, key: &str, value: &str) {
        if self.touch(key).is_some() {
            if let Some((stored, _)) = self.entries.get_mut(key) {
                *stored = value.to_string();
            }
            return;
        }

        self.tick += 1;
        self.entries
            .insert(key.to_string(), (value.to_string(), self.tick));
        self.order.insert(self.tick, key.to_string());

        if self.entries.len() > self.capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn main() {
    let mut cache = LruCache::new(3);

    cache.add("song1", "Song One");
    cache.add("song2", "Song Two");
    cache.add("song3", "Song Three");

    match cache.get("song2") {
        Some(song) => println!("Retrieved song from cache: {song}"),
        None => println!("Song not found in cache."),
    }

    // song1 is now the least recently used entry
    cache.add("song4", "Song Four");

    match cache.get("song1") {
        Some(_) => println!("Song 1 found in cache."),
        None => println!("Song 1 not found in cache (as expected)."),
    }
    println!("{} songs cached", cache.len());
}
