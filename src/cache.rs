use std::collections::HashMap;

use crate::types::{CacheKind, Score, MAX_CACHE_BYTES};

/// Static (depth 0) evaluations keyed by position hash. Never holds search results.
pub enum EvalCache {
    DirectMapped(DirectMappedCache),
    Lru(LruCache),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl EvalCache {
    pub fn new(kind: CacheKind) -> Self {
        match kind {
            CacheKind::DirectMapped { entries } => EvalCache::DirectMapped(DirectMappedCache::new(entries)),
            CacheKind::Lru { capacity } => EvalCache::Lru(LruCache::new(capacity)),
        }
    }

    pub fn lookup(&mut self, hash: u64) -> Option<Score> {
        match self {
            EvalCache::DirectMapped(cache) => cache.lookup(hash),
            EvalCache::Lru(cache) => cache.lookup(hash),
        }
    }

    pub fn insert(&mut self, hash: u64, score: Score) {
        match self {
            EvalCache::DirectMapped(cache) => cache.insert(hash, score),
            EvalCache::Lru(cache) => cache.insert(hash, score),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EvalCache::DirectMapped(cache) => cache.len(),
            EvalCache::Lru(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match self {
            EvalCache::DirectMapped(cache) => cache.capacity(),
            EvalCache::Lru(cache) => cache.capacity(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        match self {
            EvalCache::DirectMapped(cache) => cache.stats,
            EvalCache::Lru(cache) => cache.stats,
        }
    }

    pub fn reset_stats(&mut self) {
        match self {
            EvalCache::DirectMapped(cache) => cache.stats = CacheStats::default(),
            EvalCache::Lru(cache) => cache.stats = CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            EvalCache::DirectMapped(cache) => cache.clear(),
            EvalCache::Lru(cache) => cache.clear(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: u64, // full hash, compared on lookup
    pub score: Score,
    pub occupied: bool,
}

/// Smallest table `DirectMappedCache` will build (16 KiB).
pub const MIN_DIRECT_ENTRIES: usize = 1024;

/// Flat power-of-two table indexed by `hash & mask`. Inserts always overwrite the slot.
pub struct DirectMappedCache {
    entries: Vec<CacheEntry>,
    mask: usize,
    occupied: usize,
    stats: CacheStats,
}

impl DirectMappedCache {
    /// Rounds `entries` down to a power of two and clamps the table to `MAX_CACHE_BYTES`.
    pub fn new(entries: usize) -> Self {
        let max_entries = MAX_CACHE_BYTES / std::mem::size_of::<CacheEntry>();
        let entries = entries.clamp(MIN_DIRECT_ENTRIES, max_entries);
        let size = if entries.is_power_of_two() {
            entries
        } else {
            entries.next_power_of_two() / 2
        };

        Self {
            entries: vec![CacheEntry::default(); size],
            mask: size - 1,
            occupied: 0,
            stats: CacheStats::default(),
        }
    }

    /// Create a table of at most `mb` megabytes, but never below `MIN_DIRECT_ENTRIES`.
    pub fn from_megabytes(mb: usize) -> Self {
        Self::new((mb * 1024 * 1024) / std::mem::size_of::<CacheEntry>())
    }

    pub fn lookup(&mut self, hash: u64) -> Option<Score> {
        let entry = &self.entries[hash as usize & self.mask];
        if entry.occupied && entry.key == hash {
            self.stats.hits += 1;
            Some(entry.score)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    pub fn insert(&mut self, hash: u64, score: Score) {
        let slot = &mut self.entries[hash as usize & self.mask];
        if !slot.occupied {
            self.occupied += 1;
        } else if slot.key != hash {
            self.stats.evictions += 1;
        }
        *slot = CacheEntry {
            key: hash,
            score,
            occupied: true,
        };
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn memory_bytes(&self) -> usize {
        self.entries.len() * std::mem::size_of::<CacheEntry>()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.fill(CacheEntry::default());
        self.occupied = 0;
    }
}

const NIL: u32 = u32::MAX;

#[derive(Clone, Copy, Debug)]
struct LruNode {
    key: u64,
    score: Score,
    prev: u32,
    next: u32,
}

/// Bounded LRU over a dense node array linked by indices. `head` is most recently used,
/// `tail` least. Evicted slots go on a free list and are reused by the next insert.
pub struct LruCache {
    map: HashMap<u64, u32>,
    nodes: Vec<LruNode>,
    free: Vec<u32>,
    head: u32,
    tail: u32,
    capacity: usize,
    stats: CacheStats,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, NIL as usize);
        Self {
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
            stats: CacheStats::default(),
        }
    }

    /// A hit promotes the entry to most recently used.
    pub fn lookup(&mut self, hash: u64) -> Option<Score> {
        match self.map.get(&hash).copied() {
            Some(idx) => {
                self.stats.hits += 1;
                self.promote(idx);
                Some(self.nodes[idx as usize].score)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, hash: u64, score: Score) {
        if let Some(&idx) = self.map.get(&hash) {
            self.nodes[idx as usize].score = score;
            self.promote(idx);
            return;
        }

        if self.map.len() >= self.capacity {
            self.evict();
        }

        let node = LruNode {
            key: hash,
            score,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        };
        self.push_front(idx);
        self.map.insert(hash, idx);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Hashes from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<u64> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut idx = self.head;
        while idx != NIL {
            let node = &self.nodes[idx as usize];
            keys.push(node.key);
            idx = node.next;
        }
        keys
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn evict(&mut self) {
        let idx = self.tail;
        if idx == NIL {
            return;
        }
        self.unlink(idx);
        let key = self.nodes[idx as usize].key;
        self.map.remove(&key);
        self.free.push(idx);
        self.stats.evictions += 1;
    }

    fn promote(&mut self, idx: u32) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: u32) {
        let LruNode { prev, next, .. } = self.nodes[idx as usize];
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev as usize].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next as usize].prev = prev;
        }
        let node = &mut self.nodes[idx as usize];
        node.prev = NIL;
        node.next = NIL;
    }

    fn push_front(&mut self, idx: u32) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[idx as usize];
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            self.nodes[old_head as usize].prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }
}
