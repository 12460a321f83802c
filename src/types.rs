use crate::time::TimeConfig;

pub type Score = i32;

/// Effectively won. Search scores always lie in `[-MAX_SCORE, MAX_SCORE]`.
pub const MAX_SCORE: Score = 30_000;
/// Any score with a larger magnitude is a forced mate.
pub const MATE_THRESHOLD: Score = MAX_SCORE - 2_000;

pub const DEFAULT_DIRECT_ENTRIES: usize = 1 << 22;
pub const DEFAULT_LRU_CAPACITY: usize = 1 << 20;
/// Hard ceiling for the direct-mapped table.
pub const MAX_CACHE_BYTES: usize = 1 << 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKind {
    /// Flat power-of-two table, unconditional replacement.
    DirectMapped { entries: usize },
    /// Bounded least-recently-used map.
    Lru { capacity: usize },
}

impl Default for CacheKind {
    fn default() -> Self {
        CacheKind::DirectMapped {
            entries: DEFAULT_DIRECT_ENTRIES,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub cache: CacheKind,
    pub time: TimeConfig,
    pub seed: Option<u64>,
    pub diagnostics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheKind::default(),
            time: TimeConfig::default(),
            seed: None,
            diagnostics: false,
        }
    }
}

impl EngineConfig {
    pub fn with_cache(cache: CacheKind) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }
}

/// Counters for the last decision. Logged, never read by the search itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub evaluations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub depth: u8,
    pub elapsed_ms: u64,
    pub time_goal_ms: u64,
}

/// Tied-best root moves at a fixed depth.
#[derive(Clone, Debug)]
pub struct RootResult<M> {
    pub moves: Vec<M>,
    pub score: Score,
}

pub fn is_mate_score(score: Score) -> bool {
    score.abs() > MATE_THRESHOLD
}
