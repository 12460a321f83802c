use std::time::Instant;

/// Clock readings for the side to move, in milliseconds.
pub trait Clock {
    fn remaining_millis(&self) -> u64;
    fn increment_millis(&self) -> u64;
    /// What the clock showed when the game started.
    fn starting_millis(&self) -> u64;
    /// Time spent on the current decision so far.
    fn elapsed_millis(&self) -> u64;
}

/// Wall-clock timer, started when the host asks for a move.
#[derive(Clone, Copy, Debug)]
pub struct MoveTimer {
    pub remaining_ms: u64,
    pub increment_ms: u64,
    pub starting_ms: u64,
    started: Instant,
}

impl MoveTimer {
    pub fn start(remaining_ms: u64, increment_ms: u64, starting_ms: u64) -> Self {
        Self {
            remaining_ms,
            increment_ms,
            starting_ms,
            started: Instant::now(),
        }
    }
}

impl Clock for MoveTimer {
    fn remaining_millis(&self) -> u64 {
        self.remaining_ms
    }

    fn increment_millis(&self) -> u64 {
        self.increment_ms
    }

    fn starting_millis(&self) -> u64 {
        self.starting_ms
    }

    fn elapsed_millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeConfig {
    /// Spend at most `remaining / consumption_divisor` per move.
    pub consumption_divisor: u64,
    /// Also cap at an even split of the starting time over this many moves.
    pub expected_moves: u64,
    /// Initial depth is `depth_scale * ln(starting_ms)`.
    pub depth_scale: f64,
    pub min_depth: u8,
    pub max_depth: u8,
    /// Deepen when a move took less than `goal / sensitivity`.
    pub sensitivity: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            consumption_divisor: 30,
            expected_moves: 40,
            depth_scale: 0.4,
            min_depth: 2,
            max_depth: 30,
            sensitivity: 6,
        }
    }
}

/// Owns the per-game search depth: set on the first move from the starting clock, then nudged
/// by one after every move depending on how the time goal was spent.
#[derive(Clone, Debug)]
pub struct TimeManager {
    config: TimeConfig,
    search_depth: Option<u8>,
}

impl TimeManager {
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            search_depth: None,
        }
    }

    pub fn config(&self) -> &TimeConfig {
        &self.config
    }

    /// Forget the depth so the next move re-derives it from the clock.
    pub fn new_game(&mut self) {
        self.search_depth = None;
    }

    pub fn search_depth(&self) -> Option<u8> {
        self.search_depth
    }

    pub fn set_search_depth(&mut self, depth: u8) {
        self.search_depth = Some(depth.clamp(self.config.min_depth, self.config.max_depth));
    }

    /// Advisory budget for this move. Never more than half the remaining time, never zero.
    pub fn time_goal<C: Clock>(&self, clock: &C) -> u64 {
        let remaining = clock.remaining_millis();
        let by_fraction = remaining / self.config.consumption_divisor.max(1);
        let by_split = clock.starting_millis() / self.config.expected_moves.max(1);
        let goal = by_fraction.min(by_split) + clock.increment_millis();
        goal.min(remaining / 2).max(1)
    }

    /// Depth for this move, initialising it on the first move of the game.
    pub fn depth_for<C: Clock>(&mut self, clock: &C) -> u8 {
        match self.search_depth {
            Some(depth) => depth,
            None => {
                let depth = self.initial_depth(clock.starting_millis());
                self.search_depth = Some(depth);
                depth
            }
        }
    }

    pub fn initial_depth(&self, starting_ms: u64) -> u8 {
        let raw = self.config.depth_scale * (starting_ms.max(1) as f64).ln();
        let depth = raw.round().clamp(0.0, u8::MAX as f64) as u8;
        depth.clamp(self.config.min_depth, self.config.max_depth)
    }

    /// Feed back how long the last move took. Returns the depth for the next move.
    pub fn adapt(&mut self, elapsed_ms: u64, goal_ms: u64) -> u8 {
        let Some(depth) = self.search_depth else {
            return self.config.min_depth;
        };

        let next = if elapsed_ms > goal_ms && depth > self.config.min_depth {
            depth - 1
        } else if elapsed_ms < goal_ms / self.config.sensitivity.max(1) && depth < self.config.max_depth {
            depth + 1
        } else {
            depth
        };

        self.search_depth = Some(next);
        next
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new(TimeConfig::default())
    }
}
