use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use crate::cache::EvalCache;
use crate::display::ScoreTable;
use crate::error::EngineError;
use crate::evaluation::evaluate;
use crate::host::{GamePosition, MoveList};
use crate::moveorder::order_moves;
use crate::time::{Clock, TimeManager};
use crate::types::{EngineConfig, RootResult, Score, SearchStats, MAX_SCORE};

/// Everything that lives for one game: the evaluation cache, the controller's depth and the
/// tie-break RNG. Call [`Engine::new_game`] between games.
pub struct Engine {
    cache: EvalCache,
    time: TimeManager,
    stats: SearchStats,
    rng: StdRng,
    diagnostics: bool,
    scores: ScoreTable,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            cache: EvalCache::new(config.cache),
            time: TimeManager::new(config.time),
            stats: SearchStats::default(),
            rng,
            diagnostics: config.diagnostics,
            scores: ScoreTable::new(),
        }
    }

    pub fn new_game(&mut self) {
        self.time.new_game();
        self.cache.clear();
        self.reset_stats();
    }

    pub fn search_depth(&self) -> Option<u8> {
        self.time.search_depth()
    }

    pub fn set_search_depth(&mut self, depth: u8) {
        self.time.set_search_depth(depth);
    }

    pub fn cache(&self) -> &EvalCache {
        &self.cache
    }

    pub fn score_table(&self) -> &ScoreTable {
        &self.scores
    }

    pub fn stats(&self) -> SearchStats {
        let cache = self.cache.stats();
        SearchStats {
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cache_evictions: cache.evictions,
            ..self.stats
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
        self.cache.reset_stats();
    }

    /// Pick a move for the side to move within the clock's budget.
    ///
    /// The budget is advisory: the search always runs to its depth, and an overrun only makes
    /// the next move shallower.
    pub fn decide<P, C>(&mut self, pos: &mut P, clock: &C) -> Result<P::Move, EngineError>
    where
        P: GamePosition,
        C: Clock,
    {
        let in_check = pos.is_in_check();
        let goal = self.time.time_goal(clock);
        let depth = self.time.depth_for(clock);
        self.reset_stats();

        debug!(depth, goal_ms = goal, ply = pos.ply_count(), in_check, "deciding");

        let root = self.find_best_moves(pos, depth)?;
        let chosen = root
            .moves
            .choose(&mut self.rng)
            .cloned()
            .ok_or(EngineError::NoLegalMoves)?;

        let elapsed = clock.elapsed_millis();
        self.stats.depth = depth;
        self.stats.elapsed_ms = elapsed;
        self.stats.time_goal_ms = goal;

        // In check there are few replies, which would skew the controller
        let next_depth = if in_check {
            depth
        } else {
            self.time.adapt(elapsed, goal)
        };

        let stats = self.stats();
        info!(
            mv = %pos.move_name(&chosen),
            score = root.score,
            tied = root.moves.len(),
            depth,
            next_depth,
            elapsed_ms = elapsed,
            goal_ms = goal,
            nodes = stats.nodes,
            evals = stats.evaluations,
            cache_hits = stats.cache_hits,
            cache_misses = stats.cache_misses,
            cache_evictions = stats.cache_evictions,
            "decided"
        );

        Ok(chosen)
    }

    /// Search every root move to `depth` and return the set tied for the best score.
    /// A root move that mates immediately is returned on its own.
    pub fn find_best_moves<P: GamePosition>(
        &mut self,
        pos: &mut P,
        depth: u8,
    ) -> Result<RootResult<P::Move>, EngineError> {
        let depth = depth.max(1);
        let ply = pos.ply_count() as Score;
        let moves = self.ordered_moves(pos, depth);
        if moves.is_empty() {
            return Err(EngineError::NoLegalMoves);
        }

        self.scores.clear();
        let mut best_score = -MAX_SCORE;
        let mut best_moves: Vec<P::Move> = Vec::new();

        for mv in &moves {
            pos.make_move(mv);
            if pos.is_checkmate() {
                pos.undo_move(mv);
                let score = MAX_SCORE - ply - 1;
                debug!(mv = %pos.move_name(mv), score, "mate on the board");
                return Ok(RootResult {
                    moves: vec![mv.clone()],
                    score,
                });
            }
            let score = -self.search(pos, depth - 1, -MAX_SCORE, -best_score);
            pos.undo_move(mv);

            trace!(mv = %pos.move_name(mv), score, "root move");
            if self.diagnostics {
                self.scores.add(pos.move_name(mv), score);
            }

            if score > best_score {
                best_score = score;
                best_moves.clear();
                best_moves.push(mv.clone());
            } else if score == best_score && (score > -MAX_SCORE || best_moves.is_empty()) {
                // -MAX_SCORE here is a refutation bound, not a real tie
                best_moves.push(mv.clone());
            }
        }

        debug_assert!(!best_moves.is_empty(), "legal moves but no best move");
        if self.diagnostics {
            for line in self.scores.lines() {
                debug!("{}", line);
            }
        }

        Ok(RootResult {
            moves: best_moves,
            score: best_score,
        })
    }

    /// Fail-soft negamax with alpha-beta bounds.
    ///
    /// Mated positions score `ply - MAX_SCORE` so quicker mates are more extreme. A child
    /// scoring above `upper` makes this node return the `MAX_SCORE` sentinel, which only
    /// means "at least upper". Bounds outside `[-MAX_SCORE, MAX_SCORE]` are clamped.
    pub fn search<P: GamePosition>(&mut self, pos: &mut P, depth: u8, lower: Score, upper: Score) -> Score {
        self.stats.nodes += 1;
        let lower = lower.clamp(-MAX_SCORE, MAX_SCORE);
        let upper = upper.clamp(-MAX_SCORE, MAX_SCORE);

        if pos.is_checkmate() {
            return pos.ply_count() as Score - MAX_SCORE;
        }
        if pos.is_draw() {
            return 0;
        }
        if depth == 0 {
            return cached_evaluate(&mut self.cache, &mut self.stats, pos);
        }

        let ply = pos.ply_count() as Score;
        let moves = self.ordered_moves(pos, depth);
        let mut best_score = -MAX_SCORE;

        for mv in &moves {
            pos.make_move(mv);
            if pos.is_checkmate() {
                pos.undo_move(mv);
                return MAX_SCORE - ply - 1;
            }
            let score = -self.search(pos, depth - 1, -upper, -best_score.max(lower));
            pos.undo_move(mv);

            if score > upper {
                return MAX_SCORE;
            }
            best_score = best_score.max(score);
        }

        best_score
    }

    fn ordered_moves<P: GamePosition>(&mut self, pos: &mut P, depth: u8) -> MoveList<P::Move> {
        let moves = pos.legal_moves();
        let cache = &mut self.cache;
        let stats = &mut self.stats;
        order_moves(pos, moves, depth, |p| cached_evaluate(cache, stats, p))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn cached_evaluate<P: GamePosition>(cache: &mut EvalCache, stats: &mut SearchStats, pos: &mut P) -> Score {
    let hash = pos.position_hash();
    if let Some(score) = cache.lookup(hash) {
        return score;
    }
    stats.evaluations += 1;
    let score = evaluate(pos);
    cache.insert(hash, score);
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::move_name;
    use crate::host::Game;
    use crate::types::{is_mate_score, CacheKind};

    const SCHOLAR: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
    const FOOLS_MATE: &str = "rnbqkbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    const MATE_IN_ONE: &str = "7k/R7/8/8/8/8/1R6/6K1 w - - 0 1";
    const MATE_IN_TWO: &str = "7k/8/8/8/8/8/1R6/R5K1 w - - 0 1";
    const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
    const BARE_KINGS: &str = "8/8/4k3/8/8/3K4/8/8 w - - 0 1";

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            seed: Some(7),
            ..EngineConfig::with_cache(CacheKind::DirectMapped { entries: 1 << 16 })
        })
    }

    struct FixedClock {
        elapsed: u64,
    }

    impl Clock for FixedClock {
        fn remaining_millis(&self) -> u64 {
            60_000
        }
        fn increment_millis(&self) -> u64 {
            0
        }
        fn starting_millis(&self) -> u64 {
            60_000
        }
        fn elapsed_millis(&self) -> u64 {
            self.elapsed
        }
    }

    #[test]
    fn test_checkmate_score() {
        let mut game = Game::from_fen(FOOLS_MATE).unwrap();
        let mut engine = engine();
        let score = engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
        // mated at ply 4
        assert_eq!(score, 4 - MAX_SCORE);
    }

    #[test]
    fn test_draws_score_zero_at_any_depth() {
        let mut engine = engine();
        for fen in [STALEMATE, BARE_KINGS] {
            let mut game = Game::from_fen(fen).unwrap();
            for depth in 0..4 {
                let score = engine.search(&mut game, depth, -MAX_SCORE, MAX_SCORE);
                assert_eq!(score, 0, "{} at depth {} scored {}", fen, depth, score);
            }
        }
    }

    #[test]
    fn test_search_finds_mate_in_one() {
        let mut game = Game::from_fen(SCHOLAR).unwrap();
        let mut engine = engine();
        let score = engine.search(&mut game, 2, -MAX_SCORE, MAX_SCORE);
        assert_eq!(score, MAX_SCORE - 6 - 1);
        assert!(is_mate_score(score));
    }

    #[test]
    fn test_faster_mate_scores_higher() {
        let mut engine = engine();
        let mut one = Game::from_fen(MATE_IN_ONE).unwrap();
        let mut two = Game::from_fen(MATE_IN_TWO).unwrap();

        let mate_one = engine.search(&mut one, 3, -MAX_SCORE, MAX_SCORE);
        let mate_two = engine.search(&mut two, 3, -MAX_SCORE, MAX_SCORE);

        assert_eq!(mate_one, MAX_SCORE - 1);
        assert_eq!(mate_two, MAX_SCORE - 3);
        assert!(mate_one > mate_two);
    }

    #[test]
    fn test_mate_stays_a_mate_late_in_the_game() {
        let mut engine = engine();
        for fullmoves in [1, 1200, 16_000] {
            let fen = format!("7k/R7/8/8/8/8/1R6/6K1 w - - 0 {}", fullmoves);
            let mut game = Game::from_fen(&fen).unwrap();
            let score = engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
            assert!(is_mate_score(score) && score > 0, "fullmove {} scored {}", fullmoves, score);
            let root = engine.find_best_moves(&mut game, 3).unwrap();
            assert_eq!(move_name(&root.moves[0]), "b2b8");
        }
    }

    #[test]
    fn test_search_clamps_caller_bounds() {
        let mut engine = engine();
        let mut game = Game::from_fen(SCHOLAR).unwrap();
        let full = engine.search(&mut game, 2, -MAX_SCORE, MAX_SCORE);
        let wide = engine.search(&mut game, 2, Score::MIN, Score::MAX);
        assert_eq!(wide, full);

        let mut game = Game::startpos();
        let full = engine.search(&mut game, 2, -MAX_SCORE, MAX_SCORE);
        assert_eq!(engine.search(&mut game, 2, Score::MIN, Score::MAX), full);
    }

    #[test]
    fn test_search_is_repeatable() {
        let mut game = Game::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
            .unwrap();
        let mut engine = engine();
        let first = engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
        let second = engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
        assert_eq!(first, second);

        let mut fresh = Engine::new(EngineConfig::with_cache(CacheKind::Lru { capacity: 1 << 12 }));
        assert_eq!(fresh.search(&mut game, 3, -MAX_SCORE, MAX_SCORE), first, "cache design must not change the score");
    }

    #[test]
    fn test_search_restores_position() {
        let mut game = Game::from_fen(SCHOLAR).unwrap();
        let hash = game.position_hash();
        let ply = game.ply_count();
        let mut engine = engine();
        engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
        engine.find_best_moves(&mut game, 3).unwrap();
        assert_eq!(game.position_hash(), hash);
        assert_eq!(game.ply_count(), ply);
    }

    #[test]
    fn test_depth_zero_is_static_eval() {
        let mut game = Game::startpos();
        let mut engine = engine();
        assert_eq!(engine.search(&mut game, 0, -MAX_SCORE, MAX_SCORE), evaluate(&mut game));
    }

    #[test]
    fn test_evaluations_match_cache_misses() {
        let mut game = Game::startpos();
        let mut engine = Engine::new(EngineConfig::with_cache(CacheKind::Lru { capacity: 1 << 16 }));
        engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
        let stats = engine.stats();
        assert!(stats.evaluations > 0);
        assert_eq!(stats.evaluations, stats.cache_misses);
        assert!(stats.nodes > 0);

        // everything the second pass needs is already cached
        engine.reset_stats();
        engine.search(&mut game, 3, -MAX_SCORE, MAX_SCORE);
        assert_eq!(engine.stats().evaluations, 0);
        assert!(engine.stats().cache_hits > 0);
    }

    #[test]
    fn test_find_best_moves_returns_mate() {
        let mut game = Game::from_fen(SCHOLAR).unwrap();
        let mut engine = engine();
        let root = engine.find_best_moves(&mut game, 4).unwrap();
        let names: Vec<String> = root.moves.iter().map(move_name).collect();
        assert_eq!(names, vec!["h5f7"]);
        assert_eq!(root.score, MAX_SCORE - 6 - 1);
    }

    #[test]
    fn test_find_best_moves_no_legal_moves() {
        let mut game = Game::from_fen(FOOLS_MATE).unwrap();
        let mut engine = engine();
        assert_eq!(engine.find_best_moves(&mut game, 2).unwrap_err(), EngineError::NoLegalMoves);
    }

    #[test]
    fn test_decide_plays_mate() {
        let mut game = Game::from_fen(SCHOLAR).unwrap();
        let mut engine = engine();
        let mv = engine.decide(&mut game, &FixedClock { elapsed: 0 }).unwrap();
        assert_eq!(move_name(&mv), "h5f7");
    }

    #[test]
    fn test_decide_adapts_depth() {
        let mut game = Game::startpos();
        let mut engine = engine();
        engine.set_search_depth(3);
        engine.decide(&mut game, &FixedClock { elapsed: 1_000_000 }).unwrap();
        assert_eq!(engine.search_depth(), Some(2), "overran the goal, should get shallower");

        engine.decide(&mut game, &FixedClock { elapsed: 0 }).unwrap();
        assert_eq!(engine.search_depth(), Some(3), "well under the goal, should get deeper");
    }

    #[test]
    fn test_decide_in_check_keeps_depth() {
        // 1.e4 f6 2.Qh5+: g6 is forced
        let mut game = Game::from_fen("rnbqkbnr/ppppp1pp/5p2/7Q/4P3/8/PPPP1PPP/RNB1KBNR b KQkq - 1 2")
            .unwrap();
        let mut engine = engine();
        engine.set_search_depth(3);
        let mv = engine.decide(&mut game, &FixedClock { elapsed: 1_000_000 }).unwrap();
        assert_eq!(move_name(&mv), "g7g6");
        assert_eq!(engine.search_depth(), Some(3));
    }

    #[test]
    fn test_decide_initialises_depth_from_clock() {
        let mut game = Game::startpos();
        let mut engine = engine();
        assert_eq!(engine.search_depth(), None);
        engine.decide(&mut game, &FixedClock { elapsed: 700 }).unwrap();
        // 0.4 * ln(60000) rounds to 4, and 700ms sits between goal/6 and the 1500ms goal
        assert_eq!(engine.stats().depth, 4);
        assert_eq!(engine.search_depth(), Some(4));

        engine.new_game();
        assert_eq!(engine.search_depth(), None);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_diagnostics_score_table() {
        let mut game = Game::startpos();
        let mut quiet = engine();
        quiet.find_best_moves(&mut game, 2).unwrap();
        assert!(quiet.score_table().is_empty());

        let mut verbose = Engine::new(EngineConfig {
            diagnostics: true,
            ..EngineConfig::with_cache(CacheKind::Lru { capacity: 1 << 12 })
        });
        verbose.find_best_moves(&mut game, 2).unwrap();
        assert!(!verbose.score_table().is_empty());
    }
}

// Negamax: one scoring function serves both sides. Each level negates its child's score and
// passes the bounds negated and swapped, so `lower`/`upper` are always from the side to move.

// Fail-soft cutoff: when a reply beats `upper` the node stops and returns MAX_SCORE rather than
// the reply's score. The parent negates that to -MAX_SCORE, which is below anything it already
// has, so the branch drops out. At the root a -MAX_SCORE is never counted as a tie.

// Mate scores use the host's ply count. A mate found on the board at ply p scores
// MAX_SCORE - p - 1 for the mating side and p + 1 - MAX_SCORE for the mated side one ply down,
// so shorter mates are always more extreme.

// Deadlines are not enforced inside the recursion. The controller in time.rs shrinks the depth
// for the next move after an overrun instead.
