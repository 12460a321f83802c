use crate::host::{GamePosition, MoveList};
use crate::types::Score;

pub struct ScoredMove<M> {
    pub mv: M,
    pub score: Score,
}

/// Below this depth moves are searched in host order.
pub const MIN_ORDERING_DEPTH: u8 = 2;

/// One-ply lookahead ordering. Each move is played and the resulting position scored with
/// `static_eval` (from the opponent's side), then moves are sorted ascending so replies that
/// are worst for the opponent come first. Ties keep host order.
pub fn order_moves<P, F>(pos: &mut P, moves: MoveList<P::Move>, depth: u8, mut static_eval: F) -> MoveList<P::Move>
where
    P: GamePosition,
    F: FnMut(&mut P) -> Score,
{
    if depth < MIN_ORDERING_DEPTH {
        return moves;
    }

    let mut scored: Vec<ScoredMove<P::Move>> = Vec::with_capacity(moves.len());
    for mv in moves {
        pos.make_move(&mv);
        let score = static_eval(pos);
        pos.undo_move(&mv);
        scored.push(ScoredMove { mv, score });
    }

    scored.sort_by_key(|s| s.score);
    scored.into_iter().map(|s| s.mv).collect()
}
