use crate::host::GamePosition;
use crate::types::Score;

/// Mobility differential from the side to move's perspective: our legal move count minus the
/// count the opponent would have if it were their turn.
///
/// The opponent's count comes from a null move. When that is refused (we are in check) the
/// first legal move is played instead and the replies to it are counted.
pub fn evaluate<P: GamePosition>(pos: &mut P) -> Score {
    let ours = pos.legal_move_count() as Score;
    ours - opponent_mobility(pos)
}

fn opponent_mobility<P: GamePosition>(pos: &mut P) -> Score {
    if pos.try_skip_turn() {
        let count = pos.legal_move_count();
        pos.undo_skip_turn();
        return count as Score;
    }

    let moves = pos.legal_moves();
    match moves.first() {
        Some(probe) => {
            pos.make_move(probe);
            let count = pos.legal_move_count();
            pos.undo_move(probe);
            count as Score
        }
        None => 0,
    }
}
