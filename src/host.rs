use std::fmt;

use arrayvec::ArrayVec;
use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

use crate::display::move_name;
use crate::error::EngineError;

pub type MoveList<M> = ArrayVec<M, 256>;

/// Ceiling on the ply a `Game` starts counting from. Mate scores are offset by ply, so the
/// base has to stay well inside `MAX_SCORE - MATE_THRESHOLD`.
pub const MAX_ROOT_PLY: u32 = 1_000;

/// What the search needs from the game it plays.
///
/// Positions are mutated in place: every `make_move` must be paired with exactly one
/// `undo_move`, and every successful `try_skip_turn` with one `undo_skip_turn`, in stack order.
pub trait GamePosition {
    type Move: Clone + PartialEq + fmt::Debug;

    /// Legal moves for the side to move, in host order.
    fn legal_moves(&self) -> MoveList<Self::Move>;

    fn legal_move_count(&self) -> usize {
        self.legal_moves().len()
    }

    fn make_move(&mut self, mv: &Self::Move);
    fn undo_move(&mut self, mv: &Self::Move);

    fn is_checkmate(&self) -> bool;
    fn is_draw(&self) -> bool;
    fn is_in_check(&self) -> bool;

    /// Null move. Returns false (and leaves the position untouched) when the side to move is in check.
    fn try_skip_turn(&mut self) -> bool;
    fn undo_skip_turn(&mut self);

    /// Stable for identical positions. Only used as a cache key.
    fn position_hash(&self) -> u64;

    /// Half-moves since the start of the game. Only differences between plies matter.
    fn ply_count(&self) -> u32;

    fn move_name(&self, mv: &Self::Move) -> String {
        format!("{mv:?}")
    }
}

/// A chess game backed by shakmaty, with make/undo layered on top of its copy-make positions.
#[derive(Clone, Debug)]
pub struct Game {
    pos: Chess,
    undo: Vec<Chess>,
    // One hash per position in the line, current position last.
    hashes: Vec<u64>,
    root_ply: u32,
}

impl Game {
    pub fn startpos() -> Self {
        Self::from_position(Chess::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let invalid = |reason: String| EngineError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed = fen.trim().parse::<Fen>().map_err(|e| invalid(e.to_string()))?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self::from_position(pos))
    }

    pub fn from_position(pos: Chess) -> Self {
        let root_ply = game_ply(&pos);
        let hash = zobrist(&pos);
        Self {
            pos,
            undo: Vec::new(),
            hashes: vec![hash],
            root_ply,
        }
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    /// Find a legal move by its UCI name (`e2e4`, `e7e8q`, `e1g1`).
    pub fn find_move(&self, uci: &str) -> Option<Move> {
        self.pos.legal_moves().into_iter().find(|m| move_name(m) == uci)
    }

    /// Advance the real game by one move.
    pub fn play(&mut self, uci: &str) -> Result<Move, EngineError> {
        let mv = self
            .find_move(uci)
            .ok_or_else(|| EngineError::IllegalMove(uci.to_string()))?;
        self.make_move(&mv);
        Ok(mv)
    }

    fn push(&mut self, next: Chess) {
        let prev = std::mem::replace(&mut self.pos, next);
        self.undo.push(prev);
        self.hashes.push(zobrist(&self.pos));
    }

    fn pop(&mut self) {
        debug_assert!(!self.undo.is_empty(), "undo without a matching make");
        if let Some(prev) = self.undo.pop() {
            self.pos = prev;
            self.hashes.pop();
        }
    }

    fn is_repetition(&self) -> bool {
        let Some((&current, earlier)) = self.hashes.split_last() else {
            return false;
        };
        let window = self.pos.halfmoves() as usize;
        earlier.iter().rev().take(window).any(|&h| h == current)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::startpos()
    }
}

impl GamePosition for Game {
    type Move = Move;

    fn legal_moves(&self) -> MoveList<Move> {
        self.pos.legal_moves().into_iter().collect()
    }

    fn legal_move_count(&self) -> usize {
        self.pos.legal_moves().len()
    }

    fn make_move(&mut self, mv: &Move) {
        let mut next = self.pos.clone();
        next.play_unchecked(mv);
        self.push(next);
    }

    fn undo_move(&mut self, _mv: &Move) {
        self.pop();
    }

    fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    fn is_draw(&self) -> bool {
        self.pos.is_stalemate()
            || self.pos.is_insufficient_material()
            || self.pos.halfmoves() >= 100
            || self.is_repetition()
    }

    fn is_in_check(&self) -> bool {
        self.pos.is_check()
    }

    fn try_skip_turn(&mut self) -> bool {
        if self.pos.is_check() {
            return false;
        }
        match self.pos.clone().swap_turn() {
            Ok(skipped) => {
                self.push(skipped);
                true
            }
            Err(_) => false,
        }
    }

    fn undo_skip_turn(&mut self) {
        self.pop();
    }

    fn position_hash(&self) -> u64 {
        self.hashes.last().copied().unwrap_or_else(|| zobrist(&self.pos))
    }

    fn ply_count(&self) -> u32 {
        self.root_ply.saturating_add(self.undo.len() as u32)
    }

    fn move_name(&self, mv: &Move) -> String {
        move_name(mv)
    }
}

fn zobrist(pos: &Chess) -> u64 {
    pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

fn game_ply(pos: &Chess) -> u32 {
    let fullmoves = pos.fullmoves().get();
    fullmoves
        .saturating_sub(1)
        .saturating_mul(2)
        .saturating_add(u32::from(pos.turn() == Color::Black))
        .min(MAX_ROOT_PLY)
}
