use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid FEN `{fen}`: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("illegal move `{0}`")]
    IllegalMove(String),

    #[error("no legal moves in position")]
    NoLegalMoves,
}
