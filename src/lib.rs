pub mod cache;
pub mod display;
pub mod error;
pub mod evaluation;
pub mod host;
pub mod moveorder;
pub mod search;
pub mod time;
pub mod types;

pub use error::EngineError;
pub use host::{Game, GamePosition};
pub use search::Engine;
pub use time::{Clock, MoveTimer};
pub use types::{CacheKind, EngineConfig, Score, MAX_SCORE};
