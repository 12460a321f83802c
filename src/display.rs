use std::collections::BTreeMap;

use shakmaty::{File, Move, Square};

use crate::types::Score;

/// Long algebraic (UCI) name of a move: `e2e4`, `e7e8q`, `e1g1`.
pub fn move_name(mv: &Move) -> String {
    match mv {
        Move::Normal {
            from,
            to,
            promotion,
            ..
        } => match promotion {
            Some(role) => format!("{}{}{}", from, to, role.char()),
            None => format!("{}{}", from, to),
        },
        Move::EnPassant { from, to } => format!("{}{}", from, to),
        Move::Castle { king, rook } => {
            // shakmaty encodes castling as king-takes-rook
            let file = if (rook.file() as u8) > (king.file() as u8) {
                File::G
            } else {
                File::C
            };
            format!("{}{}", king, Square::from_coords(file, king.rank()))
        }
        Move::Put { role, to } => format!("{}@{}", role.upper_char(), to),
    }
}

/// Root moves grouped by score, for the diagnostics log.
#[derive(Debug, Default)]
pub struct ScoreTable {
    by_score: BTreeMap<Score, Vec<String>>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: String, score: Score) {
        self.by_score.entry(score).or_default().push(name);
    }

    pub fn clear(&mut self) {
        self.by_score.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_score.is_empty()
    }

    /// One line per score, lowest first.
    pub fn lines(&self) -> Vec<String> {
        self.by_score
            .iter()
            .map(|(score, names)| format!("{:>5} - {}", score, names.join(" ")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Game, GamePosition};

    #[test]
    fn test_move_names_from_startpos() {
        let game = Game::startpos();
        let names: Vec<String> = game.legal_moves().iter().map(move_name).collect();
        assert_eq!(names.len(), 20);
        assert!(names.contains(&"e2e4".to_string()));
        assert!(names.contains(&"g1f3".to_string()));
    }

    #[test]
    fn test_castle_and_promotion_names() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let names: Vec<String> = game.legal_moves().iter().map(move_name).collect();
        assert!(names.contains(&"e1g1".to_string()));
        assert!(names.contains(&"e1c1".to_string()));

        let game = Game::from_fen("8/P7/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let names: Vec<String> = game.legal_moves().iter().map(move_name).collect();
        assert!(names.contains(&"a7a8q".to_string()));
        assert!(names.contains(&"a7a8r".to_string()));
    }

    #[test]
    fn test_score_table_lines_sorted() {
        let mut table = ScoreTable::new();
        table.add("e2e4".to_string(), 3);
        table.add("d2d4".to_string(), -12);
        table.add("g1f3".to_string(), 3);
        assert_eq!(table.lines(), vec!["  -12 - d2d4", "    3 - e2e4 g1f3"]);
        table.clear();
        assert!(table.is_empty());
    }
}
