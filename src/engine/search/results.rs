use crate::game::{BoardMove, BoardMoveExt};
use std::fmt::{Display, Formatter, Result};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: BoardMove,
    pub evaluation: f64,
    pub pv: Vec<BoardMove>, // Principal variation
}

impl Display for SearchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} ({:.3})", self.best_move.unparse(), self.evaluation)
    }
}

impl SearchResult {
    pub fn resign() -> Self {
        Self {
            best_move: BoardMove::resign(),
            evaluation: f64::NEG_INFINITY,
            pv: Vec::new(),
        }
    }

    pub fn with_pv(best_move: BoardMove, evaluation: f64, mut pv: Vec<BoardMove>) -> Self {
        let mut new_pv = vec![best_move];
        new_pv.append(&mut pv);
        Self {
            best_move,
            evaluation,
            pv: new_pv,
        }
    }

    pub fn is_resign(&self) -> bool {
        self.best_move.is_resign()
    }

    pub fn pv_string(&self) -> String {
        self.pv
            .iter()
            .map(|board_move| board_move.unparse())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct SearchStats {
    pub nodes: u64,
    pub start_time: Instant,
}

impl SearchStats {
    pub fn new() -> Self {
        Self {
            nodes: 0,
            start_time: Instant::now(),
        }
    }

    pub fn increment_nodes(&mut self) {
        self.nodes += 1;
    }

    pub fn get_elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    pub fn get_nps(&self) -> u64 {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        if elapsed_secs > 0.0 {
            (self.nodes as f64 / elapsed_secs) as u64
        } else {
            0
        }
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        Self::new()
    }
}
