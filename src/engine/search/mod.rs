pub mod alphabeta;
pub mod history;
pub mod limits;
pub mod mcts;
pub mod params;
pub mod playout;
pub mod results;

use crate::engine::network::NetworkEvaluator;
use crate::game::Position;
use alphabeta::AlphaBetaSearch;
use clap::ValueEnum;
use history::GameHistory;
use limits::SearchLimits;
use mcts::MctsSearch;
use params::TIE_TOLERANCE;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use results::SearchResult;

/// A move-picking strategy.
pub trait Searcher {
    /// Best move for the side to move; `history` holds the keys of the real game.
    fn search(&mut self, position: &Position, history: &GameHistory) -> SearchResult;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Depth-limited negamax with alpha-beta pruning
    AlphaBeta,
    /// Monte-Carlo tree search with UCB1 selection
    Mcts,
    /// Alpha-beta with the loaded network rescoring the best candidates
    Hybrid,
}

impl EngineKind {
    pub fn parse(name: &str) -> Option<EngineKind> {
        EngineKind::from_str(name, true).ok()
    }
}

/// Builds a searcher; `use_network` routes leaf evaluation through the loaded network.
pub fn create_searcher(kind: EngineKind, limits: SearchLimits, use_network: bool) -> Box<dyn Searcher> {
    match kind {
        EngineKind::AlphaBeta => Box::new(AlphaBetaSearch::new(limits)),
        EngineKind::Hybrid => {
            Box::new(AlphaBetaSearch::new(limits).with_evaluator(Box::new(NetworkEvaluator)))
        }
        EngineKind::Mcts if use_network => {
            Box::new(MctsSearch::new(limits).with_evaluator(Box::new(NetworkEvaluator)))
        }
        EngineKind::Mcts => Box::new(MctsSearch::new(limits)),
    }
}

pub(crate) fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Index of a random score within `TIE_TOLERANCE` of the maximum.
pub(crate) fn choose_near_best<R: Rng>(scores: &[f64], rng: &mut R) -> Option<usize> {
    let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let candidates = scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score >= best - TIE_TOLERANCE)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_are_broken_among_near_best_only() {
        let mut rng = create_rng(Some(7));
        let scores = [0.5, 0.995, 1.0, -3.0];

        for _ in 0..50 {
            let index = choose_near_best(&scores, &mut rng).unwrap();
            assert!(index == 1 || index == 2);
        }

        assert_eq!(choose_near_best(&[], &mut rng), None);
    }

    #[test]
    fn unscored_candidates_are_still_choosable() {
        let mut rng = create_rng(Some(7));

        assert!(choose_near_best(&[f64::NEG_INFINITY, f64::NEG_INFINITY], &mut rng).is_some());
    }

    #[test]
    fn engine_names() {
        assert_eq!(EngineKind::parse("mcts"), Some(EngineKind::Mcts));
        assert_eq!(EngineKind::parse("alpha-beta"), Some(EngineKind::AlphaBeta));
        assert_eq!(EngineKind::parse("Hybrid"), Some(EngineKind::Hybrid));
        assert_eq!(EngineKind::parse("random"), None);
    }
}
