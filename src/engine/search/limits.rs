use super::params::{
    DEFAULT_DEPTH, MCTS_MAX_DEPTH, PLAYOUT_PLIES, PLAYOUTS_PER_DROP, PLAYOUTS_PER_MOVE,
};
use clap::ValueEnum;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlayoutPolicy {
    Uniform,
    Weighted,
}

/// Per-search bounds
#[derive(Clone, Debug, PartialEq)]
pub struct SearchLimits {
    pub depth: usize,
    pub playouts_per_move: usize,
    pub playouts_per_drop: usize,
    pub playout_plies: usize,
    pub max_tree_depth: usize,
    pub playout_policy: PlayoutPolicy,
    pub seed: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            playouts_per_move: PLAYOUTS_PER_MOVE,
            playouts_per_drop: PLAYOUTS_PER_DROP,
            playout_plies: PLAYOUT_PLIES,
            max_tree_depth: MCTS_MAX_DEPTH,
            playout_policy: PlayoutPolicy::Weighted,
            seed: None,
        }
    }
}

impl SearchLimits {
    pub fn with_params(&self, params: &SearchParams) -> SearchLimits {
        SearchLimits {
            depth: params.depth.unwrap_or(self.depth),
            playouts_per_move: params.playouts.unwrap_or(self.playouts_per_move),
            playouts_per_drop: params.drops.unwrap_or(self.playouts_per_drop),
            seed: params.seed.or(self.seed),
            ..self.clone()
        }
    }
}

/// Search parameters from the `go` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub depth: Option<usize>,    // search to depth x
    pub playouts: Option<usize>, // x iterations per root board move
    pub drops: Option<usize>,    // x iterations per root drop
    pub seed: Option<u64>,
}

impl SearchParams {
    pub fn parse(params: Vec<String>) -> Self {
        let mut search_params = SearchParams::default();
        let mut iter = params.iter();

        while let Some(param) = iter.next() {
            match param.as_str() {
                "depth" => search_params.depth = iter.next().and_then(|v| v.parse().ok()),
                "playouts" => search_params.playouts = iter.next().and_then(|v| v.parse().ok()),
                "drops" => search_params.drops = iter.next().and_then(|v| v.parse().ok()),
                "seed" => search_params.seed = iter.next().and_then(|v| v.parse().ok()),
                // clock parameters carry a value we have no use for
                "btime" | "wtime" | "binc" | "winc" | "byoyomi" => {
                    iter.next();
                }
                _ => log::debug!("Ignoring go parameter {}", param),
            }
        }

        search_params
    }
}
