/// Tunable search parameters.
///
/// These are compile-time constants; `SearchLimits` takes its defaults from here
/// and `go`/`setoption` may override the per-search budgets.

// Alpha-beta
pub const MATE_SCORE: f64 = 10_000.0; // divided by the ply of the mate
pub const DEFAULT_DEPTH: usize = 4;
pub const TIE_TOLERANCE: f64 = 0.01; // root moves this close to the best are drawn at random
pub const LEAF_RESCORE_WEIGHT: f64 = 0.5; // hybrid mode, share of the evaluator at the PV leaf

// Monte-Carlo tree search
pub const UCB_EXPLORATION: f64 = 0.3;
pub const UCB_PIECE_WEIGHT: f64 = 0.2;
pub const NODE_PIECE_WEIGHT: f64 = 0.2;
pub const PLAYOUT_PLIES: usize = 10;
pub const MCTS_MAX_DEPTH: usize = 8;
pub const PLAYOUTS_PER_MOVE: usize = 1000; // iterations granted per root board move
pub const PLAYOUTS_PER_DROP: usize = 300; // iterations granted per root drop

// Weighted playout buckets
pub const CAPTURE_WEIGHT: u32 = 30; // captures of anything but a pawn
pub const CHECK_WEIGHT: u32 = 6;
pub const DANGER_WEIGHT: u32 = 1; // destination attacked by the opponent
pub const OTHER_WEIGHT: u32 = 2;
