use super::history::GameHistory;
use super::limits::SearchLimits;
use super::params::{LEAF_RESCORE_WEIGHT, MATE_SCORE, TIE_TOLERANCE};
use super::results::{SearchResult, SearchStats};
use super::{Searcher, choose_near_best, create_rng};
use crate::engine::evaluate::{Evaluator, material_balance, win_probability};
use crate::game::{BoardMove, BoardMoveExt, Position, sort_moves};
use rand::rngs::StdRng;

/// One position in the search tree. Every node keeps its best child so the
/// principal variation can be read back; only the root keeps all children.
struct SearchNode {
    position: Position,
    board_move: BoardMove,
    ply: usize,
    score: f64,
    is_illegal: bool,
    children: Vec<SearchNode>,
    best_child: Option<Box<SearchNode>>,
}

impl SearchNode {
    fn root(position: Position) -> Self {
        Self {
            position,
            board_move: BoardMove::empty(),
            ply: 0,
            score: f64::NEG_INFINITY,
            is_illegal: false,
            children: Vec::new(),
            best_child: None,
        }
    }

    /// Plays `board_move` on a copy of `parent`, flagging it illegal when unsafe
    /// or, with a history, when it repeats a position of the real game.
    fn child(parent: &Position, board_move: BoardMove, ply: usize, history: Option<&GameHistory>) -> Self {
        let mut position = *parent;
        let mut is_illegal = !position.is_safe_move(board_move);

        if !is_illegal {
            position.make_move(board_move);
            is_illegal = history.is_some_and(|history| history.contains(position.zobrist_key));
        }

        Self {
            position,
            board_move,
            ply,
            score: f64::NEG_INFINITY,
            is_illegal,
            children: Vec::new(),
            best_child: None,
        }
    }

    fn principal_variation(&self) -> Vec<BoardMove> {
        let mut pv = Vec::new();
        let mut node = self.best_child.as_deref();

        while let Some(child) = node {
            pv.push(child.board_move);
            node = child.best_child.as_deref();
        }

        pv
    }

    /// Position at the end of the principal variation.
    fn leaf_position(&self) -> &Position {
        let mut node = self;

        while let Some(child) = node.best_child.as_deref() {
            node = child;
        }

        &node.position
    }
}

pub struct AlphaBetaSearch {
    limits: SearchLimits,
    evaluator: Option<Box<dyn Evaluator>>,
    rng: StdRng,
    stats: SearchStats,
}

impl AlphaBetaSearch {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            rng: create_rng(limits.seed),
            limits,
            evaluator: None,
            stats: SearchStats::new(),
        }
    }

    /// Near-best root moves get rescored by `evaluator` at the end of their variation.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Negamax value of `position` for its side to move, searched `depth` plies.
    pub fn evaluate_position(&mut self, position: &Position, depth: usize) -> f64 {
        let previous_depth = self.limits.depth;
        self.limits.depth = depth;

        let mut node = SearchNode::root(*position);
        let score = self.negamax(&mut node, f64::NEG_INFINITY, f64::INFINITY);

        self.limits.depth = previous_depth;
        score
    }

    /// Value for the side to move at `node`; children are negated exactly once.
    fn negamax(&mut self, node: &mut SearchNode, mut alpha: f64, beta: f64) -> f64 {
        self.stats.increment_nodes();

        let mut moves = node.position.generate_pseudo_moves();

        if moves.is_empty() {
            return -MATE_SCORE / node.ply.max(1) as f64;
        }

        if node.ply >= self.limits.depth {
            // a pseudo move may still be pinned, so the horizon checks for mate too
            if !moves.iter().any(|&board_move| node.position.is_safe_move(board_move)) {
                return -MATE_SCORE / node.ply.max(1) as f64;
            }

            return material_balance(&node.position, node.position.side);
        }

        sort_moves(&mut moves);

        let mut best = f64::NEG_INFINITY;

        for board_move in moves {
            let mut child = SearchNode::child(&node.position, board_move, node.ply + 1, None);
            if child.is_illegal {
                continue;
            }

            child.score = -self.negamax(&mut child, -beta, -alpha);

            if child.score > best {
                best = child.score;
                node.best_child = Some(Box::new(child));
            }

            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }

        if best == f64::NEG_INFINITY {
            // every candidate was unsafe
            return -MATE_SCORE / node.ply.max(1) as f64;
        }

        node.score = best;
        best
    }

    /// Blends the evaluator into the near-best children. The rest drop out of
    /// the choice, since their raw scores are not comparable with blended ones.
    fn rescore_with_evaluator(&self, root: &mut SearchNode, best: f64) {
        let Some(evaluator) = self.evaluator.as_deref() else {
            return;
        };

        let root_side = root.position.side;

        for child in root.children.iter_mut() {
            if child.is_illegal {
                continue;
            }

            if child.score < best - TIE_TOLERANCE {
                child.score = f64::NEG_INFINITY;
                continue;
            }

            let leaf = child.leaf_position();
            let probability = win_probability(evaluator, leaf);
            let ours = if leaf.side == root_side {
                probability
            } else {
                1.0 - probability
            };

            child.score =
                child.score * (1.0 - LEAF_RESCORE_WEIGHT) + (2.0 * ours - 1.0) * LEAF_RESCORE_WEIGHT;
        }
    }
}

impl Searcher for AlphaBetaSearch {
    fn search(&mut self, position: &Position, history: &GameHistory) -> SearchResult {
        self.stats = SearchStats::new();

        let mut root = SearchNode::root(*position);
        let mut moves = root.position.generate_pseudo_moves();
        sort_moves(&mut moves);

        root.children = moves
            .into_iter()
            .map(|board_move| SearchNode::child(&root.position, board_move, 1, Some(history)))
            .collect();

        // widened by the tolerance so near-ties come back with exact scores
        let mut best = f64::NEG_INFINITY;
        for child in root.children.iter_mut().filter(|child| !child.is_illegal) {
            let floor = best - TIE_TOLERANCE;
            child.score = -self.negamax(child, f64::NEG_INFINITY, -floor);
            best = best.max(child.score);
        }

        self.rescore_with_evaluator(&mut root, best);

        let scores = root
            .children
            .iter()
            .map(|child| if child.is_illegal { f64::NEG_INFINITY } else { child.score })
            .collect::<Vec<_>>();

        let Some(index) = choose_near_best(&scores, &mut self.rng) else {
            log::info!("No moves available, resigning");
            return SearchResult::resign();
        };

        let chosen = &root.children[index];
        if chosen.is_illegal {
            log::info!("No legal moves, resigning");
            return SearchResult::resign();
        }

        log::debug!(
            "alpha-beta depth {} nodes {} time {}ms nps {}",
            self.limits.depth,
            self.stats.nodes,
            self.stats.get_elapsed_ms(),
            self.stats.get_nps()
        );

        SearchResult::with_pv(chosen.board_move, chosen.score, chosen.principal_variation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate::EvaluatorError;

    struct ConstantEvaluator(f64);

    impl Evaluator for ConstantEvaluator {
        fn evaluate(&self, _: &Position) -> Result<f64, EvaluatorError> {
            Ok(self.0)
        }
    }

    struct FailingEvaluator;

    impl Evaluator for FailingEvaluator {
        fn evaluate(&self, _: &Position) -> Result<f64, EvaluatorError> {
            Err(EvaluatorError::NotLoaded)
        }
    }

    // black's rook can take the lone pawn on 3c, nothing else comes close
    const FREE_PAWN: &str = "4k/5/2p2/5/K1R2 b - 1";

    fn limits(depth: usize) -> SearchLimits {
        SearchLimits {
            depth,
            seed: Some(42),
            ..SearchLimits::default()
        }
    }

    #[test]
    fn depth_zero_follows_material() {
        let mut search = AlphaBetaSearch::new(limits(0));

        let ahead = Position::from_sfen("4k/5/5/5/K4 b R 1").unwrap();
        let behind = Position::from_sfen("4k/5/5/5/K4 w R 1").unwrap();
        let even = Position::new();

        let ahead_score = search.evaluate_position(&ahead, 0);
        let behind_score = search.evaluate_position(&behind, 0);
        let even_score = search.evaluate_position(&even, 0);

        assert!(ahead_score > even_score);
        assert!(even_score > behind_score);
        assert_eq!(ahead_score, -behind_score);
    }

    #[test]
    fn checkmated_side_scores_a_loss() {
        let mut search = AlphaBetaSearch::new(limits(2));
        let mated = Position::from_sfen("r3k/5/1g3/2s2/K4 b - 1").unwrap();

        assert!(search.evaluate_position(&mated, 2) <= -MATE_SCORE);
    }

    #[test]
    fn root_children_keep_the_principal_variation() {
        let mut search = AlphaBetaSearch::new(limits(3));
        let result = search.search(&Position::new(), &GameHistory::new());

        assert!(!result.is_resign());
        assert_eq!(result.pv[0], result.best_move);
        assert_eq!(result.pv.len(), 3);
    }

    #[test]
    fn mate_behind_a_pinned_piece_is_seen_at_the_horizon() {
        // the silver could block the rook, but the bishop on 2b pins it
        let mut position = Position::from_sfen("r3k/3b1/5/1Sg2/K4 b - 1").unwrap();
        assert!(position.get_moves().is_empty());
        assert!(!position.generate_pseudo_moves().is_empty());

        let mut search = AlphaBetaSearch::new(limits(0));
        assert!(search.evaluate_position(&position, 0) <= -MATE_SCORE);
    }

    #[test]
    fn hybrid_only_chooses_between_rescored_moves() {
        let position = Position::from_sfen(FREE_PAWN).unwrap();

        let plain = AlphaBetaSearch::new(limits(1)).search(&position, &GameHistory::new());
        assert_eq!(plain.best_move.unparse(), "3e3c");

        // a sure loss at the leaf pulls the capture down, yet it stays the only candidate
        let mut hybrid = AlphaBetaSearch::new(limits(1)).with_evaluator(Box::new(ConstantEvaluator(1.0)));
        let result = hybrid.search(&position, &GameHistory::new());

        assert_eq!(result.best_move.unparse(), "3e3c");
        assert!(result.evaluation < plain.evaluation);
    }

    #[test]
    fn failing_evaluator_falls_back_to_material() {
        let position = Position::from_sfen(FREE_PAWN).unwrap();

        let plain = AlphaBetaSearch::new(limits(1)).search(&position, &GameHistory::new());
        let mut hybrid = AlphaBetaSearch::new(limits(1)).with_evaluator(Box::new(FailingEvaluator));
        let result = hybrid.search(&position, &GameHistory::new());

        assert_eq!(result.best_move, plain.best_move);
        assert!((result.evaluation - plain.evaluation).abs() < 1e-9);
    }
}
