use super::history::GameHistory;
use super::limits::SearchLimits;
use super::params::{NODE_PIECE_WEIGHT, UCB_EXPLORATION, UCB_PIECE_WEIGHT};
use super::playout::playout;
use super::results::{SearchResult, SearchStats};
use super::{Searcher, choose_near_best, create_rng};
use crate::engine::evaluate::{Evaluator, checked_evaluation, material_balance};
use crate::game::{BoardMove, BoardMoveExt, Color, Position};
use rand::rngs::StdRng;

/// Tree node. Values are in [-1, 1] from the point of view of the side that
/// played `board_move`; until the first visit `position` is the parent's.
struct MctsNode {
    position: Position,
    board_move: BoardMove,
    ply: usize,
    play_count: u32,
    total_score: f64,
    piece_value: f64,
    is_forced_win: bool,
    is_expanded: bool,
    children: Vec<MctsNode>,
}

impl MctsNode {
    fn new(parent: &Position, board_move: BoardMove, ply: usize) -> Self {
        Self {
            position: *parent,
            board_move,
            ply,
            play_count: 0,
            total_score: 0.0,
            piece_value: 0.0,
            is_forced_win: false,
            is_expanded: false,
            children: Vec::new(),
        }
    }

    fn mean(&self) -> f64 {
        match self.play_count {
            0 => 0.0,
            n => self.total_score / n as f64,
        }
    }

    /// Side that played `board_move`; valid once visited.
    fn mover(&self) -> Color {
        !self.position.side
    }

    fn expand(&mut self) {
        let ply = self.ply + 1;

        self.children = self
            .position
            .generate_pseudo_moves()
            .into_iter()
            .map(|board_move| MctsNode::new(&self.position, board_move, ply))
            .collect();
        self.is_expanded = true;
    }

    fn ucb(&self, parent_visits: u32) -> f64 {
        self.mean()
            + UCB_EXPLORATION * (2.0 * (parent_visits as f64).ln() / self.play_count as f64).sqrt()
            + UCB_PIECE_WEIGHT * self.piece_value
    }

    /// Proven wins first, then unvisited children, then the highest UCB1 score.
    fn select_child(&self) -> Option<usize> {
        if let Some(index) = self.children.iter().position(|child| child.is_forced_win) {
            return Some(index);
        }

        if let Some(index) = self.children.iter().position(|child| child.play_count == 0) {
            return Some(index);
        }

        self.children
            .iter()
            .enumerate()
            .map(|(index, child)| (index, child.ucb(self.play_count)))
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
    }

    fn principal_variation(&self) -> Vec<BoardMove> {
        let mut pv = Vec::new();
        let mut node = self;

        while let Some(child) = node.children.iter().max_by_key(|child| child.play_count) {
            if child.play_count == 0 {
                break;
            }
            pv.push(child.board_move);
            node = child;
        }

        pv
    }
}

pub struct MctsSearch {
    limits: SearchLimits,
    evaluator: Option<Box<dyn Evaluator>>,
    rng: StdRng,
    stats: SearchStats,
}

impl MctsSearch {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            rng: create_rng(limits.seed),
            limits,
            evaluator: None,
            stats: SearchStats::new(),
        }
    }

    /// Leaves are scored by `evaluator` instead of a playout when it succeeds.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    fn leaf_outcome(&mut self, position: &Position, mover: Color) -> f64 {
        if let Some(evaluator) = self.evaluator.as_deref() {
            if let Some(probability) = checked_evaluation(evaluator, position) {
                let ours = if position.side == mover {
                    probability
                } else {
                    1.0 - probability
                };

                return 2.0 * ours - 1.0;
            }
        }

        playout(
            position,
            mover,
            self.limits.playout_plies,
            self.limits.playout_policy,
            &mut self.rng,
        )
    }

    fn record(node: &mut MctsNode, outcome: f64) -> f64 {
        let value = NODE_PIECE_WEIGHT * node.piece_value + (1.0 - NODE_PIECE_WEIGHT) * outcome;

        node.play_count += 1;
        node.total_score += value;

        value
    }

    /// One iteration through `node`; `None` when its move turns out to be illegal.
    fn visit(&mut self, node: &mut MctsNode) -> Option<f64> {
        self.stats.increment_nodes();

        if node.play_count == 0 {
            if !node.position.is_safe_move(node.board_move) {
                return None;
            }

            node.position.make_move(node.board_move);
            node.piece_value = material_balance(&node.position, node.mover());

            let outcome = self.leaf_outcome(&node.position, node.mover());
            return Some(Self::record(node, outcome));
        }

        if node.is_forced_win {
            node.play_count += 1;
            node.total_score += 1.0;
            return Some(1.0);
        }

        if node.ply >= self.limits.max_tree_depth {
            let outcome = self.leaf_outcome(&node.position, node.mover());
            return Some(Self::record(node, outcome));
        }

        if !node.is_expanded {
            node.expand();
        }

        loop {
            let Some(index) = node.select_child() else {
                // the opponent has no legal reply
                node.is_forced_win = true;
                node.play_count += 1;
                node.total_score += 1.0;
                return Some(1.0);
            };

            match self.visit(&mut node.children[index]) {
                Some(child_value) => return Some(Self::record(node, -child_value)),
                None => {
                    node.children.swap_remove(index);
                }
            }
        }
    }
}

impl Searcher for MctsSearch {
    fn search(&mut self, position: &Position, history: &GameHistory) -> SearchResult {
        self.stats = SearchStats::new();

        let mut root = MctsNode::new(position, BoardMove::empty(), 0);
        root.play_count = 1;
        root.is_expanded = true;

        root.children = root
            .position
            .get_moves()
            .into_iter()
            .filter(|&board_move| {
                let mut after = *position;
                after.make_move(board_move);
                !history.contains(after.zobrist_key)
            })
            .map(|board_move| MctsNode::new(position, board_move, 1))
            .collect();

        let budget: usize = root
            .children
            .iter()
            .map(|child| match child.board_move.is_drop() {
                true => self.limits.playouts_per_drop,
                false => self.limits.playouts_per_move,
            })
            .sum();

        for _ in 0..budget {
            let Some(index) = root.select_child() else {
                break;
            };

            match self.visit(&mut root.children[index]) {
                Some(_) => root.play_count += 1,
                None => {
                    root.children.swap_remove(index);
                }
            }
        }

        let scores = root
            .children
            .iter()
            .map(|child| match (child.is_forced_win, child.play_count) {
                (true, _) => f64::INFINITY,
                (false, 0) => f64::NEG_INFINITY,
                (false, _) => child.mean(),
            })
            .collect::<Vec<_>>();

        let Some(index) = choose_near_best(&scores, &mut self.rng) else {
            log::info!("No legal moves, resigning");
            return SearchResult::resign();
        };

        let chosen = &root.children[index];

        log::debug!(
            "mcts iterations {} nodes {} time {}ms nps {}",
            budget,
            self.stats.nodes,
            self.stats.get_elapsed_ms(),
            self.stats.get_nps()
        );

        SearchResult::with_pv(chosen.board_move, chosen.mean(), chosen.principal_variation())
    }
}
