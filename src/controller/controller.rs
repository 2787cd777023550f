use crate::engine::evaluate::{Evaluator, material_share};
use crate::engine::network::{get_network, load_network_from_file};
use crate::engine::search::history::GameHistory;
use crate::engine::search::limits::{SearchLimits, SearchParams};
use crate::engine::search::results::SearchResult;
use crate::engine::search::{EngineKind, create_searcher};
use crate::game::{BoardMove, BoardMoveExt, Color, Piece, Position, PositionError};
use crate::utils::{BOARD_SIZE, BoardSquare, BoardSquareExt, BotCommand, respond};
use fxhash::FxHashMap;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;

pub struct GameController {
    pub position: Position,
    pub history: GameHistory,
    pub engine: EngineKind,
    pub limits: SearchLimits,
    pub use_network: bool,
    pub perft_hash: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveResultType {
    Success,         // successful move
    InvalidNotation, // not a move in USI notation
    InvalidMove,     // not legal in the current position
}

type PerftTable = FxHashMap<u64, usize>;

impl Default for GameController {
    fn default() -> Self {
        Self::new(EngineKind::AlphaBeta, SearchLimits::default())
    }
}

impl GameController {
    pub fn new(engine: EngineKind, limits: SearchLimits) -> Self {
        let mut controller = Self {
            position: Position::new(),
            history: GameHistory::new(),
            engine,
            limits,
            use_network: false,
            perft_hash: true,
        };

        controller.new_game();
        controller
    }

    pub fn new_game(&mut self) {
        self.reset_to(Position::new());
    }

    fn reset_to(&mut self, position: Position) {
        self.position = position;
        self.history = GameHistory::new();
        self.history.push(self.position.zobrist_key);
    }

    /// Sets up `sfen` (the start position when `None`) and replays `moves`.
    /// Replay stops at the first move that cannot be played.
    pub fn set_position(&mut self, sfen: Option<&str>, moves: &[String]) -> Result<(), PositionError> {
        let position = match sfen {
            Some(sfen) => Position::from_sfen(sfen)?,
            None => Position::new(),
        };

        self.reset_to(position);

        for notation in moves {
            let result = self.try_move_piece(notation);

            if result != MoveResultType::Success {
                log::warn!("Cannot replay {} ({:?}), stopping", notation, result);
                break;
            }
        }

        Ok(())
    }

    pub fn try_move_piece(&mut self, notation: &str) -> MoveResultType {
        let Some(board_move) = BoardMove::parse(notation) else {
            return MoveResultType::InvalidNotation;
        };

        let board_move = self.position.with_capture(board_move);

        if self.position.get_moves().contains(&board_move) {
            self.position.make_move(board_move);
            self.history.push(self.position.zobrist_key);

            MoveResultType::Success
        } else {
            MoveResultType::InvalidMove
        }
    }

    pub fn set_option(&mut self, name: &str, value: &str) {
        match name.to_lowercase().replace(' ', "").as_str() {
            "engine" => match EngineKind::parse(value) {
                Some(engine) => self.engine = engine,
                None => log::warn!(
                    "Invalid value for Engine option: {}. Expected alpha-beta, mcts or hybrid",
                    value
                ),
            },
            "depth" => match value.parse::<usize>() {
                Ok(depth) => self.limits.depth = depth,
                Err(_) => log::warn!("Invalid value for Depth option: {}. Expected numeric value", value),
            },
            "playouts" => match value.parse::<usize>() {
                Ok(playouts) => self.limits.playouts_per_move = playouts,
                Err(_) => log::warn!(
                    "Invalid value for Playouts option: {}. Expected numeric value",
                    value
                ),
            },
            "perfthash" => match value.to_lowercase().as_str() {
                "true" => self.perft_hash = true,
                "false" => self.perft_hash = false,
                _ => log::warn!(
                    "Invalid value for PerftHash option: {}. Expected 'true' or 'false'",
                    value
                ),
            },
            "evalfile" => match load_network_from_file(Path::new(value)) {
                Ok(()) => self.use_network = true,
                Err(error) => log::warn!("Cannot load network {}: {}", value, error),
            },
            _ => log::warn!("Unknown option: {}", name),
        }
    }

    pub fn print_usi_options(&self) {
        println!("option name Engine type combo default alpha-beta var alpha-beta var mcts var hybrid");
        println!("option name Depth type spin default {} min 0 max 64", self.limits.depth);
        println!(
            "option name Playouts type spin default {} min 0 max 1000000",
            self.limits.playouts_per_move
        );
        println!("option name PerftHash type check default true");
        println!("option name EvalFile type string default <none>");
    }

    /// Searches the current position, reports the move and plays it.
    pub fn best_move(&mut self, params: Vec<String>) -> SearchResult {
        let limits = self.limits.with_params(&SearchParams::parse(params));
        let mut searcher = create_searcher(self.engine, limits, self.use_network);

        let start = Instant::now();
        let result = searcher.search(&self.position, &self.history);

        respond(BotCommand::Info(format!(
            "time {} score {:.3} pv {}",
            start.elapsed().as_millis(),
            result.evaluation,
            result.pv_string()
        )));
        respond(BotCommand::BestMove(result.best_move.unparse()));

        log::info!("Playing {}", result);

        if !result.is_resign() {
            self.position.make_move(result.best_move);
            self.history.push(self.position.zobrist_key);
        }

        result
    }

    /// Leaf counts of the legal move tree below each root move.
    pub fn perft(&mut self, depth: usize) -> Vec<(BoardMove, usize)> {
        if depth == 0 {
            return Vec::new();
        }

        let hashing = self.perft_hash;
        let root = self.position;

        self.position
            .get_moves()
            .into_par_iter()
            .map(|board_move| {
                let mut position = root;
                let mut table = PerftTable::default();

                position.make_move(board_move);
                (board_move, count_leaves(&mut position, depth - 1, hashing, &mut table))
            })
            .collect()
    }

    pub fn print_evaluation(&self) {
        let material = material_share(&self.position, self.position.side);

        match get_network().map(|network| network.evaluate(&self.position)) {
            Some(Ok(probability)) => println!("material {:.3} network {:.3}", material, probability),
            Some(Err(error)) => println!("material {:.3} network failed: {}", material, error),
            None => println!("material {:.3}", material),
        }
    }

    pub fn print(&self) {
        const RESET: &str = "\x1b[0m";
        const LIGHT_SQUARE_BG: &str = "\x1b[48;5;172m";
        const DARK_SQUARE_BG: &str = "\x1b[48;5;130m";
        const BLACK_PIECE: &str = "\x1b[1;30m";
        const WHITE_PIECE: &str = "\x1b[1;97m";

        let heading = match self.position.side {
            Color::Black => "Black to move",
            Color::White => "White to move",
        };
        println!("{}", heading);

        for rank in 0..BOARD_SIZE as u8 {
            let mut line = String::new();

            for file in (0..BOARD_SIZE as u8).rev() {
                let square = BoardSquare::from_position(file, rank);
                line.push_str(match (file + rank) % 2 {
                    0 => LIGHT_SQUARE_BG,
                    _ => DARK_SQUARE_BG,
                });

                match self.position.pieces[square as usize] {
                    Some((piece, color)) => {
                        let piece_color = match color {
                            Color::Black => BLACK_PIECE,
                            Color::White => WHITE_PIECE,
                        };
                        line.push_str(&format!("{}{:>3}{}", piece_color, piece.to_glyph(color), RESET));
                    }
                    None => line.push_str(&format!("   {}", RESET)),
                }
            }

            println!("{} {}", line, (b'a' + rank) as char);
        }

        println!("  5  4  3  2  1");

        for color in [Color::Black, Color::White] {
            let hand = &self.position.hands[color as usize];
            let glyphs = hand
                .pieces()
                .flat_map(|piece: Piece| vec![piece.to_glyph(color); hand.count(piece)])
                .collect::<Vec<_>>();

            println!("{:?} hand: {}", color, glyphs.join(" "));
        }

        println!("{}", self.position.to_sfen());
    }
}

fn count_leaves(position: &mut Position, depth: usize, hashing: bool, table: &mut PerftTable) -> usize {
    if depth == 0 {
        return 1;
    }

    let key = position.zobrist_key ^ depth as u64;
    if hashing {
        if let Some(count) = table.get(&key) {
            return *count;
        }
    }

    let moves = position.get_moves();

    // Bulk counting
    let total_count = if depth == 1 {
        moves.len()
    } else {
        moves
            .into_iter()
            .map(|board_move| {
                position.make_move(board_move);
                let count = count_leaves(position, depth - 1, hashing, table);
                position.unmake_move(board_move);
                count
            })
            .sum()
    };

    if hashing {
        table.insert(key, total_count);
    }

    total_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(breakdown: &[(BoardMove, usize)]) -> usize {
        breakdown.iter().map(|(_, count)| count).sum()
    }

    #[test]
    fn replaying_moves_updates_history() {
        let mut controller = GameController::default();
        let moves = ["1e1d", "5a5b"].map(str::to_string);

        controller.set_position(None, &moves).unwrap();

        assert_eq!(controller.history.len(), 3);
        assert_eq!(controller.position.side, Color::Black);
        assert!(controller.history.contains(controller.position.zobrist_key));
    }

    #[test]
    fn bad_moves_are_rejected() {
        let mut controller = GameController::default();

        assert_eq!(controller.try_move_piece("9z9z"), MoveResultType::InvalidNotation);
        assert_eq!(controller.try_move_piece("1e1a"), MoveResultType::InvalidMove);
        assert_eq!(controller.try_move_piece("5d5c"), MoveResultType::Success);
        assert_eq!(controller.history.len(), 2);
    }

    #[test]
    fn bad_sfen_is_an_error() {
        let mut controller = GameController::default();

        assert!(controller.set_position(Some("4k/5/5 b - 1"), &[]).is_err());
    }

    #[test]
    fn perft_with_and_without_hashing_agree() {
        let mut controller = GameController::default();

        let first = controller.perft(1);
        assert_eq!(first.len(), 14);
        assert_eq!(total(&first), 14);

        let hashed = total(&controller.perft(3));
        controller.set_option("PerftHash", "false");
        assert_eq!(total(&controller.perft(3)), hashed);
    }

    #[test]
    fn options_change_the_search() {
        let mut controller = GameController::default();

        controller.set_option("Engine", "mcts");
        controller.set_option("Depth", "2");
        controller.set_option("Playouts", "nope");
        controller.set_option("EvalFile", "does/not/exist.bin");

        assert_eq!(controller.engine, EngineKind::Mcts);
        assert_eq!(controller.limits.depth, 2);
        assert_eq!(controller.limits.playouts_per_move, SearchLimits::default().playouts_per_move);
        assert!(!controller.use_network);
    }

    #[test]
    fn best_move_is_played() {
        let mut controller = GameController::default();
        controller.limits.seed = Some(1);

        let result = controller.best_move(vec!["depth".to_string(), "2".to_string()]);

        assert!(!result.is_resign());
        assert_eq!(controller.position.side, Color::White);
        assert_eq!(controller.history.len(), 2);
    }
}
