use crate::controller::GameController;
use crate::engine::search::alphabeta::AlphaBetaSearch;
use crate::engine::search::history::GameHistory;
use crate::engine::search::limits::SearchLimits;
use crate::engine::search::mcts::MctsSearch;
use crate::engine::search::Searcher;
use crate::game::{BoardMove, BoardMoveExt, Color, Piece, Position};
use crate::utils::{BoardSquare, BoardSquareExt};
use std::collections::HashMap;
use std::time::Instant;

const TEST_POSITIONS: [&str; 5] = [
    "rbsgk/4p/5/P4/KGSBR b - 1",
    "r3k/5/5/5/KS3 b G 1",
    "4k/2S2/3G1/5/K4 b P 1",
    "rb2k/1s1gp/5/P1G2/K2BR w S 1",
    "2r1k/1+P3/5/1b3/K2+R1 b GSgs 1",
];

fn moves_text(moves: &[BoardMove]) -> Vec<String> {
    moves.iter().map(|board_move| board_move.unparse()).collect()
}

#[test]
fn test_zobrist_key_consistency() {
    for sfen in TEST_POSITIONS {
        println!("Testing Zobrist consistency for: {}", sfen);
        let mut position = Position::from_sfen(sfen).unwrap();

        let mut zobrist_position_map: HashMap<u64, String> = HashMap::new();
        let mut path = Vec::new();
        let mut failures = Vec::new();

        test_zobrist_consistency_recursive(
            &mut position,
            3, // test depth
            &mut zobrist_position_map,
            &mut path,
            &mut failures,
        );

        if !failures.is_empty() {
            panic!(
                "Zobrist key consistency failures for position '{}':\n{}",
                sfen,
                failures.join("\n")
            );
        }
    }
}

fn test_zobrist_consistency_recursive(
    position: &mut Position,
    depth: usize,
    zobrist_position_map: &mut HashMap<u64, String>,
    path: &mut Vec<String>,
    failures: &mut Vec<String>,
) {
    let current_zobrist = position.zobrist_key;
    let current_sfen = position.to_sfen();

    if current_zobrist != position.compute_zobrist() {
        failures.push(format!(
            "Incremental key differs from a full recomputation!\n  Path: {}\n  SFEN: {}",
            path.join(" -> "),
            current_sfen
        ));
    }

    // Same Zobrist key should map to the same position
    if let Some(previous_sfen) = zobrist_position_map.get(&current_zobrist) {
        if previous_sfen != &current_sfen {
            failures.push(format!(
                "Zobrist collision detected!\n  Key: 0x{:016x}\n  Path: {}\n  Current SFEN: {}\n  Previous SFEN: {}",
                current_zobrist,
                path.join(" -> "),
                current_sfen,
                previous_sfen
            ));
        }
    } else {
        zobrist_position_map.insert(current_zobrist, current_sfen.clone());
    }

    if depth == 0 {
        return;
    }

    let initial = *position;

    for board_move in position.get_moves() {
        let move_str = board_move.unparse();

        position.make_move(board_move);
        path.push(move_str.clone());

        test_zobrist_consistency_recursive(
            position,
            depth - 1,
            zobrist_position_map,
            path,
            failures,
        );

        position.unmake_move(board_move);
        path.pop();

        // Verify that we're back where we started, hands and all
        if *position != initial {
            failures.push(format!(
                "Position not restored after unmake_move!\n  Path: {} -> {}\n  Initial SFEN: {}\n  Restored SFEN: {}",
                path.join(" -> "),
                move_str,
                initial.to_sfen(),
                position.to_sfen()
            ));
        }
    }
}

#[test]
fn test_legal_moves_never_leave_the_king_attacked() {
    fn walk(position: &mut Position, depth: usize, failures: &mut Vec<String>) {
        if depth == 0 {
            return;
        }

        let mover = position.side;

        for board_move in position.get_moves() {
            position.make_move(board_move);

            if position.is_check(mover) {
                failures.push(format!(
                    "{} leaves the king attacked in {}",
                    board_move.unparse(),
                    position.to_sfen()
                ));
            }

            walk(position, depth - 1, failures);
            position.unmake_move(board_move);
        }
    }

    let mut failures = Vec::new();
    for sfen in TEST_POSITIONS {
        walk(&mut Position::from_sfen(sfen).unwrap(), 3, &mut failures);
    }

    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_transpositions_share_a_key() {
    let mut first = GameController::default();
    let mut second = GameController::default();

    let one_order = ["5d5c", "5a5b", "1e1d"].map(str::to_string);
    let other_order = ["1e1d", "5a5b", "5d5c"].map(str::to_string);

    first.set_position(None, &one_order).unwrap();
    second.set_position(None, &other_order).unwrap();

    assert_eq!(first.position.to_sfen(), second.position.to_sfen());
    assert_eq!(first.position.zobrist_key, second.position.zobrist_key);
    assert_ne!(first.position.zobrist_key, Position::new().zobrist_key);
}

#[test]
fn test_position() {
    for sfen in TEST_POSITIONS {
        let position = Position::from_sfen(sfen).unwrap();

        assert_eq!(position.to_sfen(), sfen, "SFEN mismatch for position: {}", sfen);
        assert_eq!(Position::from_sfen(&position.to_sfen()).unwrap(), position);
    }
}

#[test]
fn test_move_generation_is_idempotent() {
    for sfen in TEST_POSITIONS {
        let mut position = Position::from_sfen(sfen).unwrap();
        let before = position;

        let first = position.get_moves();
        let second = position.get_moves();

        assert_eq!(first, second, "Move lists differ for position: {}", sfen);
        assert_eq!(position, before, "Move generation changed position: {}", sfen);
    }
}

#[test]
fn test_double_check_allows_only_king_moves() {
    // rook on 5a and bishop on 2b both hit the king on 5e
    let mut position = Position::from_sfen("r3k/3b1/5/2G2/K4 b S 1").unwrap();
    let king = BoardSquare::parse("5e").unwrap();

    let moves = position.get_moves();

    assert!(!moves.is_empty());
    for board_move in moves {
        assert!(!board_move.is_drop(), "drop {} in double check", board_move.unparse());
        assert_eq!(board_move.get_from(), king, "{} is not a king move", board_move.unparse());
    }
}

#[test]
fn test_single_slider_check() {
    let mut position = Position::from_sfen("r3k/5/5/5/KS3 b G 1").unwrap();
    let moves = moves_text(&position.get_moves());

    for expected in ["5e4d", "4e5d", "G*5c", "G*5b", "G*5d"] {
        assert!(moves.contains(&expected.to_string()), "missing {} in {:?}", expected, moves);
    }

    // moves that ignore the check
    assert!(!moves.contains(&"4e3d".to_string()));
    assert!(!moves.contains(&"G*3c".to_string()));
}

#[test]
fn test_pawn_drop_restrictions() {
    // black already has an unpromoted pawn on file 3
    let mut position = Position::from_sfen("4k/5/2P2/5/K4 b P 1").unwrap();

    let pawn_drops = position
        .get_moves()
        .into_iter()
        .filter(|board_move| board_move.is_drop() && board_move.get_dropped_piece() == Some(Piece::Pawn))
        .collect::<Vec<_>>();

    assert!(!pawn_drops.is_empty());
    for board_move in pawn_drops {
        let to = board_move.get_to();

        assert_ne!(to.get_file(), 2, "{} doubles pawns", board_move.unparse());
        assert_ne!(to.get_rank(), 0, "{} has no further move", board_move.unparse());
    }
}

#[test]
fn test_pawn_drop_mate_is_illegal() {
    let mut position = Position::from_sfen("4k/2S2/3G1/5/K4 b P 1").unwrap();
    let moves = moves_text(&position.get_moves());

    assert!(!moves.contains(&"P*1b".to_string()));
    assert!(moves.contains(&"P*1c".to_string()));
}

#[test]
fn test_alpha_beta_finds_mate_in_one() {
    let position = Position::from_sfen("4k/5/3G1/5/K4 b G 1").unwrap();
    let limits = SearchLimits {
        depth: 2,
        seed: Some(9),
        ..SearchLimits::default()
    };

    let result = AlphaBetaSearch::new(limits).search(&position, &GameHistory::new());

    let mut after = position;
    after.make_move(result.best_move);

    assert_eq!(after.side, Color::White);
    assert!(after.get_moves().is_empty(), "{} does not mate", result.best_move.unparse());
}

#[test]
fn test_repetition_leaves_nothing_to_play() {
    // the king has a single escape, and it repeats an earlier position
    let position = Position::from_sfen("r3k/5/2g2/5/K4 b - 1").unwrap();

    let mut after = position;
    after.make_move(BoardMove::parse("5e4e").unwrap());

    let mut history = GameHistory::new();
    history.push(after.zobrist_key);

    let limits = SearchLimits {
        depth: 2,
        playouts_per_move: 10,
        seed: Some(2),
        ..SearchLimits::default()
    };

    assert!(AlphaBetaSearch::new(limits.clone()).search(&position, &history).is_resign());
    assert!(MctsSearch::new(limits).search(&position, &history).is_resign());
}

fn naive_perft(position: &mut Position, depth: usize) -> usize {
    if depth == 0 {
        return 1;
    }

    let mut total = 0;
    for board_move in position.get_moves() {
        position.make_move(board_move);
        total += naive_perft(position, depth - 1);
        position.unmake_move(board_move);
    }

    total
}

#[test]
fn test_perft_positions() {
    let mut controller = GameController::default();
    let mut failures: Vec<_> = Vec::new();
    let mut total = 0;

    for sfen in TEST_POSITIONS {
        controller.set_position(Some(sfen), &[]).unwrap();

        for depth in 1..=3 {
            let start_time = Instant::now();
            let breakdown = controller.perft(depth);
            let total_nodes: usize = breakdown.iter().map(|(_, count)| count).sum();
            let mut position = controller.position;
            let expected_count = naive_perft(&mut position, depth);

            println!(
                "  {} depth {}: {} nodes (expected: {}) - {:?}",
                sfen,
                depth,
                total_nodes,
                expected_count,
                start_time.elapsed()
            );

            if total_nodes != expected_count {
                failures.push(format!(
                    "Position '{}' at depth {}: got {} nodes, expected {}",
                    sfen, depth, total_nodes, expected_count
                ));
            }

            total += 1;
        }
    }

    // the start position has 14 legal moves
    controller.new_game();
    assert_eq!(controller.perft(1).len(), 14);

    if !failures.is_empty() {
        panic!(
            "Perft test failed with {}/{} error(s):\n  {}",
            failures.len(),
            total,
            failures.join("\n  ")
        );
    }
}
