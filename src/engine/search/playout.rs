use super::limits::PlayoutPolicy;
use super::params::{CAPTURE_WEIGHT, CHECK_WEIGHT, DANGER_WEIGHT, OTHER_WEIGHT};
use crate::engine::evaluate::material_balance;
use crate::game::{BoardMove, BoardMoveExt, Color, Piece, Position};
use crate::utils::BitboardExt;
use rand::Rng;

/// Draws moves uniformly, discarding unsafe ones; `none` when nothing is legal.
pub fn select_random_move<R: Rng>(position: &mut Position, rng: &mut R) -> BoardMove {
    let mut moves = position.generate_pseudo_moves();
    take_safe_move(position, &mut moves, rng)
}

fn take_safe_move<R: Rng>(position: &mut Position, moves: &mut Vec<BoardMove>, rng: &mut R) -> BoardMove {
    while !moves.is_empty() {
        let board_move = moves.swap_remove(rng.random_range(0..moves.len()));

        if position.is_safe_move(board_move) {
            return board_move;
        }
    }

    BoardMove::empty()
}

/// Draws a bucket by weight (captures, checks, dangerous, others), then a safe
/// move from it; exhausted buckets are dropped and the draw is repeated.
pub fn select_weighted_move<R: Rng>(position: &mut Position, rng: &mut R) -> BoardMove {
    let danger = position.all_effect(!position.side);

    let mut buckets: [(u32, Vec<BoardMove>); 4] = [
        (CAPTURE_WEIGHT, Vec::new()),
        (CHECK_WEIGHT, Vec::new()),
        (DANGER_WEIGHT, Vec::new()),
        (OTHER_WEIGHT, Vec::new()),
    ];

    for board_move in position.generate_pseudo_moves() {
        let capture = board_move
            .get_captured()
            .is_some_and(|piece| piece != Piece::Pawn);
        let check = position.gives_check(board_move);

        if capture {
            buckets[0].1.push(board_move);
        }

        if check {
            buckets[1].1.push(board_move);
        }

        if !capture && !check {
            if danger.is_set(board_move.get_to()) {
                buckets[2].1.push(board_move);
            } else {
                buckets[3].1.push(board_move);
            }
        }
    }

    loop {
        let total: u32 = buckets
            .iter()
            .filter(|(_, moves)| !moves.is_empty())
            .map(|(weight, _)| weight)
            .sum();

        if total == 0 {
            return BoardMove::empty();
        }

        let mut pick = rng.random_range(0..total);
        let Some((_, moves)) = buckets
            .iter_mut()
            .filter(|(_, moves)| !moves.is_empty())
            .find(|(weight, _)| {
                if pick < *weight {
                    true
                } else {
                    pick -= *weight;
                    false
                }
            })
        else {
            return BoardMove::empty();
        };

        let board_move = take_safe_move(position, moves, rng);
        if !board_move.is_empty() {
            return board_move;
        }
    }
}

/// Plays at most `plies` moves from `position` and scores the result in [-1, 1]
/// for `perspective`. A side left without legal moves loses outright.
pub fn playout<R: Rng>(
    position: &Position,
    perspective: Color,
    plies: usize,
    policy: PlayoutPolicy,
    rng: &mut R,
) -> f64 {
    let mut position = *position;

    for _ in 0..plies {
        let board_move = match policy {
            PlayoutPolicy::Uniform => select_random_move(&mut position, rng),
            PlayoutPolicy::Weighted => select_weighted_move(&mut position, rng),
        };

        if board_move.is_empty() {
            return if position.side == perspective { -1.0 } else { 1.0 };
        }

        position.make_move(board_move);
    }

    material_balance(&position, perspective)
}
