use crate::game::{Color, Piece, Position};
use strum::IntoEnumIterator;
use thiserror::Error;

// Material values, board and hand alike
pub const PAWN_VALUE: f64 = 1.0;
pub const SILVER_VALUE: f64 = 5.0;
pub const GOLD_VALUE: f64 = 6.0;
pub const BISHOP_VALUE: f64 = 8.0;
pub const ROOK_VALUE: f64 = 10.0;
pub const PRO_PAWN_VALUE: f64 = 4.0;
pub const PRO_SILVER_VALUE: f64 = 6.0;
pub const HORSE_VALUE: f64 = 11.0;
pub const DRAGON_VALUE: f64 = 12.0;

pub fn get_piece_value(piece: Piece) -> f64 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Silver => SILVER_VALUE,
        Piece::Gold => GOLD_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::King => 0.0,
        Piece::ProPawn => PRO_PAWN_VALUE,
        Piece::ProSilver => PRO_SILVER_VALUE,
        Piece::Horse => HORSE_VALUE,
        Piece::Dragon => DRAGON_VALUE,
    }
}

/// Total value on the board and in hand, indexed by color.
pub fn material(position: &Position) -> [f64; 2] {
    let mut totals = [0.0; 2];

    for (piece, color) in position.pieces.iter().flatten() {
        totals[*color as usize] += get_piece_value(*piece);
    }

    for color in Color::iter() {
        let hand = &position.hands[color as usize];
        for piece in Piece::HAND_PIECES {
            totals[color as usize] += hand.count(piece) as f64 * get_piece_value(piece);
        }
    }

    totals
}

/// Fraction of all material owned by `color`, in [0, 1].
pub fn material_share(position: &Position, color: Color) -> f64 {
    let totals = material(position);
    let total = totals[0] + totals[1];

    if total == 0.0 {
        return 0.5;
    }

    let share = totals[color as usize] / total;
    assert!((0.0..=1.0).contains(&share), "material share {} out of range", share);

    share
}

/// Material difference in favour of `color` relative to the total, in [-1, 1].
pub fn material_balance(position: &Position, color: Color) -> f64 {
    2.0 * material_share(position, color) - 1.0
}

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("no network has been loaded")]
    NotLoaded,
    #[error("cannot read network file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed network: {0}")]
    Malformed(String),
}

/// Leaf evaluation capability shared by the search engines.
pub trait Evaluator {
    /// Win probability in [0, 1] for the side to move.
    fn evaluate(&self, position: &Position) -> Result<f64, EvaluatorError>;
}

pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, position: &Position) -> Result<f64, EvaluatorError> {
        Ok(material_share(position, position.side))
    }
}

/// Queries the evaluator, logging failures. A value outside [0, 1] is fatal.
pub fn checked_evaluation(evaluator: &dyn Evaluator, position: &Position) -> Option<f64> {
    match evaluator.evaluate(position) {
        Ok(value) => {
            assert!(
                (0.0..=1.0).contains(&value),
                "evaluator returned {} outside [0, 1]",
                value
            );
            Some(value)
        }
        Err(error) => {
            log::warn!("Evaluator failed: {}", error);
            None
        }
    }
}

/// Win probability for the side to move, falling back to material when the evaluator fails.
pub fn win_probability(evaluator: &dyn Evaluator, position: &Position) -> f64 {
    checked_evaluation(evaluator, position)
        .unwrap_or_else(|| material_share(position, position.side))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenEvaluator;

    impl Evaluator for BrokenEvaluator {
        fn evaluate(&self, _: &Position) -> Result<f64, EvaluatorError> {
            Err(EvaluatorError::NotLoaded)
        }
    }

    struct WildEvaluator;

    impl Evaluator for WildEvaluator {
        fn evaluate(&self, _: &Position) -> Result<f64, EvaluatorError> {
            Ok(1.5)
        }
    }

    #[test]
    fn start_position_is_balanced() {
        let position = Position::new();

        assert_eq!(material(&position), [30.0, 30.0]);
        assert_eq!(material_share(&position, Color::Black), 0.5);
        assert_eq!(material_balance(&position, Color::White), 0.0);
    }

    #[test]
    fn hand_pieces_count_as_material() {
        let position = Position::from_sfen("4k/5/5/5/K4 b R 1").unwrap();

        assert_eq!(material_share(&position, Color::Black), 1.0);
        assert_eq!(material_balance(&position, Color::White), -1.0);
    }

    #[test]
    fn bare_kings_are_even() {
        let position = Position::from_sfen("4k/5/5/5/K4 b - 1").unwrap();

        assert_eq!(material_share(&position, Color::Black), 0.5);
    }

    #[test]
    fn failing_evaluator_falls_back_to_material() {
        let position = Position::from_sfen("4k/5/5/5/K4 w R 1").unwrap();

        assert_eq!(win_probability(&BrokenEvaluator, &position), 0.0);
        assert_eq!(win_probability(&MaterialEvaluator, &position), 0.0);
    }

    #[test]
    #[should_panic(expected = "outside [0, 1]")]
    fn out_of_range_evaluation_is_fatal() {
        win_probability(&WildEvaluator, &Position::new());
    }
}
