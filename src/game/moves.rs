use super::pieces::Piece;
use crate::utils::{BoardSquare, BoardSquareExt};

/// Packed move: bits 0..4 destination, 5..9 origin (or dropped kind),
/// 10..13 captured kind + 1, bit 14 drop, bit 15 promotion.
pub type BoardMove = u16;

const SQUARE_MASK: u16 = 0x1F;
const FROM_SHIFT: u16 = 5;
const CAPTURE_SHIFT: u16 = 10;
const CAPTURE_MASK: u16 = 0xF << CAPTURE_SHIFT;
const DROP_FLAG: u16 = 1 << 14;
const PROMOTION_FLAG: u16 = 1 << 15;

const NONE_MOVE: BoardMove = 0;
const RESIGN_MOVE: BoardMove = (2 << FROM_SHIFT) | 2;

pub trait BoardMoveExt {
    fn new_move(from: BoardSquare, to: BoardSquare, promotion: bool) -> BoardMove;
    fn new_drop(piece: Piece, to: BoardSquare) -> BoardMove;
    fn empty() -> BoardMove;
    fn resign() -> BoardMove;

    fn get_from(&self) -> BoardSquare;
    fn get_to(&self) -> BoardSquare;
    fn get_dropped_piece(&self) -> Option<Piece>;
    fn get_captured(&self) -> Option<Piece>;
    fn with_captured(&self, captured: Option<Piece>) -> BoardMove;
    fn without_captured(&self) -> BoardMove;

    fn is_drop(&self) -> bool;
    fn is_promotion(&self) -> bool;
    fn is_empty(&self) -> bool;
    fn is_resign(&self) -> bool;

    fn parse(string: &str) -> Option<BoardMove>;
    fn unparse(&self) -> String;
}

impl BoardMoveExt for BoardMove {
    fn new_move(from: BoardSquare, to: BoardSquare, promotion: bool) -> BoardMove {
        let flag = if promotion { PROMOTION_FLAG } else { 0 };

        ((from as u16) << FROM_SHIFT) | to as u16 | flag
    }

    fn new_drop(piece: Piece, to: BoardSquare) -> BoardMove {
        ((piece as u16) << FROM_SHIFT) | to as u16 | DROP_FLAG
    }

    fn empty() -> BoardMove {
        NONE_MOVE
    }

    fn resign() -> BoardMove {
        RESIGN_MOVE
    }

    fn get_from(&self) -> BoardSquare {
        ((self >> FROM_SHIFT) & SQUARE_MASK) as BoardSquare
    }

    fn get_to(&self) -> BoardSquare {
        (self & SQUARE_MASK) as BoardSquare
    }

    fn get_dropped_piece(&self) -> Option<Piece> {
        if self.is_drop() {
            Piece::from_repr(self.get_from() as usize)
        } else {
            None
        }
    }

    fn get_captured(&self) -> Option<Piece> {
        match (self & CAPTURE_MASK) >> CAPTURE_SHIFT {
            0 => None,
            code => Piece::from_repr(code as usize - 1),
        }
    }

    fn with_captured(&self, captured: Option<Piece>) -> BoardMove {
        let code = captured.map_or(0, |piece| piece as u16 + 1);

        self.without_captured() | (code << CAPTURE_SHIFT)
    }

    fn without_captured(&self) -> BoardMove {
        self & !CAPTURE_MASK
    }

    fn is_drop(&self) -> bool {
        self & DROP_FLAG != 0
    }

    fn is_promotion(&self) -> bool {
        self & PROMOTION_FLAG != 0
    }

    fn is_empty(&self) -> bool {
        *self == NONE_MOVE
    }

    fn is_resign(&self) -> bool {
        *self == RESIGN_MOVE
    }

    fn parse(string: &str) -> Option<BoardMove> {
        match string {
            "resign" => return Some(BoardMove::resign()),
            "none" => return Some(BoardMove::empty()),
            _ => {}
        }

        if let Some((piece, square)) = string.split_once('*') {
            let mut chars = piece.chars();

            return match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_uppercase() => {
                    let piece = Piece::from_char(c.to_ascii_lowercase())?;
                    let to = BoardSquare::parse(square)?;

                    match piece {
                        Piece::King => None,
                        _ => Some(BoardMove::new_drop(piece, to)),
                    }
                }
                _ => None,
            };
        }

        let (squares, promotion) = match string.strip_suffix('+') {
            Some(squares) => (squares, true),
            None => (string, false),
        };

        if squares.len() != 4 || !squares.is_ascii() {
            return None;
        }

        let from = BoardSquare::parse(&squares[0..2])?;
        let to = BoardSquare::parse(&squares[2..4])?;

        if from == to {
            return None;
        }

        Some(BoardMove::new_move(from, to, promotion))
    }

    fn unparse(&self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }

        if self.is_resign() {
            return "resign".to_string();
        }

        if let Some(piece) = self.get_dropped_piece() {
            return format!(
                "{}*{}",
                piece.to_char().to_ascii_uppercase(),
                self.get_to().unparse()
            );
        }

        format!(
            "{}{}{}",
            self.get_from().unparse(),
            self.get_to().unparse(),
            if self.is_promotion() { "+" } else { "" }
        )
    }
}
