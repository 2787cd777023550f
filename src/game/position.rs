use super::hand::Hand;
use super::moves::{BoardMove, BoardMoveExt};
use super::pieces::{Color, Piece, PromotionRule};
use crate::utils::{
    BOARD_SIZE, Bitboard, BitboardExt, BoardSquare, BoardSquareExt, MAX_HAND_COUNT, SQUARE_COUNT,
    ZOBRIST, piece_attacks,
};
use std::fmt::{Display, Formatter};
use strum::{EnumCount, IntoEnumIterator};
use thiserror::Error;

pub const START_SFEN: &str = "rbsgk/4p/5/P4/KGSBR b - 1";

pub type PieceBoard = [Option<(Piece, Color)>; SQUARE_COUNT];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("malformed board row `{0}`")]
    MalformedBoard(String),
    #[error("unknown piece `{0}`")]
    UnknownPiece(char),
    #[error("invalid side to move `{0}`")]
    InvalidSide(String),
    #[error("invalid hand `{0}`")]
    InvalidHand(String),
    #[error("more than two {0:?} pieces in play")]
    TooManyPieces(Piece),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub side: Color,
    pub pieces: PieceBoard,

    pub color_bitboards: [Bitboard; Color::COUNT],
    pub piece_bitboards: [[Bitboard; Piece::COUNT]; Color::COUNT],
    pub hands: [Hand; Color::COUNT],

    pub zobrist_key: u64,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    pub fn new() -> Position {
        match Self::from_sfen(START_SFEN) {
            Ok(position) => position,
            Err(error) => unreachable!("start position failed to parse: {}", error),
        }
    }

    fn empty() -> Position {
        Position {
            side: Color::Black,
            pieces: [None; SQUARE_COUNT],
            color_bitboards: [0; Color::COUNT],
            piece_bitboards: [[0; Piece::COUNT]; Color::COUNT],
            hands: [Hand::default(); Color::COUNT],
            zobrist_key: 0,
        }
    }

    /// Parses `<board> <side> [<hands> [<move number>]]`, e.g. `rbsgk/4p/5/P4/KGSBR b - 1`.
    pub fn from_sfen(sfen: &str) -> Result<Position, PositionError> {
        let mut parts = sfen.split_whitespace();

        let board = parts.next().ok_or(PositionError::MissingField("board"))?;
        let side = parts.next().ok_or(PositionError::MissingField("side"))?;
        let hands = parts.next().unwrap_or("-");

        let mut position = Position::empty();

        let rows = board.split('/').collect::<Vec<_>>();
        if rows.len() != BOARD_SIZE {
            return Err(PositionError::MalformedBoard(board.to_string()));
        }

        for (rank, row) in rows.iter().enumerate() {
            let malformed = || PositionError::MalformedBoard(row.to_string());

            // files are listed from 5 down to 1
            let mut remaining = BOARD_SIZE as u32;
            let mut promoted = false;

            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    if promoted || empty > remaining {
                        return Err(malformed());
                    }
                    remaining -= empty;
                    continue;
                }

                if c == '+' {
                    promoted = true;
                    continue;
                }

                let mut piece =
                    Piece::from_char(c.to_ascii_lowercase()).ok_or(PositionError::UnknownPiece(c))?;

                if promoted {
                    if piece.promotion_rule() == PromotionRule::Never {
                        return Err(malformed());
                    }
                    piece = piece.promote();
                    promoted = false;
                }

                if remaining == 0 {
                    return Err(malformed());
                }
                remaining -= 1;

                let color = if c.is_ascii_uppercase() {
                    Color::Black
                } else {
                    Color::White
                };

                position.set_piece(
                    BoardSquare::from_position(remaining as u8, rank as u8),
                    piece,
                    color,
                );
            }

            if remaining != 0 || promoted {
                return Err(malformed());
            }
        }

        position.side = match side {
            "b" => Color::Black,
            "w" => Color::White,
            _ => return Err(PositionError::InvalidSide(side.to_string())),
        };

        if hands != "-" {
            let invalid = || PositionError::InvalidHand(hands.to_string());
            let mut count = 0;

            for c in hands.chars() {
                // counts are single digits, never above MAX_HAND_COUNT
                if let Some(digit) = c.to_digit(10) {
                    if count != 0 || digit == 0 {
                        return Err(invalid());
                    }
                    count = digit as usize;
                    continue;
                }

                let piece = Piece::from_char(c.to_ascii_lowercase()).ok_or_else(invalid)?;
                let color = if c.is_ascii_uppercase() {
                    Color::Black
                } else {
                    Color::White
                };
                let copies = count.max(1);
                count = 0;

                if piece == Piece::King
                    || position.hands[color as usize].count(piece) + copies > MAX_HAND_COUNT
                {
                    return Err(invalid());
                }

                for _ in 0..copies {
                    position.add_to_hand(color, piece);
                }
            }

            if count != 0 {
                return Err(invalid());
            }
        }

        // a third copy of a kind could not be held after a capture
        for piece in Piece::HAND_PIECES {
            let on_board = position
                .pieces
                .iter()
                .flatten()
                .filter(|(board_piece, _)| board_piece.unpromote() == piece)
                .count();
            let in_hands = position.hands.iter().map(|hand| hand.count(piece)).sum::<usize>();

            if on_board + in_hands > MAX_HAND_COUNT {
                return Err(PositionError::TooManyPieces(piece));
            }
        }

        position.zobrist_key = position.compute_zobrist();

        Ok(position)
    }

    pub fn to_sfen(&self) -> String {
        let mut sfen = String::new();

        for rank in 0..BOARD_SIZE as u8 {
            let mut empty = 0;

            for file in (0..BOARD_SIZE as u8).rev() {
                match self.pieces[BoardSquare::from_position(file, rank) as usize] {
                    Some((piece, color)) => {
                        if empty != 0 {
                            sfen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        sfen.push_str(&piece.to_glyph(color));
                    }
                    None => empty += 1,
                }
            }

            if empty != 0 {
                sfen.push_str(&empty.to_string());
            }

            if rank + 1 < BOARD_SIZE as u8 {
                sfen.push('/');
            }
        }

        sfen.push_str(match self.side {
            Color::Black => " b ",
            Color::White => " w ",
        });

        let mut hands = String::new();
        for color in Color::iter() {
            for piece in [Piece::Rook, Piece::Bishop, Piece::Gold, Piece::Silver, Piece::Pawn] {
                let count = self.hands[color as usize].count(piece);

                if count > 1 {
                    hands.push_str(&count.to_string());
                }

                if count > 0 {
                    hands.push(match color {
                        Color::Black => piece.to_char().to_ascii_uppercase(),
                        Color::White => piece.to_char(),
                    });
                }
            }
        }

        sfen.push_str(if hands.is_empty() { "-" } else { &hands });
        sfen.push_str(" 1");

        sfen
    }

    pub fn set_piece(&mut self, square: BoardSquare, piece: Piece, color: Color) {
        debug_assert!(
            self.pieces[square as usize].is_none(),
            "{} is already occupied",
            square.unparse()
        );

        let mask = square.to_mask();

        self.pieces[square as usize] = Some((piece, color));
        self.color_bitboards[color as usize] |= mask;
        self.piece_bitboards[color as usize][piece as usize] |= mask;
        self.zobrist_key ^= ZOBRIST.pieces[color as usize][piece as usize][square as usize];
    }

    pub fn clear_piece(&mut self, square: BoardSquare) -> Option<(Piece, Color)> {
        let (piece, color) = self.pieces[square as usize].take()?;
        let mask = square.to_mask();

        self.color_bitboards[color as usize] &= !mask;
        self.piece_bitboards[color as usize][piece as usize] &= !mask;
        self.zobrist_key ^= ZOBRIST.pieces[color as usize][piece as usize][square as usize];

        Some((piece, color))
    }

    /// Moves the piece on `from` to `to`, returning whatever stood on `to`.
    pub fn move_piece(
        &mut self,
        from: BoardSquare,
        to: BoardSquare,
        promote: bool,
    ) -> Option<(Piece, Color)> {
        let captured = self.clear_piece(to);

        let Some((piece, color)) = self.clear_piece(from) else {
            panic!("no piece to move on {}\n{}", from.unparse(), self);
        };

        self.set_piece(to, if promote { piece.promote() } else { piece }, color);

        captured
    }

    /// Inverse of `move_piece` without restoring the captured piece.
    pub fn unmove_piece(&mut self, from: BoardSquare, to: BoardSquare, unpromote: bool) {
        let Some((piece, color)) = self.clear_piece(to) else {
            panic!("no piece to move back on {}\n{}", to.unparse(), self);
        };

        self.set_piece(from, if unpromote { piece.unpromote() } else { piece }, color);
    }

    pub fn add_to_hand(&mut self, color: Color, piece: Piece) {
        let hand = &mut self.hands[color as usize];
        let keys = &ZOBRIST.hands[color as usize][piece as usize];

        self.zobrist_key ^= keys[hand.count(piece)];
        hand.add(piece);
        self.zobrist_key ^= keys[hand.count(piece)];
    }

    pub fn remove_from_hand(&mut self, color: Color, piece: Piece) {
        let hand = &mut self.hands[color as usize];
        let keys = &ZOBRIST.hands[color as usize][piece as usize];

        self.zobrist_key ^= keys[hand.count(piece)];
        hand.remove(piece);
        self.zobrist_key ^= keys[hand.count(piece)];
    }

    fn switch_side(&mut self) {
        self.side = !self.side;
        self.zobrist_key ^= ZOBRIST.side_to_move;
    }

    pub fn make_move(&mut self, board_move: BoardMove) {
        if board_move.is_empty() || board_move.is_resign() {
            log::warn!("Ignoring sentinel move {}", board_move.unparse());
            return;
        }

        let us = self.side;
        let to = board_move.get_to();

        match board_move.get_dropped_piece() {
            Some(piece) => {
                self.remove_from_hand(us, piece);
                self.set_piece(to, piece, us);
            }
            None => {
                let captured =
                    self.move_piece(board_move.get_from(), to, board_move.is_promotion());

                debug_assert_eq!(
                    captured.map(|(piece, _)| piece),
                    board_move.get_captured(),
                    "move {} carries a stale capture",
                    board_move.unparse()
                );

                if let Some((piece, _)) = captured {
                    // the game is over once a king falls, it never enters a hand
                    if piece != Piece::King {
                        self.add_to_hand(us, piece.unpromote());
                    }
                }
            }
        }

        self.switch_side();
    }

    /// Reverts `make_move`; must be called with the same move, most recent first.
    pub fn unmake_move(&mut self, board_move: BoardMove) {
        if board_move.is_empty() || board_move.is_resign() {
            return;
        }

        self.switch_side();

        let us = self.side;
        let to = board_move.get_to();

        match board_move.get_dropped_piece() {
            Some(piece) => {
                self.clear_piece(to);
                self.add_to_hand(us, piece);
            }
            None => {
                self.unmove_piece(board_move.get_from(), to, board_move.is_promotion());

                if let Some(captured) = board_move.get_captured() {
                    if captured != Piece::King {
                        self.remove_from_hand(us, captured.unpromote());
                    }
                    self.set_piece(to, captured, !us);
                }
            }
        }
    }

    /// Fills in the captured kind of a parsed move from the current board.
    pub fn with_capture(&self, board_move: BoardMove) -> BoardMove {
        if board_move.is_drop() || board_move.is_empty() || board_move.is_resign() {
            return board_move;
        }

        board_move.with_captured(self.pieces[board_move.get_to() as usize].map(|(piece, _)| piece))
    }

    pub fn gives_check(&mut self, board_move: BoardMove) -> bool {
        let board_move = self.with_capture(board_move);

        self.make_move(board_move);
        let check = self.is_check(self.side);
        self.unmake_move(board_move);

        check
    }

    pub fn occupied(&self) -> Bitboard {
        self.color_bitboards[Color::Black as usize] | self.color_bitboards[Color::White as usize]
    }

    pub fn king_square(&self, color: Color) -> Option<BoardSquare> {
        match self.piece_bitboards[color as usize][Piece::King as usize] {
            0 => None,
            kings => Some(kings.next_index()),
        }
    }

    /// Squares attacked by the piece on `square`, empty if there is none.
    pub fn attacks_from(&self, square: BoardSquare) -> Bitboard {
        match self.pieces[square as usize] {
            Some((piece, color)) => piece_attacks(piece, color, square, self.occupied()),
            None => 0,
        }
    }

    /// Every square attacked by `color`, recomputed from scratch.
    pub fn all_effect(&self, color: Color) -> Bitboard {
        self.color_bitboards[color as usize]
            .iter_positions()
            .fold(0, |acc, square| acc | self.attacks_from(square))
    }

    /// Squares of `color`'s pieces that attack `target`.
    pub fn attackers_to(&self, target: BoardSquare, color: Color) -> Bitboard {
        self.color_bitboards[color as usize]
            .iter_positions()
            .filter(|&square| self.attacks_from(square).is_set(target))
            .fold(0, |acc, square| acc | square.to_mask())
    }

    pub fn is_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.attackers_to(king, !color) != 0)
    }

    pub fn compute_zobrist(&self) -> u64 {
        let mut key = match self.side {
            Color::Black => 0,
            Color::White => ZOBRIST.side_to_move,
        };

        for (square, entry) in self.pieces.iter().enumerate() {
            if let Some((piece, color)) = entry {
                key ^= ZOBRIST.pieces[*color as usize][*piece as usize][square];
            }
        }

        for color in Color::iter() {
            for piece in Piece::HAND_PIECES {
                let count = self.hands[color as usize].count(piece);
                key ^= ZOBRIST.hands[color as usize][piece as usize][count];
            }
        }

        key
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in 0..BOARD_SIZE as u8 {
            for file in (0..BOARD_SIZE as u8).rev() {
                match self.pieces[BoardSquare::from_position(file, rank) as usize] {
                    Some((piece, color)) => write!(f, "{:>3}", piece.to_glyph(color))?,
                    None => write!(f, "  .")?,
                }
            }
            writeln!(f, "  {}", (b'a' + rank) as char)?;
        }

        writeln!(f, "  5  4  3  2  1")?;
        write!(f, "{}", self.to_sfen())
    }
}
