use super::moves::{BoardMove, BoardMoveExt};
use super::pieces::{Piece, PromotionRule};
use super::position::Position;
use crate::utils::{
    Bitboard, BitboardExt, BoardSquare, BoardSquareExt, FILE_MASKS, FULL_BOARD,
    KING_ATTACKS, PROMOTION_ZONE, between, piece_attacks,
};

pub type MoveList = Vec<BoardMove>;

/// Non-king kinds in generation order.
const MOVING_PIECES: [Piece; 9] = [
    Piece::Pawn,
    Piece::Silver,
    Piece::Gold,
    Piece::Bishop,
    Piece::Rook,
    Piece::ProPawn,
    Piece::ProSilver,
    Piece::Horse,
    Piece::Dragon,
];

/// Stable reorder putting captures first.
pub fn sort_moves(moves: &mut [BoardMove]) {
    moves.sort_by_key(|board_move| board_move.get_captured().is_none());
}

impl Position {
    /// Legal moves for the side to move.
    pub fn get_moves(&mut self) -> MoveList {
        let mut moves = self.generate_pseudo_moves();
        moves.retain(|&board_move| self.is_safe_move(board_move));
        moves
    }

    /// Candidate moves; pinned pieces and pawn-drop mates still need `is_safe_move`.
    pub fn generate_pseudo_moves(&mut self) -> MoveList {
        let us = self.side;

        let Some(king) = self.king_square(us) else {
            return MoveList::new();
        };

        if let Some(capture) = self.king_capture_move() {
            return vec![capture];
        }

        let mut moves = MoveList::with_capacity(64);
        let checkers = self.attackers_to(king, !us);

        match checkers.count_ones() {
            0 => {
                self.generate_board_moves(FULL_BOARD, &mut moves);
                self.generate_king_moves(king, &mut moves);
                self.generate_drops(FULL_BOARD, &mut moves);
            }
            1 => {
                let checker = checkers.next_index();
                let blocks = between(king, checker);

                self.generate_king_moves(king, &mut moves);
                self.generate_board_moves(blocks | checker.to_mask(), &mut moves);
                self.generate_drops(blocks, &mut moves);
            }
            // double check, only the king can help
            _ => self.generate_king_moves(king, &mut moves),
        }

        moves
    }

    /// Whether the move leaves the mover's king unattacked. A pawn drop that
    /// gives check must also leave the opponent with at least one legal reply.
    pub fn is_safe_move(&mut self, board_move: BoardMove) -> bool {
        let us = self.side;

        if let Some(piece) = board_move.get_dropped_piece() {
            if piece != Piece::Pawn || !self.gives_check(board_move) {
                return true;
            }

            self.make_move(board_move);
            let has_reply = !self.get_moves().is_empty();
            self.unmake_move(board_move);

            return has_reply;
        }

        if board_move.get_captured() == Some(Piece::King) {
            return true;
        }

        let (from, to) = (board_move.get_from(), board_move.get_to());

        let captured = self.move_piece(from, to, false);
        let safe = !self.is_check(us);
        self.unmove_piece(from, to, false);

        if let Some((piece, color)) = captured {
            self.set_piece(to, piece, color);
        }

        safe
    }

    fn king_capture_move(&self) -> Option<BoardMove> {
        let us = self.side;
        let enemy_king = self.king_square(!us)?;

        let attackers = self.attackers_to(enemy_king, us);
        if attackers == 0 {
            return None;
        }

        let from = attackers.next_index();
        let (piece, _) = self.pieces[from as usize]?;
        let promote = piece.promotion_rule() == PromotionRule::Forced
            && self.touches_promotion_zone(from, enemy_king);

        Some(BoardMove::new_move(from, enemy_king, promote).with_captured(Some(Piece::King)))
    }

    fn touches_promotion_zone(&self, from: BoardSquare, to: BoardSquare) -> bool {
        (from.to_mask() | to.to_mask()) & PROMOTION_ZONE[self.side as usize] != 0
    }

    fn push_piece_move(&self, piece: Piece, from: BoardSquare, to: BoardSquare, moves: &mut MoveList) {
        let captured = self.pieces[to as usize].map(|(piece, _)| piece);
        let in_zone = self.touches_promotion_zone(from, to);

        match (piece.promotion_rule(), in_zone) {
            (PromotionRule::Forced, true) => {
                moves.push(BoardMove::new_move(from, to, true).with_captured(captured));
            }
            (PromotionRule::Optional, true) => {
                moves.push(BoardMove::new_move(from, to, false).with_captured(captured));
                moves.push(BoardMove::new_move(from, to, true).with_captured(captured));
            }
            _ => moves.push(BoardMove::new_move(from, to, false).with_captured(captured)),
        }
    }

    fn generate_board_moves(&self, targets: Bitboard, moves: &mut MoveList) {
        let us = self.side as usize;
        let occupied = self.occupied();
        let allowed = targets & !self.color_bitboards[us];

        for piece in MOVING_PIECES {
            for from in self.piece_bitboards[us][piece as usize].iter_positions() {
                let destinations = piece_attacks(piece, self.side, from, occupied) & allowed;

                for to in destinations.iter_positions() {
                    self.push_piece_move(piece, from, to, moves);
                }
            }
        }
    }

    fn generate_king_moves(&mut self, king: BoardSquare, moves: &mut MoveList) {
        let us = self.side;

        // sliders must see through the king's current square
        let removed = self.clear_piece(king);
        let danger = self.all_effect(!us);
        if let Some((piece, color)) = removed {
            self.set_piece(king, piece, color);
        }

        let destinations =
            KING_ATTACKS[king as usize] & !self.color_bitboards[us as usize] & !danger;

        for to in destinations.iter_positions() {
            let captured = self.pieces[to as usize].map(|(piece, _)| piece);
            moves.push(BoardMove::new_move(king, to, false).with_captured(captured));
        }
    }

    fn generate_drops(&self, targets: Bitboard, moves: &mut MoveList) {
        let us = self.side as usize;
        let empty = self.occupied().complement() & targets;

        for piece in self.hands[us].pieces() {
            let mut squares = empty;

            if piece == Piece::Pawn {
                squares &= !PROMOTION_ZONE[us];

                let pawns = self.piece_bitboards[us][Piece::Pawn as usize];
                for file_mask in FILE_MASKS {
                    if pawns & file_mask != 0 {
                        squares &= !file_mask;
                    }
                }
            }

            for to in squares.iter_positions() {
                moves.push(BoardMove::new_drop(piece, to));
            }
        }
    }
}
