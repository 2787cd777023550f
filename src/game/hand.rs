use super::pieces::Piece;
use crate::utils::MAX_HAND_COUNT;

/// Captured pieces available for dropping, two bits of count per unpromoted kind.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Hand(u16);

impl Hand {
    fn shift(piece: Piece) -> u16 {
        assert!(
            !piece.is_promoted() && piece != Piece::King,
            "{:?} can never be held in hand",
            piece
        );

        piece as u16 * 2
    }

    pub fn count(&self, piece: Piece) -> usize {
        ((self.0 >> Self::shift(piece)) & 0b11) as usize
    }

    pub fn add(&mut self, piece: Piece) {
        let count = self.count(piece);
        assert!(
            count < MAX_HAND_COUNT,
            "malformed hand: adding a {:?} to {} held copies",
            piece,
            count
        );

        self.0 += 1 << Self::shift(piece);
    }

    pub fn remove(&mut self, piece: Piece) {
        let count = self.count(piece);
        assert!(count > 0, "malformed hand: removing a {:?} that is not held", piece);

        self.0 -= 1 << Self::shift(piece);
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Held kinds in drop-generation order.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        Piece::HAND_PIECES
            .into_iter()
            .filter(|&piece| self.count(piece) > 0)
    }
}
