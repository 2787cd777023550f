use std::ops::Not;
use strum_macros::{EnumCount, EnumIter, FromRepr};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount, FromRepr)]
pub enum Piece {
    Gold = 0,
    King = 1,
    Pawn = 2,
    Silver = 3,
    Bishop = 4,
    Rook = 5,
    ProPawn = 6,
    ProSilver = 7,
    Horse = 8,
    Dragon = 9,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount, FromRepr)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Not for Color {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// How a piece behaves when a move touches its promotion zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromotionRule {
    Never,
    Optional,
    Forced,
}

impl Piece {
    /// Kinds that can be held in hand, in drop-generation order.
    pub const HAND_PIECES: [Piece; 5] = [
        Piece::Pawn,
        Piece::Gold,
        Piece::Silver,
        Piece::Bishop,
        Piece::Rook,
    ];

    pub fn from_char(c: char) -> Option<Piece> {
        match c {
            'g' => Some(Piece::Gold),
            'k' => Some(Piece::King),
            'p' => Some(Piece::Pawn),
            's' => Some(Piece::Silver),
            'b' => Some(Piece::Bishop),
            'r' => Some(Piece::Rook),
            _ => None,
        }
    }

    /// Letter of the unpromoted kind; promoted pieces are written with a leading `+`.
    pub fn to_char(self) -> char {
        match self.unpromote() {
            Piece::Gold => 'g',
            Piece::King => 'k',
            Piece::Pawn => 'p',
            Piece::Silver => 's',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            _ => unreachable!(),
        }
    }

    pub fn is_promoted(self) -> bool {
        matches!(
            self,
            Piece::ProPawn | Piece::ProSilver | Piece::Horse | Piece::Dragon
        )
    }

    pub fn promote(self) -> Piece {
        match self {
            Piece::Pawn => Piece::ProPawn,
            Piece::Silver => Piece::ProSilver,
            Piece::Bishop => Piece::Horse,
            Piece::Rook => Piece::Dragon,
            other => other,
        }
    }

    pub fn unpromote(self) -> Piece {
        match self {
            Piece::ProPawn => Piece::Pawn,
            Piece::ProSilver => Piece::Silver,
            Piece::Horse => Piece::Bishop,
            Piece::Dragon => Piece::Rook,
            other => other,
        }
    }

    pub fn promotion_rule(self) -> PromotionRule {
        match self {
            Piece::Pawn | Piece::Bishop | Piece::Rook => PromotionRule::Forced,
            Piece::Silver => PromotionRule::Optional,
            _ => PromotionRule::Never,
        }
    }

    /// Numeric piece code used by the evaluator feature vector:
    /// raw kinds 1..6, +8 when promoted, +16 for white.
    pub fn feature_code(self, color: Color) -> u8 {
        let raw = self.unpromote() as u8 + 1;
        let promoted = if self.is_promoted() { 8 } else { 0 };
        let side = match color {
            Color::Black => 0,
            Color::White => 16,
        };

        raw + promoted + side
    }

    /// Single-character board glyph, uppercase for black.
    pub fn to_glyph(self, color: Color) -> String {
        let c = match color {
            Color::Black => self.to_char().to_ascii_uppercase(),
            Color::White => self.to_char(),
        };

        if self.is_promoted() {
            format!("+{}", c)
        } else {
            c.to_string()
        }
    }
}
