use crate::game::{Color, Piece};
use fxhash::FxHashMap;
use std::cell::RefCell;
use strum::EnumCount;

pub type Bitboard = u32;
pub type BoardSquare = u8;

pub const BOARD_SIZE: usize = 5;
pub const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Only the low 25 bits are ever meaningful.
pub const FULL_BOARD: Bitboard = (1 << SQUARE_COUNT) - 1;

pub trait BitboardExt {
    fn next_index(&self) -> BoardSquare;
    fn is_set(&self, index: BoardSquare) -> bool;
    fn complement(&self) -> Bitboard;
    fn print(&self, title: Option<&str>, position: Option<BoardSquare>);
    fn iter_positions(&self) -> BitboardIterator;
}

// used like this because we can't have a const fn as a trait,
// but we want to use it for the compile-time table calculation
pub const fn position_to_bitmask(file: u32, rank: u32) -> Bitboard {
    1 << (file * BOARD_SIZE as u32 + rank)
}

pub const fn is_position_valid(file: isize, rank: isize) -> bool {
    file >= 0 && file < BOARD_SIZE as isize && rank >= 0 && rank < BOARD_SIZE as isize
}

impl BitboardExt for Bitboard {
    fn next_index(&self) -> BoardSquare {
        self.trailing_zeros() as BoardSquare
    }

    fn is_set(&self, index: BoardSquare) -> bool {
        self & (1 << index) != 0
    }

    fn complement(&self) -> Bitboard {
        !self & FULL_BOARD
    }

    fn print(&self, title: Option<&str>, position: Option<BoardSquare>) {
        if let Some(title_text) = title {
            log::debug!(
                "\x1b[97m{}{}\x1b[0m",
                " ".repeat((3 * BOARD_SIZE).saturating_sub(title_text.len()) / 2),
                title_text
            );
        }

        // files run 5..1 from left to right, rank a is on top
        for rank in 0..BOARD_SIZE as u8 {
            let mut line = String::new();
            for file in (0..BOARD_SIZE as u8).rev() {
                let square = BoardSquare::from_position(file, rank);

                line.push_str(match (self.is_set(square), position == Some(square)) {
                    (_, true) => "\x1b[93m ● \x1b[0m",
                    (true, false) => "\x1b[97m 1 \x1b[0m",
                    (false, false) => "\x1b[90m 0 \x1b[0m",
                });
            }
            log::debug!("{}", line);
        }

        if title.is_some() {
            log::debug!("");
        }
    }

    fn iter_positions(&self) -> BitboardIterator {
        BitboardIterator { remaining: *self }
    }
}

pub trait BoardSquareExt {
    fn get_file(&self) -> u8;
    fn get_rank(&self) -> u8;
    fn parse(string: &str) -> Option<BoardSquare>;
    fn unparse(&self) -> String;
    fn from_position(file: u8, rank: u8) -> BoardSquare;
    fn to_mask(&self) -> Bitboard;
}

impl BoardSquareExt for BoardSquare {
    /// Zero-based file, 0 is file "1".
    fn get_file(&self) -> u8 {
        self / BOARD_SIZE as u8
    }

    /// Zero-based rank, 0 is rank "a".
    fn get_rank(&self) -> u8 {
        self % BOARD_SIZE as u8
    }

    fn parse(string: &str) -> Option<BoardSquare> {
        let mut chars = string.chars();

        match (chars.next(), chars.next(), chars.next()) {
            (Some(file @ '1'..='5'), Some(rank @ 'a'..='e'), None) => Some(
                BoardSquare::from_position(file as u8 - b'1', rank as u8 - b'a'),
            ),
            _ => None,
        }
    }

    fn unparse(&self) -> String {
        format!(
            "{}{}",
            (self.get_file() + b'1') as char,
            (self.get_rank() + b'a') as char
        )
    }

    fn from_position(file: u8, rank: u8) -> BoardSquare {
        file * BOARD_SIZE as u8 + rank
    }

    fn to_mask(&self) -> Bitboard {
        1 << self
    }
}

pub struct BitboardIterator {
    remaining: Bitboard,
}

impl Iterator for BitboardIterator {
    type Item = BoardSquare;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let index = self.remaining.trailing_zeros() as BoardSquare;
        self.remaining &= self.remaining - 1; // Clear the lowest set bit

        Some(index)
    }
}

type SquareBitboards = [Bitboard; SQUARE_COUNT];
type ColorSquareBitboards = [SquareBitboards; Color::COUNT];

// [file delta, rank delta]; a negative rank delta points toward rank a,
// which is forward for black
const PAWN_DELTAS: &[[i8; 2]] = &[[0, -1]];
const SILVER_DELTAS: &[[i8; 2]] = &[[0, -1], [1, -1], [-1, -1], [1, 1], [-1, 1]];
const GOLD_DELTAS: &[[i8; 2]] = &[[0, -1], [1, -1], [-1, -1], [1, 0], [-1, 0], [0, 1]];
const CROSS_DELTAS: &[[i8; 2]] = &[[0, -1], [0, 1], [1, 0], [-1, 0]];
const DIAGONAL_DELTAS: &[[i8; 2]] = &[[1, -1], [-1, -1], [1, 1], [-1, 1]];
const KING_DELTAS: &[[i8; 2]] = &[
    [0, -1],
    [0, 1],
    [1, 0],
    [-1, 0],
    [1, -1],
    [-1, -1],
    [1, 1],
    [-1, 1],
];

/// Ray directions. The first four are orthogonal (rook), the last four diagonal (bishop).
pub const RAY_DELTAS: [[i8; 2]; 8] = [
    [0, -1],
    [0, 1],
    [1, 0],
    [-1, 0],
    [1, -1],
    [-1, -1],
    [1, 1],
    [-1, 1],
];

const ROOK_DIRECTIONS: [usize; 4] = [0, 1, 2, 3];
const BISHOP_DIRECTIONS: [usize; 4] = [4, 5, 6, 7];

const fn create_bitboard_for_piece(
    file: usize,
    rank: usize,
    deltas: &[[i8; 2]],
    flip: bool,
    slider: bool,
) -> Bitboard {
    let mut bitboard = 0;

    let mut i = 0;
    while i < deltas.len() {
        let df = deltas[i][0];
        let dr = if flip { -deltas[i][1] } else { deltas[i][1] };

        let mut nf = file as i8;
        let mut nr = rank as i8;

        loop {
            nf += df;
            nr += dr;

            if !is_position_valid(nf as isize, nr as isize) {
                break;
            }

            bitboard |= position_to_bitmask(nf as u32, nr as u32);

            if !slider {
                break;
            }
        }

        i += 1;
    }

    bitboard
}

const fn calculate_step_attacks(deltas: &[[i8; 2]], flip: bool) -> SquareBitboards {
    let mut bitboards = [0; SQUARE_COUNT];

    let mut square = 0;
    while square < SQUARE_COUNT {
        bitboards[square] = create_bitboard_for_piece(
            square / BOARD_SIZE,
            square % BOARD_SIZE,
            deltas,
            flip,
            false,
        );
        square += 1;
    }

    bitboards
}

const fn calculate_colored_step_attacks(deltas: &[[i8; 2]]) -> ColorSquareBitboards {
    [
        calculate_step_attacks(deltas, false),
        calculate_step_attacks(deltas, true),
    ]
}

const fn calculate_rays() -> [[Bitboard; 8]; SQUARE_COUNT] {
    let mut rays = [[0; 8]; SQUARE_COUNT];

    let mut square = 0;
    while square < SQUARE_COUNT {
        let mut direction = 0;
        while direction < 8 {
            rays[square][direction] = create_bitboard_for_piece(
                square / BOARD_SIZE,
                square % BOARD_SIZE,
                &[RAY_DELTAS[direction]],
                false,
                true,
            );
            direction += 1;
        }
        square += 1;
    }

    rays
}

const fn calculate_slider_masks(directions: [usize; 4]) -> SquareBitboards {
    let mut masks = [0; SQUARE_COUNT];

    let mut square = 0;
    while square < SQUARE_COUNT {
        let mut i = 0;
        while i < directions.len() {
            masks[square] |= RAYS[square][directions[i]];
            i += 1;
        }
        square += 1;
    }

    masks
}

const fn calculate_between() -> [SquareBitboards; SQUARE_COUNT] {
    let mut table = [[0; SQUARE_COUNT]; SQUARE_COUNT];

    let mut from = 0;
    while from < SQUARE_COUNT {
        let mut direction = 0;
        while direction < 8 {
            let mut file = (from / BOARD_SIZE) as i8;
            let mut rank = (from % BOARD_SIZE) as i8;
            let mut passed = 0;

            loop {
                file += RAY_DELTAS[direction][0];
                rank += RAY_DELTAS[direction][1];

                if !is_position_valid(file as isize, rank as isize) {
                    break;
                }

                let to = file as usize * BOARD_SIZE + rank as usize;
                table[from][to] = passed;
                passed |= 1 << to;
            }

            direction += 1;
        }
        from += 1;
    }

    table
}

const fn calculate_file_masks() -> [Bitboard; BOARD_SIZE] {
    let mut masks = [0; BOARD_SIZE];
    let mut file = 0;
    while file < BOARD_SIZE {
        masks[file] = 0x1F << (file * BOARD_SIZE);
        file += 1;
    }
    masks
}

const fn calculate_rank_masks() -> [Bitboard; BOARD_SIZE] {
    let mut masks = [0; BOARD_SIZE];
    let mut rank = 0;
    while rank < BOARD_SIZE {
        masks[rank] = 0x108421 << rank;
        rank += 1;
    }
    masks
}

pub static PAWN_ATTACKS: ColorSquareBitboards = calculate_colored_step_attacks(PAWN_DELTAS);
pub static SILVER_ATTACKS: ColorSquareBitboards = calculate_colored_step_attacks(SILVER_DELTAS);
pub static GOLD_ATTACKS: ColorSquareBitboards = calculate_colored_step_attacks(GOLD_DELTAS);
pub static KING_ATTACKS: SquareBitboards = calculate_step_attacks(KING_DELTAS, false);
pub static CROSS_STEPS: SquareBitboards = calculate_step_attacks(CROSS_DELTAS, false);
pub static DIAGONAL_STEPS: SquareBitboards = calculate_step_attacks(DIAGONAL_DELTAS, false);

pub const RAYS: [[Bitboard; 8]; SQUARE_COUNT] = calculate_rays();
pub static BISHOP_MASKS: SquareBitboards = calculate_slider_masks(BISHOP_DIRECTIONS);
pub static ROOK_MASKS: SquareBitboards = calculate_slider_masks(ROOK_DIRECTIONS);

/// Squares strictly between two squares on a shared line, empty otherwise.
pub static BETWEEN: [SquareBitboards; SQUARE_COUNT] = calculate_between();

pub const FILE_MASKS: [Bitboard; BOARD_SIZE] = calculate_file_masks();
pub const RANK_MASKS: [Bitboard; BOARD_SIZE] = calculate_rank_masks();

/// Rank a for black, rank e for white.
pub const PROMOTION_ZONE: [Bitboard; Color::COUNT] = [RANK_MASKS[0], RANK_MASKS[BOARD_SIZE - 1]];

pub fn between(a: BoardSquare, b: BoardSquare) -> Bitboard {
    BETWEEN[a as usize][b as usize]
}

#[derive(Copy, Clone, Debug)]
enum Slider {
    Bishop = 0,
    Rook = 1,
}

thread_local! {
    // keyed by (square << 25) | masked occupancy; each thread owns its memo
    static SLIDER_CACHE: RefCell<[FxHashMap<u64, Bitboard>; 2]> =
        RefCell::new([FxHashMap::default(), FxHashMap::default()]);
}

const fn reverse(bitboard: Bitboard) -> Bitboard {
    bitboard.reverse_bits() >> (Bitboard::BITS as usize - SQUARE_COUNT)
}

/// Attacks along a single ray, up to and including the nearest blocker.
fn ray_attacks(ray: Bitboard, occupied: Bitboard) -> Bitboard {
    let blockers = ray & occupied;
    ray & (blockers ^ blockers.wrapping_sub(1))
}

fn compute_sliding_attacks(square: BoardSquare, occupied: Bitboard, directions: [usize; 4]) -> Bitboard {
    let rays = &RAYS[square as usize];

    directions
        .iter()
        .map(|&direction| {
            let [df, dr] = RAY_DELTAS[direction];

            // the nearest square must be the lowest set bit, so rays running
            // toward lower indices are mirrored first
            if df as i32 * BOARD_SIZE as i32 + dr as i32 > 0 {
                ray_attacks(rays[direction], occupied)
            } else {
                reverse(ray_attacks(reverse(rays[direction]), reverse(occupied)))
            }
        })
        .fold(0, |acc, attacks| acc | attacks)
}

fn sliding_attacks(slider: Slider, square: BoardSquare, occupied: Bitboard) -> Bitboard {
    let (masks, directions) = match slider {
        Slider::Bishop => (&BISHOP_MASKS, BISHOP_DIRECTIONS),
        Slider::Rook => (&ROOK_MASKS, ROOK_DIRECTIONS),
    };

    let masked = occupied & masks[square as usize];
    let key = ((square as u64) << SQUARE_COUNT) | masked as u64;

    SLIDER_CACHE.with(|cache| {
        *cache.borrow_mut()[slider as usize]
            .entry(key)
            .or_insert_with(|| compute_sliding_attacks(square, masked, directions))
    })
}

pub fn bishop_attacks(square: BoardSquare, occupied: Bitboard) -> Bitboard {
    sliding_attacks(Slider::Bishop, square, occupied)
}

pub fn rook_attacks(square: BoardSquare, occupied: Bitboard) -> Bitboard {
    sliding_attacks(Slider::Rook, square, occupied)
}

/// Squares attacked by `piece` of `color` standing on `square`. Own pieces are not removed.
pub fn piece_attacks(piece: Piece, color: Color, square: BoardSquare, occupied: Bitboard) -> Bitboard {
    let index = square as usize;

    match piece {
        Piece::Pawn => PAWN_ATTACKS[color as usize][index],
        Piece::Silver => SILVER_ATTACKS[color as usize][index],
        Piece::Gold | Piece::ProPawn | Piece::ProSilver => GOLD_ATTACKS[color as usize][index],
        Piece::King => KING_ATTACKS[index],
        Piece::Bishop => bishop_attacks(square, occupied),
        Piece::Rook => rook_attacks(square, occupied),
        Piece::Horse => bishop_attacks(square, occupied) | CROSS_STEPS[index],
        Piece::Dragon => rook_attacks(square, occupied) | DIAGONAL_STEPS[index],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> BoardSquare {
        BoardSquare::parse(name).unwrap()
    }

    fn mask(names: &[&str]) -> Bitboard {
        names.iter().fold(0, |acc, name| acc | sq(name).to_mask())
    }

    #[test]
    fn square_notation() {
        assert_eq!(sq("1a"), 0);
        assert_eq!(sq("5e"), 24);
        assert_eq!(sq("2c"), 7);
        assert_eq!(7u8.unparse(), "2c");
        assert_eq!(BoardSquare::parse("6a"), None);
        assert_eq!(BoardSquare::parse("1f"), None);
        assert_eq!(BoardSquare::parse("1a+"), None);
    }

    #[test]
    fn constant_masks() {
        assert_eq!(FILE_MASKS[0], 0x1F);
        assert_eq!(FILE_MASKS[4], 0x1F00000);
        assert_eq!(PROMOTION_ZONE[Color::Black as usize], 0x108421);
        assert_eq!(PROMOTION_ZONE[Color::White as usize], 0x1084210);
        assert_eq!(0u32.complement(), FULL_BOARD);
    }

    #[test]
    fn step_attacks_point_forward_for_each_side() {
        assert_eq!(PAWN_ATTACKS[Color::Black as usize][sq("3c") as usize], mask(&["3b"]));
        assert_eq!(PAWN_ATTACKS[Color::White as usize][sq("3c") as usize], mask(&["3d"]));
        assert_eq!(PAWN_ATTACKS[Color::Black as usize][sq("3a") as usize], 0);

        assert_eq!(
            GOLD_ATTACKS[Color::Black as usize][sq("3c") as usize],
            mask(&["3b", "2b", "4b", "2c", "4c", "3d"])
        );
        assert_eq!(
            SILVER_ATTACKS[Color::White as usize][sq("3c") as usize],
            mask(&["3d", "2d", "4d", "2b", "4b"])
        );
        assert_eq!(KING_ATTACKS[sq("1a") as usize], mask(&["2a", "1b", "2b"]));
    }

    #[test]
    fn sliding_attacks_stop_at_blockers() {
        let occupied = mask(&["3a", "5c", "1e"]);

        assert_eq!(
            rook_attacks(sq("3c"), occupied),
            mask(&["3b", "3a", "3d", "3e", "4c", "5c", "2c", "1c"])
        );
        assert_eq!(
            bishop_attacks(sq("3c"), occupied),
            mask(&["4b", "5a", "2b", "1a", "4d", "5e", "2d", "1e"])
        );

        // cached lookups agree with a fresh computation
        for square in 0..SQUARE_COUNT as BoardSquare {
            for occupied in [0, 0x155_5555 & FULL_BOARD, 0x0AA_AAAA, FULL_BOARD] {
                assert_eq!(
                    rook_attacks(square, occupied),
                    compute_sliding_attacks(square, occupied, ROOK_DIRECTIONS)
                );
                assert_eq!(
                    bishop_attacks(square, occupied),
                    compute_sliding_attacks(square, occupied, BISHOP_DIRECTIONS)
                );
            }
        }
    }

    #[test]
    fn promoted_sliders_add_steps() {
        assert_eq!(
            piece_attacks(Piece::Horse, Color::Black, sq("1a"), FULL_BOARD),
            mask(&["2b", "2a", "1b"])
        );
        assert_eq!(
            piece_attacks(Piece::Dragon, Color::White, sq("1a"), FULL_BOARD),
            mask(&["2a", "1b", "2b"])
        );
    }

    #[test]
    fn between_is_symmetric_and_empty_off_line() {
        for a in 0..SQUARE_COUNT as BoardSquare {
            for b in 0..SQUARE_COUNT as BoardSquare {
                assert_eq!(between(a, b), between(b, a));
            }
        }

        assert_eq!(between(sq("1a"), sq("5e")), mask(&["2b", "3c", "4d"]));
        assert_eq!(between(sq("1a"), sq("1e")), mask(&["1b", "1c", "1d"]));
        assert_eq!(between(sq("1a"), sq("2a")), 0);
        assert_eq!(between(sq("1a"), sq("2c")), 0);
    }
}
