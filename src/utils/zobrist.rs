use crate::game::{Color, Piece};
use crate::utils::SQUARE_COUNT;
use strum::EnumCount;

/// Most copies of a single kind that a hand can hold.
pub const MAX_HAND_COUNT: usize = 2;

pub struct LCG {
    state: u64,
}

impl LCG {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub const fn next_u64(mut self) -> (u64, Self) {
        // https://en.wikipedia.org/wiki/Linear_congruential_generator
        const A: u64 = 6364136223846793005;
        const C: u64 = 1442695040888963407;

        self.state = self.state.wrapping_mul(A).wrapping_add(C);

        // bit 0 is reserved for the side to move
        (self.state & !1, self)
    }
}

pub struct ZobristKeys {
    pub pieces: [[[u64; SQUARE_COUNT]; Piece::COUNT]; Color::COUNT],
    pub hands: [[[u64; MAX_HAND_COUNT + 1]; Piece::COUNT]; Color::COUNT], // [.][.][0] is always 0
    pub side_to_move: u64,
}

impl ZobristKeys {
    pub const fn new() -> Self {
        let mut rng = LCG::new(20231008);

        let mut pieces = [[[0u64; SQUARE_COUNT]; Piece::COUNT]; Color::COUNT];
        let mut hands = [[[0u64; MAX_HAND_COUNT + 1]; Piece::COUNT]; Color::COUNT];

        let mut color = 0;
        while color < Color::COUNT {
            let mut piece = 0;
            while piece < Piece::COUNT {
                let mut square_idx = 0;
                while square_idx < SQUARE_COUNT {
                    let (value, new_rng) = rng.next_u64();
                    pieces[color][piece][square_idx] = value;
                    rng = new_rng;
                    square_idx += 1;
                }

                let mut count = 1;
                while count <= MAX_HAND_COUNT {
                    let (value, new_rng) = rng.next_u64();
                    hands[color][piece][count] = value;
                    rng = new_rng;
                    count += 1;
                }

                piece += 1;
            }

            color += 1;
        }

        Self {
            pieces,
            hands,
            side_to_move: 1,
        }
    }
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::new();
