pub mod bitboard;
pub mod cli;
pub mod zobrist;

pub use bitboard::*;
pub use cli::*;
pub use zobrist::*;
