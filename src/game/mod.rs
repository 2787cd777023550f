pub mod hand;
pub mod movegen;
pub mod moves;
pub mod pieces;
pub mod position;

pub use hand::*;
pub use movegen::*;
pub use moves::*;
pub use pieces::*;
pub use position::*;
