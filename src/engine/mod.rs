pub mod evaluate;
pub mod network;
pub mod search;
