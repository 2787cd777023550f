pub mod controller;
pub mod engine;
pub mod game;
pub mod utils;

#[cfg(test)]
mod test;
