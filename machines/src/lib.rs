pub mod atari800;

pub use atari800::{Atari800, Atari800Config, Board, LineStats};
