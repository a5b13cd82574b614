//! Entropy coding: the Golomb-Rice coder, signed-to-unsigned residual mapping
//! and adaptive parameter estimation.

pub mod estimate;
pub mod golomb;
pub mod residual;

pub use golomb::{GolombCoder, GolombParam};
pub use residual::SignMode;
