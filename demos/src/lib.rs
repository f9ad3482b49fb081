//! Shared pieces of the loss demonstrations: a small two-headed model and a
//! synthetic grid-world dataset.

pub mod model;
pub mod sample;

pub use model::{ProbeNet, ProbeNetConfig};
pub use sample::{sample_trajectories, GRID_ACTIONS};
