//! Additional operations for the Burn deep learning framework
//!
//! This crate provides tensor operations that imitation losses need and that are
//! not available in the core Burn framework: an explicit stop-gradient scaling
//! path for reweighting a loss by statistics taken from data.

mod stop_gradient;

// Convenient re-exports
pub use stop_gradient::{detached_constant, StopGradient};
