//! Imitation losses for Levin-tree-search policy learning.
//!
//! A search that solves a problem leaves behind a trajectory: the states on the
//! solution path, the actions taken, how many nodes were expanded, and how much
//! probability the current policy gave the solution. The losses in this crate turn
//! one such trajectory and one forward pass of a model into a differentiable scalar.
//!
//! ## Losses
//!
//! - **[`CrossEntropyLoss`]**: imitate the recorded actions
//! - **[`LevinLoss`]**: imitation weighted by search effort (`expanded`)
//! - **[`ImprovedLevinLoss`]**: imitation weighted by `expanded * a`, with `a`
//!   derived from path depth and solution probability
//! - **[`CrossEntropyMseLoss`]** and **[`LevinMseLoss`]**: the above plus
//!   cost-to-go regression for two-headed models
//! - **[`MseLoss`]**: cost-to-go regression only
//!
//! Reweighting factors are detached constants: they scale the gradient of the
//! imitation term and receive no gradient of their own.
//!
//! ## Usage Example
//!
//! ```rust
//! use burn::prelude::*;
//! use levin_loss::{LevinLossResult, LossConfig, LossKind, SearchState, Trajectory, TrajectoryModel};
//!
//! fn training_loss<B, S, M>(
//!     trajectory: &Trajectory<S>,
//!     model: &M,
//! ) -> LevinLossResult<Tensor<B, 1>>
//! where
//!     B: Backend,
//!     S: SearchState<B>,
//!     M: TrajectoryModel<B>,
//! {
//!     let loss = LossConfig::new().with_kind(LossKind::ImprovedLevin).init();
//!     loss.compute_loss(trajectory, model)
//! }
//! ```

mod config;
mod error;
mod losses;
mod model;
mod numeric;
mod trajectory;

pub use config::{LossConfig, LossKind, LossStrategy};
pub use error::{LevinLossError, LevinLossResult};
pub use losses::{
    CrossEntropyLoss, CrossEntropyLossConfig, CrossEntropyMseLoss, CrossEntropyMseLossConfig,
    ImprovedLevinLoss, ImprovedLevinLossConfig, LevinLoss, LevinLossConfig, LevinMseLoss,
    LevinMseLossConfig, LossSummary, LossTerms, MseLoss, MseLossConfig,
};
pub use model::{ModelOutput, TrajectoryModel};
pub use numeric::{improved_levin_exponent, improved_levin_multiplier, levin_multiplier};
pub use trajectory::{ImageState, SearchState, Trajectory, TrajectoryRecord};

// Reduction policy used by every loss config.
pub use burn::nn::loss::Reduction;
