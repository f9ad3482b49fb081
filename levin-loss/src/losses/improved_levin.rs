//! Improved Levin loss.
//!
//! Instead of weighting by the raw expansion count, the classification term is
//! weighted by `expanded * a`, where `a` solves `solution_pi^a = (d + 1) / expanded`
//! for a solution path of depth `d`:
//!
//! ```text
//! a = log((d + 1) / expanded) / log(solution_pi)    if solution_pi < 1, else 0
//! a = max(a, 0)
//! Loss = stop_gradient(expanded * a) * CrossEntropy(actions, logits)
//! ```
//!
//! A solution the policy already finds with certainty (`solution_pi == 1`), or one
//! found with fewer expansions than its depth predicts, contributes nothing.

use burn::{nn::loss::Reduction, prelude::*};

use super::{classification_term, LossTerms};
use crate::{
    error::LevinLossResult,
    model::TrajectoryModel,
    numeric::improved_levin_multiplier,
    trajectory::{SearchState, Trajectory},
};

/// Configuration for creating an [ImprovedLevin loss](ImprovedLevinLoss).
#[derive(Config, Debug)]
pub struct ImprovedLevinLossConfig {
    /// How per-transition losses are combined before weighting. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl ImprovedLevinLossConfig {
    /// Initialize [ImprovedLevin loss](ImprovedLevinLoss).
    pub fn init(&self) -> ImprovedLevinLoss {
        ImprovedLevinLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Cross-entropy weighted by the derived Levin exponent.
#[derive(Debug, Clone)]
pub struct ImprovedLevinLoss {
    pub reduction: Reduction,
}

impl Default for ImprovedLevinLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl ImprovedLevinLoss {
    pub(crate) const NAME: &'static str = "ImprovedLevinLoss";

    /// Create a new improved Levin loss with default configuration.
    pub fn new() -> Self {
        ImprovedLevinLossConfig::new().init()
    }

    /// Compute the loss and its parts.
    pub fn compute_terms<B, S, M>(
        &self,
        trajectory: &Trajectory<S>,
        model: &M,
    ) -> LevinLossResult<LossTerms<B>>
    where
        B: Backend,
        S: SearchState<B>,
        M: TrajectoryModel<B>,
    {
        trajectory.decision_states()?;
        let multiplier = improved_levin_multiplier(
            trajectory.path_depth(),
            trajectory.solution_pi(),
            trajectory.expanded(),
        )?;

        let images = trajectory.image_batch::<B>(&model.device())?;
        let logits = model.forward_states(images).into_logits(Self::NAME)?;
        let classification = classification_term(
            logits,
            trajectory,
            model.number_of_actions(),
            &self.reduction,
        )?;

        tracing::debug!(
            loss = Self::NAME,
            multiplier,
            "weighting classification term"
        );
        Ok(LossTerms::classification(classification, Some(multiplier)))
    }

    /// Compute the loss.
    pub fn compute_loss<B, S, M>(
        &self,
        trajectory: &Trajectory<S>,
        model: &M,
    ) -> LevinLossResult<Tensor<B, 1>>
    where
        B: Backend,
        S: SearchState<B>,
        M: TrajectoryModel<B>,
    {
        Ok(self.compute_terms(trajectory, model)?.total)
    }
}
