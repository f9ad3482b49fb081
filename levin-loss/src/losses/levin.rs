//! Levin loss: cross-entropy weighted by search effort.

use burn::{nn::loss::Reduction, prelude::*};

use super::{classification_term, LossTerms};
use crate::{
    error::LevinLossResult,
    model::TrajectoryModel,
    numeric::levin_multiplier,
    trajectory::{SearchState, Trajectory},
};

/// Configuration for creating a [Levin loss](LevinLoss).
#[derive(Config, Debug)]
pub struct LevinLossConfig {
    /// How per-transition losses are combined before weighting. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl LevinLossConfig {
    /// Initialize [Levin loss](LevinLoss).
    pub fn init(&self) -> LevinLoss {
        LevinLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Cross-entropy of the recorded actions multiplied by the number of nodes the
/// search expanded to find the trajectory.
///
/// ```text
/// Loss = stop_gradient(expanded) * CrossEntropy(actions, logits)
/// ```
///
/// Trajectories that were expensive to find pull harder on the policy.
#[derive(Debug, Clone)]
pub struct LevinLoss {
    pub reduction: Reduction,
}

impl Default for LevinLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl LevinLoss {
    pub(crate) const NAME: &'static str = "LevinLoss";

    /// Create a new Levin loss with default configuration.
    pub fn new() -> Self {
        LevinLossConfig::new().init()
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
        let multiplier = levin_multiplier(trajectory.expanded())?;

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
