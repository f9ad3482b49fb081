//! Levin-weighted cross-entropy plus cost-to-go regression.

use burn::{nn::loss::Reduction, prelude::*};

use super::{check_cost_targets, classification_term, regression_term, LossTerms};
use crate::{
    error::LevinLossResult,
    model::TrajectoryModel,
    numeric::levin_multiplier,
    trajectory::{SearchState, Trajectory},
};

/// Configuration for creating a [LevinMse loss](LevinMseLoss).
#[derive(Config, Debug)]
pub struct LevinMseLossConfig {
    /// Reduction applied to both terms. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl LevinMseLossConfig {
    /// Initialize [LevinMse loss](LevinMseLoss).
    pub fn init(&self) -> LevinMseLoss {
        LevinMseLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Expansion-weighted action cross-entropy plus unweighted cost-to-go regression.
///
/// ```text
/// Loss = stop_gradient(expanded) * CrossEntropy(actions, logits) + MSE(solution_costs, cost)
/// ```
#[derive(Debug, Clone)]
pub struct LevinMseLoss {
    pub reduction: Reduction,
}

impl Default for LevinMseLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl LevinMseLoss {
    pub(crate) const NAME: &'static str = "LevinMSELoss";

    /// Create a new Levin plus MSE loss with default configuration.
    pub fn new() -> Self {
        LevinMseLossConfig::new().init()
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
        check_cost_targets(trajectory)?;
        let multiplier = levin_multiplier(trajectory.expanded())?;

        let images = trajectory.image_batch::<B>(&model.device())?;
        let (logits, cost) = model
            .forward_states(images)
            .into_logits_and_cost(Self::NAME)?;
        let classification = classification_term(
            logits,
            trajectory,
            model.number_of_actions(),
            &self.reduction,
        )?;
        let regression = regression_term(cost, trajectory, &self.reduction)?;

        tracing::debug!(
            loss = Self::NAME,
            multiplier,
            "weighting classification term"
        );
        Ok(LossTerms::classification_and_regression(
            classification,
            Some(multiplier),
            regression,
        ))
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
