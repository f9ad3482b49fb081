//! Cross-entropy plus cost-to-go regression for two-headed models.

use burn::{nn::loss::Reduction, prelude::*};

use super::{check_cost_targets, classification_term, regression_term, LossTerms};
use crate::{
    error::LevinLossResult,
    model::TrajectoryModel,
    trajectory::{SearchState, Trajectory},
};

/// Configuration for creating a [CrossEntropyMse loss](CrossEntropyMseLoss).
#[derive(Config, Debug)]
pub struct CrossEntropyMseLossConfig {
    /// Reduction applied to both terms. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl CrossEntropyMseLossConfig {
    /// Initialize [CrossEntropyMse loss](CrossEntropyMseLoss).
    pub fn init(&self) -> CrossEntropyMseLoss {
        CrossEntropyMseLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Unweighted sum of action cross-entropy and cost-to-go mean-squared error.
///
/// ```text
/// Loss = CrossEntropy(actions, logits) + MSE(solution_costs, cost)
/// ```
#[derive(Debug, Clone)]
pub struct CrossEntropyMseLoss {
    pub reduction: Reduction,
}

impl Default for CrossEntropyMseLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossEntropyMseLoss {
    pub(crate) const NAME: &'static str = "CrossEntropyMSELoss";

    /// Create a new cross-entropy plus MSE loss with default configuration.
    pub fn new() -> Self {
        CrossEntropyMseLossConfig::new().init()
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

        Ok(LossTerms::classification_and_regression(
            classification,
            None,
            regression,
        ))
    }

    /// Compute the loss.
    ///
    /// # Shapes
    ///
    /// - model logits: `[states, actions]`
    /// - model cost: `[states, 1]`
    /// - output: `[1]`
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
