//! Cost-to-go regression.

use burn::{nn::loss::Reduction, prelude::*};

use super::{check_cost_targets, regression_term, LossTerms};
use crate::{
    error::LevinLossResult,
    model::TrajectoryModel,
    trajectory::{SearchState, Trajectory},
};

/// Configuration for creating an [Mse loss](MseLoss).
#[derive(Config, Debug)]
pub struct MseLossConfig {
    /// How per-state squared errors are combined. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl MseLossConfig {
    /// Initialize [Mse loss](MseLoss).
    pub fn init(&self) -> MseLoss {
        MseLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Mean-squared error between the model's cost-to-go estimates and the
/// trajectory's recorded solution costs. Actions are not scored.
#[derive(Debug, Clone)]
pub struct MseLoss {
    pub reduction: Reduction,
}

impl Default for MseLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl MseLoss {
    pub(crate) const NAME: &'static str = "MSELoss";

    /// Create a new MSE loss with default configuration.
    pub fn new() -> Self {
        MseLossConfig::new().init()
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
        check_cost_targets(trajectory)?;

        let images = trajectory.image_batch::<B>(&model.device())?;
        let cost = model.forward_states(images).into_cost(Self::NAME)?;
        let regression = regression_term(cost, trajectory, &self.reduction)?;

        Ok(LossTerms::regression(regression))
    }

    /// Compute the loss.
    ///
    /// # Shapes
    ///
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
