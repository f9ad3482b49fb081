//! Plain cross-entropy imitation of the recorded actions.

use burn::{nn::loss::Reduction, prelude::*};

use super::{classification_term, LossTerms};
use crate::{
    error::LevinLossResult,
    model::TrajectoryModel,
    trajectory::{SearchState, Trajectory},
};

/// Configuration for creating a [CrossEntropy loss](CrossEntropyLoss).
#[derive(Config, Debug)]
pub struct CrossEntropyLossConfig {
    /// How per-transition losses are combined. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl CrossEntropyLossConfig {
    /// Initialize [CrossEntropy loss](CrossEntropyLoss).
    pub fn init(&self) -> CrossEntropyLoss {
        CrossEntropyLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Cross-entropy between the one-hot recorded actions and the model's action
/// logits, with no reweighting.
#[derive(Debug, Clone)]
pub struct CrossEntropyLoss {
    pub reduction: Reduction,
}

impl Default for CrossEntropyLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossEntropyLoss {
    pub(crate) const NAME: &'static str = "CrossEntropyLoss";

    /// Create a new cross-entropy loss with default configuration.
    pub fn new() -> Self {
        CrossEntropyLossConfig::new().init()
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
        let images = trajectory.image_batch::<B>(&model.device())?;
        let logits = model.forward_states(images).into_logits(Self::NAME)?;
        let classification = classification_term(
            logits,
            trajectory,
            model.number_of_actions(),
            &self.reduction,
        )?;

        Ok(LossTerms::classification(classification, None))
    }

    /// Compute the loss.
    ///
    /// # Shapes
    ///
    /// - model logits: `[states, actions]`
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
