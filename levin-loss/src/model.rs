//! The model seam: what the losses need from a trainable network.

use burn::prelude::*;

use crate::error::{LevinLossError, LevinLossResult};

/// Outputs of one forward pass over a batch of states.
///
/// The variant is the model's output arity; each loss accepts only the arities it
/// can score.
#[derive(Debug, Clone)]
pub enum ModelOutput<B: Backend> {
    /// Action logits only, shaped `[states, actions]`.
    Policy { logits: Tensor<B, 2> },
    /// Cost-to-go estimates only, shaped `[states, 1]`.
    Heuristic { cost: Tensor<B, 2> },
    /// Both heads.
    PolicyHeuristic {
        logits: Tensor<B, 2>,
        cost: Tensor<B, 2>,
    },
}

impl<B: Backend> ModelOutput<B> {
    /// Number of output tensors.
    pub const fn arity(&self) -> usize {
        match self {
            Self::Policy { .. } | Self::Heuristic { .. } => 1,
            Self::PolicyHeuristic { .. } => 2,
        }
    }

    const fn describe(&self) -> &'static str {
        match self {
            Self::Policy { .. } => "policy logits only",
            Self::Heuristic { .. } => "cost estimates only",
            Self::PolicyHeuristic { .. } => "policy logits and cost estimates",
        }
    }

    pub(crate) fn into_logits(self, loss: &str) -> LevinLossResult<Tensor<B, 2>> {
        match self {
            Self::Policy { logits } | Self::PolicyHeuristic { logits, .. } => Ok(logits),
            other => Err(LevinLossError::InvalidConfiguration {
                reason: format!(
                    "{loss} needs action logits, model produced {}",
                    other.describe()
                ),
            }),
        }
    }

    pub(crate) fn into_cost(self, loss: &str) -> LevinLossResult<Tensor<B, 2>> {
        match self {
            Self::Heuristic { cost } | Self::PolicyHeuristic { cost, .. } => Ok(cost),
            other => Err(LevinLossError::InvalidConfiguration {
                reason: format!(
                    "{loss} needs cost estimates, model produced {}",
                    other.describe()
                ),
            }),
        }
    }

    pub(crate) fn into_logits_and_cost(
        self,
        loss: &str,
    ) -> LevinLossResult<(Tensor<B, 2>, Tensor<B, 2>)> {
        match self {
            Self::PolicyHeuristic { logits, cost } => Ok((logits, cost)),
            other => Err(LevinLossError::InvalidConfiguration {
                reason: format!(
                    "{loss} needs a two-headed model, model produced {}",
                    other.describe()
                ),
            }),
        }
    }
}

/// A trainable model scored by the losses.
///
/// Implementations run the forward pass with gradient tracking as configured by
/// their backend; the losses call [`forward_states`](Self::forward_states) exactly
/// once per trajectory.
pub trait TrajectoryModel<B: Backend> {
    /// Size of the discrete action space.
    fn number_of_actions(&self) -> usize;

    /// Device the model's parameters live on. State batches are built here.
    fn device(&self) -> B::Device;

    /// Forward pass over `[states, channels, height, width]`.
    fn forward_states(&self, images: Tensor<B, 4>) -> ModelOutput<B>;
}
