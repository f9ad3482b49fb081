//! Loss selection.
//!
//! The set of losses is closed: [`LossKind`] names one, [`LossConfig`] adds the
//! reduction policy, and [`LossStrategy`] is the initialized loss, dispatched by
//! exhaustive match.

use core::str::FromStr;

use burn::{nn::loss::Reduction, prelude::*};

use crate::{
    error::{LevinLossError, LevinLossResult},
    losses::{
        CrossEntropyLoss, CrossEntropyMseLoss, ImprovedLevinLoss, LevinLoss, LevinMseLoss,
        LossTerms, MseLoss,
    },
    model::TrajectoryModel,
    trajectory::{SearchState, Trajectory},
};

#[derive(Config, Debug, Copy, PartialEq, Eq)]
pub enum LossKind {
    CrossEntropy,
    Levin,
    ImprovedLevin,
    CrossEntropyMse,
    LevinMse,
    Mse,
}

impl LossKind {
    pub const ALL: [Self; 6] = [
        Self::CrossEntropy,
        Self::Levin,
        Self::ImprovedLevin,
        Self::CrossEntropyMse,
        Self::LevinMse,
        Self::Mse,
    ];

    /// Class-style name of the loss, as used in experiment configurations.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CrossEntropy => CrossEntropyLoss::NAME,
            Self::Levin => LevinLoss::NAME,
            Self::ImprovedLevin => ImprovedLevinLoss::NAME,
            Self::CrossEntropyMse => CrossEntropyMseLoss::NAME,
            Self::LevinMse => LevinMseLoss::NAME,
            Self::Mse => MseLoss::NAME,
        }
    }

    const fn alias(&self) -> &'static str {
        match self {
            Self::CrossEntropy => "cross_entropy",
            Self::Levin => "levin",
            Self::ImprovedLevin => "improved_levin",
            Self::CrossEntropyMse => "cross_entropy_mse",
            Self::LevinMse => "levin_mse",
            Self::Mse => "mse",
        }
    }

    /// Whether the model must produce action logits.
    pub const fn requires_policy_head(&self) -> bool {
        !matches!(self, Self::Mse)
    }

    /// Whether the model must produce cost-to-go estimates.
    pub const fn requires_cost_head(&self) -> bool {
        matches!(self, Self::CrossEntropyMse | Self::LevinMse | Self::Mse)
    }
}

impl FromStr for LossKind {
    type Err = LevinLossError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s || kind.alias() == s)
            .ok_or_else(|| LevinLossError::InvalidConfiguration {
                reason: format!("unknown loss function: {s}"),
            })
    }
}

/// Configuration selecting and parameterizing one loss.
#[derive(Config, Debug)]
pub struct LossConfig {
    #[config(default = "LossKind::CrossEntropy")]
    pub kind: LossKind,
    /// Reduction over transitions and states. Default: `Mean`
    #[config(default = "Reduction::Mean")]
    pub reduction: Reduction,
}

impl LossConfig {
    /// Initialize the selected [`LossStrategy`].
    pub fn init(&self) -> LossStrategy {
        let reduction = self.reduction.clone();
        match self.kind {
            LossKind::CrossEntropy => LossStrategy::CrossEntropy(CrossEntropyLoss { reduction }),
            LossKind::Levin => LossStrategy::Levin(LevinLoss { reduction }),
            LossKind::ImprovedLevin => LossStrategy::ImprovedLevin(ImprovedLevinLoss { reduction }),
            LossKind::CrossEntropyMse => {
                LossStrategy::CrossEntropyMse(CrossEntropyMseLoss { reduction })
            }
            LossKind::LevinMse => LossStrategy::LevinMse(LevinMseLoss { reduction }),
            LossKind::Mse => LossStrategy::Mse(MseLoss { reduction }),
        }
    }
}

/// An initialized loss.
#[derive(Debug, Clone)]
pub enum LossStrategy {
    CrossEntropy(CrossEntropyLoss),
    Levin(LevinLoss),
    ImprovedLevin(ImprovedLevinLoss),
    CrossEntropyMse(CrossEntropyMseLoss),
    LevinMse(LevinMseLoss),
    Mse(MseLoss),
}

impl LossStrategy {
    pub const fn kind(&self) -> LossKind {
        match self {
            Self::CrossEntropy(_) => LossKind::CrossEntropy,
            Self::Levin(_) => LossKind::Levin,
            Self::ImprovedLevin(_) => LossKind::ImprovedLevin,
            Self::CrossEntropyMse(_) => LossKind::CrossEntropyMse,
            Self::LevinMse(_) => LossKind::LevinMse,
            Self::Mse(_) => LossKind::Mse,
        }
    }

    pub const fn requires_policy_head(&self) -> bool {
        self.kind().requires_policy_head()
    }

    pub const fn requires_cost_head(&self) -> bool {
        self.kind().requires_cost_head()
    }

    /// Compute the selected loss and its parts.
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
        match self {
            Self::CrossEntropy(loss) => loss.compute_terms(trajectory, model),
            Self::Levin(loss) => loss.compute_terms(trajectory, model),
            Self::ImprovedLevin(loss) => loss.compute_terms(trajectory, model),
            Self::CrossEntropyMse(loss) => loss.compute_terms(trajectory, model),
            Self::LevinMse(loss) => loss.compute_terms(trajectory, model),
            Self::Mse(loss) => loss.compute_terms(trajectory, model),
        }
    }

    /// Compute the selected loss for one trajectory.
    ///
    /// Runs exactly one forward pass of `model`. The returned scalar carries the
    /// autodiff graph of that pass when `B` is an autodiff backend.
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

impl From<LossKind> for LossStrategy {
    fn from(kind: LossKind) -> Self {
        LossConfig::new().with_kind(kind).init()
    }
}
