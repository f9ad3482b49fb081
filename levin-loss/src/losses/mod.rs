//! Imitation losses over search trajectories.
//!
//! Each loss scores one [`Trajectory`] against one forward pass of a
//! [`TrajectoryModel`]:
//!
//! - [`CrossEntropyLoss`]: cross-entropy of the recorded actions
//! - [`LevinLoss`]: cross-entropy scaled by the search's expansion count
//! - [`ImprovedLevinLoss`]: cross-entropy scaled by `expanded * a`, with `a` derived
//!   from path depth, expansions and solution probability
//! - [`CrossEntropyMseLoss`]: cross-entropy plus cost-to-go regression
//! - [`LevinMseLoss`]: Levin-scaled cross-entropy plus cost-to-go regression
//! - [`MseLoss`]: cost-to-go regression only
//!
//! Reweighting multipliers are applied through a detached constant, so they scale
//! the gradient of the classification term but receive none themselves.

mod cross_entropy;
mod cross_entropy_mse;
mod improved_levin;
mod levin;
mod levin_mse;
mod mse;

pub use cross_entropy::{CrossEntropyLoss, CrossEntropyLossConfig};
pub use cross_entropy_mse::{CrossEntropyMseLoss, CrossEntropyMseLossConfig};
pub use improved_levin::{ImprovedLevinLoss, ImprovedLevinLossConfig};
pub use levin::{LevinLoss, LevinLossConfig};
pub use levin_mse::{LevinMseLoss, LevinMseLossConfig};
pub use mse::{MseLoss, MseLossConfig};

use burn::{
    nn::loss::{CrossEntropyLossConfig as BurnCrossEntropyLossConfig, MseLoss as MeanSquaredError, Reduction},
    prelude::*,
    tensor::{ElementConversion, TensorData},
};
use burn_extra_ops::StopGradient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{LevinLossError, LevinLossResult},
    trajectory::Trajectory,
};

/// The parts a loss value was assembled from.
///
/// `total` is what the optimizer differentiates. `classification` and `regression`
/// are the unweighted terms; `multiplier` is the detached factor applied to the
/// classification term (`1.0` for unweighted losses).
#[derive(Debug, Clone)]
pub struct LossTerms<B: Backend> {
    /// Reduced cross-entropy of the recorded actions, before reweighting.
    pub classification: Option<Tensor<B, 1>>,
    /// Detached factor applied to the classification term.
    pub multiplier: f64,
    /// Reduced mean-squared error of the cost-to-go estimates.
    pub regression: Option<Tensor<B, 1>>,
    /// The differentiable loss value.
    pub total: Tensor<B, 1>,
}

impl<B: Backend> LossTerms<B> {
    pub(crate) fn classification(term: Tensor<B, 1>, multiplier: Option<f64>) -> Self {
        let total = weighted(term.clone(), multiplier);
        Self {
            classification: Some(term),
            multiplier: multiplier.unwrap_or(1.0),
            regression: None,
            total,
        }
    }

    pub(crate) fn regression(term: Tensor<B, 1>) -> Self {
        Self {
            classification: None,
            multiplier: 1.0,
            regression: Some(term.clone()),
            total: term,
        }
    }

    pub(crate) fn classification_and_regression(
        classification: Tensor<B, 1>,
        multiplier: Option<f64>,
        regression: Tensor<B, 1>,
    ) -> Self {
        let total = weighted(classification.clone(), multiplier) + regression.clone();
        Self {
            classification: Some(classification),
            multiplier: multiplier.unwrap_or(1.0),
            regression: Some(regression),
            total,
        }
    }

    /// Reads the terms back as plain numbers for logging.
    pub fn summary(&self) -> LossSummary {
        LossSummary {
            classification: self.classification.clone().map(scalar),
            multiplier: self.multiplier,
            regression: self.regression.clone().map(scalar),
            total: scalar(self.total.clone()),
        }
    }
}

/// Host-side snapshot of [`LossTerms`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossSummary {
    /// Unweighted classification term, if the loss has one.
    pub classification: Option<f64>,
    /// Factor applied to the classification term.
    pub multiplier: f64,
    /// Regression term, if the loss has one.
    pub regression: Option<f64>,
    /// Loss value.
    pub total: f64,
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    tensor.into_scalar().elem::<f64>()
}

fn weighted<B: Backend>(term: Tensor<B, 1>, multiplier: Option<f64>) -> Tensor<B, 1> {
    match multiplier {
        Some(factor) => term.scale_detached(factor),
        None => term,
    }
}

/// Checks the trajectory's regression targets before the model is run.
fn check_cost_targets<S>(trajectory: &Trajectory<S>) -> LevinLossResult<()> {
    let states = trajectory.states().len();
    let costs = trajectory.solution_costs().len();
    if costs != states {
        return Err(LevinLossError::shape_mismatch(
            "solution costs versus states",
            states,
            costs,
        ));
    }
    Ok(())
}

/// Cross-entropy between the recorded actions and the model's logits.
///
/// Logits of a trailing goal state are dropped. The per-transition losses are
/// averaged, or summed under [`Reduction::Sum`].
fn classification_term<B: Backend, S>(
    logits: Tensor<B, 2>,
    trajectory: &Trajectory<S>,
    number_of_actions: usize,
    reduction: &Reduction,
) -> LevinLossResult<Tensor<B, 1>> {
    let decisions = trajectory.decision_states()?;
    let [rows, width] = logits.dims();

    if width != number_of_actions {
        return Err(LevinLossError::shape_mismatch(
            "action logit width",
            number_of_actions,
            width,
        ));
    }
    if rows != trajectory.states().len() {
        return Err(LevinLossError::shape_mismatch(
            "action logit rows versus states",
            trajectory.states().len(),
            rows,
        ));
    }
    if let Some(&action) = trajectory
        .actions()
        .iter()
        .find(|&&action| action >= number_of_actions)
    {
        return Err(LevinLossError::ActionOutOfRange {
            action,
            number_of_actions,
        });
    }

    let logits = if rows > decisions {
        logits.slice([0..decisions])
    } else {
        logits
    };
    let device = logits.device();
    let actions = trajectory
        .actions()
        .iter()
        .map(|&action| action as i64)
        .collect::<Vec<_>>();
    let targets = Tensor::<B, 1, Int>::from_data(TensorData::new(actions, [decisions]), &device);

    let mean = BurnCrossEntropyLossConfig::new()
        .init(&device)
        .forward(logits, targets);

    Ok(match reduction {
        Reduction::Mean | Reduction::Auto => mean,
        Reduction::Sum => mean.mul_scalar(decisions as f64),
    })
}

/// Mean-squared error between the model's cost estimates and the recorded costs.
fn regression_term<B: Backend, S>(
    cost: Tensor<B, 2>,
    trajectory: &Trajectory<S>,
    reduction: &Reduction,
) -> LevinLossResult<Tensor<B, 1>> {
    check_cost_targets(trajectory)?;

    let states = trajectory.states().len();
    let dims = cost.dims();
    if dims != [states, 1] {
        return Err(LevinLossError::shape_mismatch(
            "cost estimates",
            format!("{:?}", [states, 1]),
            format!("{dims:?}"),
        ));
    }

    let targets = Tensor::<B, 2>::from_data(
        TensorData::new(trajectory.solution_costs().to_vec(), [states, 1]),
        &cost.device(),
    );

    let loss = MeanSquaredError::new().forward(cost, targets, reduction.clone());
    Ok(loss)
}
