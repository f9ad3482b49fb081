//! Search trajectories consumed by the losses.
//!
//! A [`Trajectory`] is one solved search episode: the states along the solution
//! path, the action taken from each of them, and the statistics of the search that
//! found it. Trajectories are read-only once built; [`Trajectory::new`] enforces the
//! ranges every loss relies on.

use burn::{prelude::*, tensor::TensorData};
use serde::{Deserialize, Serialize};

use crate::error::{LevinLossError, LevinLossResult};

/// A search state that can be fed to the model.
pub trait SearchState<B: Backend> {
    /// Feature representation of this state, shaped `[channels, height, width]`.
    fn image_representation(&self, device: &B::Device) -> Tensor<B, 3>;
}

/// A state stored as a dense `[channels, height, width]` image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawImageState")]
pub struct ImageState {
    shape: [usize; 3],
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct RawImageState {
    shape: [usize; 3],
    data: Vec<f32>,
}

impl TryFrom<RawImageState> for ImageState {
    type Error = LevinLossError;

    fn try_from(raw: RawImageState) -> Result<Self, Self::Error> {
        Self::new(raw.shape, raw.data)
    }
}

impl ImageState {
    /// Creates an image state from a row-major buffer.
    pub fn new(shape: [usize; 3], data: Vec<f32>) -> LevinLossResult<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(LevinLossError::shape_mismatch(
                format!("image state buffer for shape {shape:?}"),
                expected,
                data.len(),
            ));
        }
        Ok(Self { shape, data })
    }

    pub const fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl<B: Backend> SearchState<B> for ImageState {
    fn image_representation(&self, device: &B::Device) -> Tensor<B, 3> {
        Tensor::from_data(TensorData::new(self.data.clone(), self.shape), device)
    }
}

/// A recorded solution path plus the statistics of the search that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory<S> {
    states: Vec<S>,
    actions: Vec<usize>,
    solution_pi: f64,
    expanded: f64,
    solution_costs: Vec<f64>,
}

impl<S> Trajectory<S> {
    /// Builds a trajectory, validating its statistics.
    ///
    /// # Arguments
    /// * `states` - States along the solution path, at least one
    /// * `actions` - Action index taken from each decision state
    /// * `solution_pi` - Probability mass the policy assigned to the solution path, in `(0, 1]`
    /// * `expanded` - Number of nodes the search expanded, non-normalized, `>= 0`
    /// * `solution_costs` - Cost-to-go target per state, each `>= 0`; may be empty
    ///   when only classification losses will be used
    ///
    /// # Errors
    /// `NumericDomain` for non-finite statistics, `InvalidTrajectory` for values out
    /// of range or an empty state sequence.
    pub fn new(
        states: Vec<S>,
        actions: Vec<usize>,
        solution_pi: f64,
        expanded: f64,
        solution_costs: Vec<f64>,
    ) -> LevinLossResult<Self> {
        if states.is_empty() {
            return Err(LevinLossError::InvalidTrajectory {
                reason: "a trajectory needs at least one state".to_string(),
            });
        }
        if !solution_pi.is_finite() {
            return Err(LevinLossError::numeric_domain("solution_pi", solution_pi));
        }
        if solution_pi <= 0.0 || solution_pi > 1.0 {
            return Err(LevinLossError::InvalidTrajectory {
                reason: format!("solution_pi must lie in (0, 1], got {solution_pi}"),
            });
        }
        if !expanded.is_finite() {
            return Err(LevinLossError::numeric_domain("expanded", expanded));
        }
        if expanded < 0.0 {
            return Err(LevinLossError::InvalidTrajectory {
                reason: format!("expanded must be non-negative, got {expanded}"),
            });
        }
        for (index, &cost) in solution_costs.iter().enumerate() {
            if !cost.is_finite() {
                return Err(LevinLossError::numeric_domain(
                    format!("solution_costs[{index}]"),
                    cost,
                ));
            }
            if cost < 0.0 {
                return Err(LevinLossError::InvalidTrajectory {
                    reason: format!("solution_costs[{index}] must be non-negative, got {cost}"),
                });
            }
        }

        Ok(Self {
            states,
            actions,
            solution_pi,
            expanded,
            solution_costs,
        })
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    pub const fn solution_pi(&self) -> f64 {
        self.solution_pi
    }

    /// Number of nodes expanded by the search, not normalized.
    pub const fn expanded(&self) -> f64 {
        self.expanded
    }

    pub fn solution_costs(&self) -> &[f64] {
        &self.solution_costs
    }

    /// Depth of the solution path, counting the goal: `actions.len() + 1`.
    pub fn path_depth(&self) -> usize {
        self.actions.len() + 1
    }

    /// Number of states whose action was recorded.
    ///
    /// A trajectory either records one action per state or carries a trailing goal
    /// state with no action; anything else is a shape error.
    pub(crate) fn decision_states(&self) -> LevinLossResult<usize> {
        let states = self.states.len();
        let actions = self.actions.len();
        if actions == 0 {
            return Err(LevinLossError::shape_mismatch(
                "recorded actions",
                "at least one action",
                0,
            ));
        }
        if states != actions && states != actions + 1 {
            return Err(LevinLossError::shape_mismatch(
                "states versus actions",
                format!("{actions} or {} states", actions + 1),
                states,
            ));
        }
        Ok(actions)
    }

    /// Stacks the state representations into a `[states, channels, height, width]` batch.
    pub(crate) fn image_batch<B: Backend>(
        &self,
        device: &B::Device,
    ) -> LevinLossResult<Tensor<B, 4>>
    where
        S: SearchState<B>,
    {
        let images: Vec<Tensor<B, 3>> = self
            .states
            .iter()
            .map(|state| state.image_representation(device))
            .collect();

        let first = images[0].dims();
        if let Some((index, dims)) = images
            .iter()
            .map(|image| image.dims())
            .enumerate()
            .find(|(_, dims)| *dims != first)
        {
            return Err(LevinLossError::shape_mismatch(
                format!("image representation of state {index}"),
                format!("{first:?}"),
                format!("{dims:?}"),
            ));
        }

        Ok(Tensor::stack(images, 0))
    }
}

impl<S: Clone> Trajectory<S> {
    /// Serializable snapshot of this trajectory.
    pub fn to_record(&self) -> TrajectoryRecord<S> {
        TrajectoryRecord {
            states: self.states.clone(),
            actions: self.actions.clone(),
            solution_pi: self.solution_pi,
            expanded: self.expanded,
            solution_costs: self.solution_costs.clone(),
        }
    }
}

/// On-disk form of a [`Trajectory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord<S> {
    pub states: Vec<S>,
    pub actions: Vec<usize>,
    pub solution_pi: f64,
    pub expanded: f64,
    #[serde(default)]
    pub solution_costs: Vec<f64>,
}

impl<S> TrajectoryRecord<S> {
    /// Validates the record into a [`Trajectory`].
    pub fn into_trajectory(self) -> LevinLossResult<Trajectory<S>> {
        Trajectory::new(
            self.states,
            self.actions,
            self.solution_pi,
            self.expanded,
            self.solution_costs,
        )
    }
}
