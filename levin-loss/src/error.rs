use thiserror::Error;

/// The error type for loss computation.
///
/// Every variant describes a malformed trajectory, model, or configuration. None of
/// them is recovered from inside this crate; the training loop decides whether to
/// skip the trajectory or abort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LevinLossError {
    /// Sequence lengths or tensor shapes that must agree do not.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which pairing was checked.
        context: String,
        /// The expected length or shape.
        expected: String,
        /// The length or shape that was found.
        actual: String,
    },

    /// A logarithm or division would be taken of an invalid operand.
    #[error("Numeric domain error in {operation}: invalid operand {value}")]
    NumericDomain {
        /// The operation that was about to run.
        operation: String,
        /// The offending operand.
        value: f64,
    },

    /// The model's output arity or the selected strategy is not usable.
    #[error("Invalid loss configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Trajectory statistics violate their documented ranges.
    #[error("Invalid trajectory: {reason}")]
    InvalidTrajectory {
        /// The reason why the trajectory is invalid.
        reason: String,
    },

    /// A recorded action does not index into the model's action space.
    #[error("Action {action} is out of range for a model with {number_of_actions} actions")]
    ActionOutOfRange {
        /// The recorded action index.
        action: usize,
        /// The model's number of discrete actions.
        number_of_actions: usize,
    },
}

impl LevinLossError {
    pub(crate) fn shape_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn numeric_domain(operation: impl Into<String>, value: f64) -> Self {
        Self::NumericDomain {
            operation: operation.into(),
            value,
        }
    }
}

/// A specialized `Result` type for loss computation.
pub type LevinLossResult<T> = Result<T, LevinLossError>;
