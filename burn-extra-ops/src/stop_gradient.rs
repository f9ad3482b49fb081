//! # Stop-Gradient Scaling
//!
//! Reweighting a loss by a statistic that was derived from data (search effort,
//! probability mass) must scale the loss without the weight itself taking part in
//! backpropagation. Every such weight goes through [`detached_constant`], which
//! builds the weight as a tensor and detaches it from the autodiff graph before it
//! touches the loss.

use burn::{prelude::*, tensor::TensorData};

/// Builds a single-element constant tensor that is detached from the autodiff graph.
pub fn detached_constant<B: Backend>(value: f64, device: &B::Device) -> Tensor<B, 1> {
    Tensor::<B, 1>::from_data(TensorData::from([value]), device).detach()
}

/// Scaling by a gradient-constant factor.
pub trait StopGradient {
    /// Multiplies by `factor`, treating the factor as a constant for backpropagation.
    fn scale_detached(self, factor: f64) -> Self;
}

impl<B: Backend, const D: usize> StopGradient for Tensor<B, D> {
    fn scale_detached(self, factor: f64) -> Self {
        let factor = detached_constant::<B>(factor, &self.device());
        self * factor.reshape([1_usize; D])
    }
}
