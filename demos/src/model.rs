use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
};
use levin_loss::{ModelOutput, TrajectoryModel};

/// Configuration for [`ProbeNet`].
#[derive(Config, Debug)]
pub struct ProbeNetConfig {
    /// Flattened size of one state image (`channels * height * width`).
    pub input_features: usize,
    pub number_of_actions: usize,
    #[config(default = 32)]
    pub hidden_size: usize,
}

impl ProbeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ProbeNet<B> {
        ProbeNet {
            trunk: LinearConfig::new(self.input_features, self.hidden_size).init(device),
            policy: LinearConfig::new(self.hidden_size, self.number_of_actions).init(device),
            cost: LinearConfig::new(self.hidden_size, 1).init(device),
            number_of_actions: self.number_of_actions,
        }
    }
}

/// Flatten, one hidden layer, then a policy head and a cost-to-go head.
#[derive(Module, Debug)]
pub struct ProbeNet<B: Backend> {
    trunk: Linear<B>,
    policy: Linear<B>,
    cost: Linear<B>,
    number_of_actions: usize,
}

impl<B: Backend> ProbeNet<B> {
    /// # Shapes
    ///
    /// - images: `[batch, channels, height, width]`
    /// - output: (`[batch, actions]`, `[batch, 1]`)
    pub fn forward(&self, images: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let hidden = self.trunk.forward(images.flatten::<2>(1, 3));
        let features = burn::tensor::activation::relu(hidden);
        (
            self.policy.forward(features.clone()),
            self.cost.forward(features),
        )
    }
}

impl<B: Backend> TrajectoryModel<B> for ProbeNet<B> {
    fn number_of_actions(&self) -> usize {
        self.number_of_actions
    }

    fn device(&self) -> B::Device {
        self.trunk.weight.val().device()
    }

    fn forward_states(&self, images: Tensor<B, 4>) -> ModelOutput<B> {
        let (logits, cost) = self.forward(images);
        ModelOutput::PolicyHeuristic { logits, cost }
    }
}
