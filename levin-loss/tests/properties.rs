//! End-to-end properties of the trajectory losses.

use burn::{
    backend::{Autodiff, NdArray},
    prelude::*,
    tensor::{ElementConversion, TensorData, Tolerance},
};
use levin_loss::{
    CrossEntropyLoss, CrossEntropyMseLoss, ImageState, ImprovedLevinLoss, LevinLoss, LevinLossError,
    LevinMseLoss, LossConfig, LossKind, ModelOutput, MseLoss, Trajectory, TrajectoryModel,
    TrajectoryRecord,
};

type TestBackend = NdArray<f32>;
type TestAutodiffBackend = Autodiff<NdArray<f32>>;

/// Returns preset outputs and counts how often it was run.
struct RecordedModel<B: Backend> {
    number_of_actions: usize,
    output: ModelOutput<B>,
    calls: std::cell::Cell<usize>,
}

impl<B: Backend> RecordedModel<B> {
    fn new(number_of_actions: usize, output: ModelOutput<B>) -> Self {
        Self {
            number_of_actions,
            output,
            calls: std::cell::Cell::new(0),
        }
    }
}

impl<B: Backend> TrajectoryModel<B> for RecordedModel<B> {
    fn number_of_actions(&self) -> usize {
        self.number_of_actions
    }

    fn device(&self) -> B::Device {
        Default::default()
    }

    fn forward_states(&self, images: Tensor<B, 4>) -> ModelOutput<B> {
        self.calls.set(self.calls.get() + 1);
        assert_eq!(images.dims()[1..], [1, 2, 2]);
        self.output.clone()
    }
}

fn tensor2<B: Backend, const N: usize, const A: usize>(values: [[f32; A]; N]) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::from(values), &Default::default())
}

fn states(count: usize) -> Vec<ImageState> {
    (0..count)
        .map(|index| ImageState::new([1, 2, 2], vec![index as f32; 4]).unwrap())
        .collect()
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    tensor.into_scalar().elem::<f64>()
}

const THREE_STATE_LOGITS: [[f32; 2]; 3] = [[1.0, 0.0], [0.0, 2.0], [0.5, 0.5]];

fn three_state_trajectory(expanded: f64) -> Trajectory<ImageState> {
    Trajectory::new(states(3), vec![0, 1, 1], 0.2, expanded, vec![2.0, 1.0, 0.0]).unwrap()
}

fn hand_computed_cross_entropy() -> f64 {
    let first = (1.0 + (-1.0_f64).exp()).ln();
    let second = (1.0 + (-2.0_f64).exp()).ln();
    let third = 2.0_f64.ln();
    (first + second + third) / 3.0
}

#[test]
fn cross_entropy_matches_hand_computed_reference() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2(THREE_STATE_LOGITS),
        },
    );
    let trajectory = three_state_trajectory(25.0);

    let loss = scalar(
        CrossEntropyLoss::new()
            .compute_loss(&trajectory, &model)
            .unwrap(),
    );

    assert!((loss - hand_computed_cross_entropy()).abs() < 1e-6);
    assert!((loss - 0.377_779).abs() < 1e-5);
    assert_eq!(model.calls.get(), 1);
}

#[test]
fn levin_equals_expanded_times_cross_entropy() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2(THREE_STATE_LOGITS),
        },
    );

    for expanded in [1.0, 3.0, 250.0] {
        let trajectory = three_state_trajectory(expanded);
        let cross_entropy = scalar(
            CrossEntropyLoss::new()
                .compute_loss(&trajectory, &model)
                .unwrap(),
        );
        let levin = scalar(LevinLoss::new().compute_loss(&trajectory, &model).unwrap());

        assert!((levin - expanded * cross_entropy).abs() < 1e-4 * expanded);
    }
}

#[test]
fn improved_levin_is_zero_for_certain_solutions() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2(THREE_STATE_LOGITS),
        },
    );

    for expanded in [0.0, 1.0, 10.0, 10_000.0] {
        let trajectory =
            Trajectory::new(states(3), vec![0, 1, 1], 1.0, expanded, vec![]).unwrap();
        let terms = ImprovedLevinLoss::new()
            .compute_terms(&trajectory, &model)
            .unwrap();

        assert_eq!(terms.multiplier, 0.0);
        assert_eq!(scalar(terms.total), 0.0);
    }
}

#[test]
fn improved_levin_clamps_negative_exponent() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2(THREE_STATE_LOGITS),
        },
    );
    // d = 4 so (d + 1) / expanded = 5 / 2; with pi < 1 the raw exponent is negative.
    let trajectory = Trajectory::new(states(3), vec![0, 1, 1], 0.9, 2.0, vec![]).unwrap();
    assert!((5.0_f64 / 2.0).ln() / 0.9_f64.ln() < 0.0);

    let loss = ImprovedLevinLoss::new()
        .compute_loss(&trajectory, &model)
        .unwrap();

    assert_eq!(scalar(loss), 0.0);
}

#[test]
fn improved_levin_zero_expansions_short_circuit() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2(THREE_STATE_LOGITS),
        },
    );
    let trajectory = Trajectory::new(states(3), vec![0, 1, 1], 0.3, 0.0, vec![]).unwrap();

    let loss = ImprovedLevinLoss::new()
        .compute_loss(&trajectory, &model)
        .unwrap();

    assert_eq!(scalar(loss), 0.0);
}

#[test]
fn mse_matches_hand_computed_reference() {
    let model = RecordedModel::<TestBackend>::new(
        3,
        ModelOutput::Heuristic {
            cost: tensor2([[1.0], [2.0], [3.0], [4.0]]),
        },
    );
    let trajectory =
        Trajectory::new(states(4), vec![0, 1, 2], 0.5, 8.0, vec![0.0, 2.0, 5.0, 3.0]).unwrap();

    let loss = scalar(MseLoss::new().compute_loss(&trajectory, &model).unwrap());

    // Errors 1, 0, -2, 1 (squared 1, 0, 4, 1) averaged over four states.
    assert!((loss - 1.5).abs() < 1e-6);
}

#[test]
fn levin_mse_decomposes_into_weighted_classification_and_regression() {
    let expanded = 12.0;
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::PolicyHeuristic {
            logits: tensor2(THREE_STATE_LOGITS),
            cost: tensor2([[1.5], [1.0], [0.5]]),
        },
    );
    let trajectory = three_state_trajectory(expanded);

    let classification = scalar(
        CrossEntropyLoss::new()
            .compute_loss(&trajectory, &model)
            .unwrap(),
    );
    let regression = scalar(MseLoss::new().compute_loss(&trajectory, &model).unwrap());
    let combined = LevinMseLoss::new()
        .compute_terms(&trajectory, &model)
        .unwrap();
    let summary = combined.summary();

    assert!((regression - 1.0 / 6.0).abs() < 1e-6);
    let reported_classification = summary.classification.unwrap();
    assert!((reported_classification - classification).abs() < 1e-6);
    assert!((summary.regression.unwrap() - regression).abs() < 1e-6);
    assert_eq!(summary.multiplier, expanded);
    let expected_total = expanded * classification + regression;
    assert!((summary.total - expected_total).abs() < 1e-4);

    let unweighted = scalar(
        CrossEntropyMseLoss::new()
            .compute_loss(&trajectory, &model)
            .unwrap(),
    );
    assert!((unweighted - (classification + regression)).abs() < 1e-5);
}

#[test]
fn every_strategy_is_deterministic() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::PolicyHeuristic {
            logits: tensor2(THREE_STATE_LOGITS),
            cost: tensor2([[1.5], [1.0], [0.5]]),
        },
    );
    let trajectory = three_state_trajectory(40.0);

    for kind in LossKind::ALL {
        let strategy = LossConfig::new().with_kind(kind).init();
        let first = strategy.compute_loss(&trajectory, &model).unwrap();
        let second = strategy.compute_loss(&trajectory, &model).unwrap();

        first.into_data().assert_eq(&second.into_data(), true);
    }
    assert_eq!(model.calls.get(), 2 * LossKind::ALL.len());
}

#[test]
fn boundary_inputs_do_not_raise() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2([[0.25, -0.25]]),
        },
    );
    let trajectory = Trajectory::new(states(1), vec![1], 1.0 - 1e-9, 1.0, vec![]).unwrap();

    let cross_entropy = CrossEntropyLoss::new().compute_loss(&trajectory, &model);
    let levin = LevinLoss::new().compute_loss(&trajectory, &model);
    let improved = ImprovedLevinLoss::new().compute_loss(&trajectory, &model);

    assert!(scalar(cross_entropy.unwrap()).is_finite());
    assert!(scalar(levin.unwrap()).is_finite());
    assert!(scalar(improved.unwrap()).is_finite());
}

#[test]
fn shape_errors_surface_before_the_forward_pass() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::PolicyHeuristic {
            logits: tensor2(THREE_STATE_LOGITS),
            cost: tensor2([[1.5], [1.0], [0.5]]),
        },
    );

    let too_few_actions = Trajectory::new(states(3), vec![0], 0.5, 3.0, vec![]).unwrap();
    let result = LevinLoss::new().compute_loss(&too_few_actions, &model);
    assert!(matches!(result, Err(LevinLossError::ShapeMismatch { .. })));

    let missing_costs = Trajectory::new(states(3), vec![0, 1, 1], 0.5, 3.0, vec![1.0]).unwrap();
    let result = LevinMseLoss::new().compute_loss(&missing_costs, &model);
    assert!(matches!(result, Err(LevinLossError::ShapeMismatch { .. })));

    assert_eq!(model.calls.get(), 0);
}

#[test]
fn strategy_rejects_unsupported_model_arity() {
    let model = RecordedModel::<TestBackend>::new(
        2,
        ModelOutput::Policy {
            logits: tensor2(THREE_STATE_LOGITS),
        },
    );
    let trajectory = three_state_trajectory(4.0);

    for kind in [LossKind::CrossEntropyMse, LossKind::LevinMse, LossKind::Mse] {
        let result = LossConfig::new()
            .with_kind(kind)
            .init()
            .compute_loss(&trajectory, &model);
        assert!(matches!(
            result,
            Err(LevinLossError::InvalidConfiguration { .. })
        ));
    }
}

#[test]
fn reweighting_scales_gradients_without_adding_any() {
    let device = Default::default();
    let logits = Tensor::<TestAutodiffBackend, 2>::from_data(
        TensorData::from(THREE_STATE_LOGITS),
        &device,
    )
    .require_grad();
    let model = RecordedModel::new(
        2,
        ModelOutput::Policy {
            logits: logits.clone(),
        },
    );
    let expanded = 7.0;
    let trajectory = three_state_trajectory(expanded);

    let plain = CrossEntropyLoss::new()
        .compute_loss(&trajectory, &model)
        .unwrap();
    let plain_grad = logits.grad(&plain.backward()).unwrap();

    let levin = LevinLoss::new().compute_loss(&trajectory, &model).unwrap();
    let levin_grad = logits.grad(&levin.backward()).unwrap();

    levin_grad.into_data().assert_approx_eq::<f32>(
        &(plain_grad.clone() * expanded as f32).into_data(),
        Tolerance::default(),
    );

    // A zero multiplier leaves no gradient at all.
    let certain = Trajectory::new(states(3), vec![0, 1, 1], 1.0, expanded, vec![]).unwrap();
    let improved = ImprovedLevinLoss::new()
        .compute_loss(&certain, &model)
        .unwrap();
    let improved_grad = logits.grad(&improved.backward()).unwrap();
    improved_grad.into_data().assert_approx_eq::<f32>(
        &plain_grad.zeros_like().into_data(),
        Tolerance::default(),
    );
}

#[test]
fn levin_mse_scales_only_the_policy_gradient() {
    let device = Default::default();
    let logits = Tensor::<TestAutodiffBackend, 2>::from_data(
        TensorData::from(THREE_STATE_LOGITS),
        &device,
    )
    .require_grad();
    let cost = Tensor::<TestAutodiffBackend, 2>::from_data(
        TensorData::from([[1.5_f32], [1.0], [0.5]]),
        &device,
    )
    .require_grad();
    let model = RecordedModel::new(
        2,
        ModelOutput::PolicyHeuristic {
            logits: logits.clone(),
            cost: cost.clone(),
        },
    );
    let expanded = 9.0;
    let trajectory = three_state_trajectory(expanded);

    let plain = CrossEntropyLoss::new()
        .compute_loss(&trajectory, &model)
        .unwrap();
    let plain_logits_grad = logits.grad(&plain.backward()).unwrap();

    let regression = MseLoss::new().compute_loss(&trajectory, &model).unwrap();
    let regression_cost_grad = cost.grad(&regression.backward()).unwrap();

    let combined = LevinMseLoss::new()
        .compute_loss(&trajectory, &model)
        .unwrap();
    let grads = combined.backward();
    let combined_logits_grad = logits.grad(&grads).unwrap();
    let combined_cost_grad = cost.grad(&grads).unwrap();

    combined_logits_grad.into_data().assert_approx_eq::<f32>(
        &(plain_logits_grad * expanded as f32).into_data(),
        Tolerance::default(),
    );
    combined_cost_grad
        .into_data()
        .assert_approx_eq::<f32>(&regression_cost_grad.into_data(), Tolerance::default());
}

#[test]
fn trajectories_load_from_json_records() {
    let json = r#"{
        "states": [
            {"shape": [1, 2, 2], "data": [0.0, 0.0, 0.0, 0.0]},
            {"shape": [1, 2, 2], "data": [1.0, 1.0, 1.0, 1.0]},
            {"shape": [1, 2, 2], "data": [2.0, 2.0, 2.0, 2.0]}
        ],
        "actions": [0, 1, 1],
        "solution_pi": 0.2,
        "expanded": 25.0,
        "solution_costs": [2.0, 1.0, 0.0]
    }"#;
    let record: TrajectoryRecord<ImageState> = serde_json::from_str(json).unwrap();
    let trajectory = record.into_trajectory().unwrap();

    assert_eq!(trajectory, three_state_trajectory(25.0));
}
