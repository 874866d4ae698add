use super::*;
use crate::math::add_bias;
use approx::assert_abs_diff_eq;

fn two_patterns() -> Vec<Vec<f64>> {
    vec![vec![1.0, 1.0, -1.0, -1.0], vec![-1.0, -1.0, 1.0, 1.0]]
}

struct RecordingMonitor {
    ticks: Vec<(usize, usize)>,
    finished: bool,
}

impl ProgressMonitor for RecordingMonitor {
    fn tick(&mut self, step: usize, total: usize) {
        self.ticks.push((step, total));
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn test_random_stack_shapes() {
    let mut rng = StdRng::seed_from_u64(42);
    let stack = StackedRbm::random(4, &[3, 2], 1.0, &mut rng).unwrap();

    assert_eq!(stack.num_layers(), 2);
    assert_eq!(stack.visible_width(), 4);
    assert_eq!(stack.hidden_widths(), vec![3, 2]);

    let weights = stack.weights();
    assert_eq!(weights[0].len(), 4 * 5);
    assert_eq!(weights[1].len(), 3 * 4);

    let layers = stack.layers();
    assert_eq!(layers[1].num_visible(), layers[0].num_hidden());
    assert_eq!(stack.norms().len(), 2);
}

#[test]
fn test_random_stack_validation() {
    let mut rng = StdRng::seed_from_u64(42);
    assert!(matches!(
        StackedRbm::random(4, &[], 1.0, &mut rng),
        Err(ModelError::InputValidationError(_))
    ));
    assert!(matches!(
        StackedRbm::random(4, &[3, 0], 1.0, &mut rng),
        Err(ModelError::InputValidationError(_))
    ));
    assert!(StackedRbm::random(0, &[3], 1.0, &mut rng).is_err());
    assert!(StackedRbm::random(4, &[3], -1.0, &mut rng).is_err());
}

#[test]
fn test_from_weights_round_trip() {
    let mut rng = StdRng::seed_from_u64(1);
    let stack = StackedRbm::random(6, &[4, 3, 2], 0.5, &mut rng).unwrap();

    let rebuilt = StackedRbm::from_weights(6, stack.weights()).unwrap();
    assert_eq!(rebuilt.hidden_widths(), vec![4, 3, 2]);
    assert_eq!(rebuilt.weights(), stack.weights());
}

#[test]
fn test_from_weights_inconsistent_chain() {
    // 20 = 4 hidden x 5 visible, but 13 is not a multiple of 4
    assert!(matches!(
        StackedRbm::from_weights(4, vec![vec![0.0; 20], vec![0.0; 13]]),
        Err(ModelError::ShapeMismatch(_))
    ));
    // 5 entries over 5 visible units leave only the bias on the hidden side
    assert!(matches!(
        StackedRbm::from_weights(4, vec![vec![0.0; 5]]),
        Err(ModelError::ShapeMismatch(_))
    ));
    assert!(matches!(
        StackedRbm::from_weights(4, vec![]),
        Err(ModelError::InputValidationError(_))
    ));
    assert!(StackedRbm::from_weights(4, vec![vec![0.0; 20], vec![0.0; 12]]).is_ok());
}

#[test]
fn test_train_validation() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut stack = StackedRbm::random(4, &[3], 1.0, &mut rng).unwrap();
    let options = TrainingOptions::new(0.01, 0.0, 10).unwrap();

    assert!(matches!(
        stack.train(&[], &options, &mut rng, None),
        Err(ModelError::InputValidationError(_))
    ));
    assert!(matches!(
        stack.train(&[vec![1.0, -1.0, 1.0]], &options, &mut rng, None),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_train_reports_progress() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut stack = StackedRbm::random(4, &[3, 2], 1.0, &mut rng).unwrap();
    let options = TrainingOptions::new(0.01, 0.0, 100)
        .unwrap()
        .with_progress_interval(10)
        .unwrap();

    let mut monitor = RecordingMonitor {
        ticks: Vec::new(),
        finished: false,
    };
    stack
        .train(&two_patterns(), &options, &mut rng, Some(&mut monitor as &mut dyn ProgressMonitor))
        .unwrap();

    assert_eq!(monitor.ticks.len(), 20);
    assert_eq!(monitor.ticks[0], (0, 200));
    assert_eq!(monitor.ticks[10], (100, 200));
    assert_eq!(monitor.ticks[19], (190, 200));
    assert!(monitor.finished);
}

#[test]
fn test_closure_as_monitor() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut stack = StackedRbm::random(4, &[2], 1.0, &mut rng).unwrap();
    let options = TrainingOptions::new(0.01, 0.0, 64)
        .unwrap()
        .with_progress_interval(16)
        .unwrap();

    let mut steps = Vec::new();
    let mut record = |step: usize, _total: usize| steps.push(step);
    stack
        .train(&two_patterns(), &options, &mut rng, Some(&mut record as &mut dyn ProgressMonitor))
        .unwrap();

    assert_eq!(steps, vec![0, 16, 32, 48]);
}

#[test]
fn test_next_layer_trains_on_hidden_images() {
    let mut rng = StdRng::seed_from_u64(10);
    let vectors = two_patterns();
    let mut stack = StackedRbm::random(4, &[3, 2], 1.0, &mut rng).unwrap();

    // Replay the curriculum by hand on copies of the untrained layers
    let mut layers = stack.layers().to_vec();
    let mut manual_rng = rng.clone();

    let options = TrainingOptions::new(0.05, 0.0, 40).unwrap();
    stack.train(&vectors, &options, &mut rng, None).unwrap();

    let inputs: Vec<Array1<f64>> = vectors.iter().map(|v| add_bias(v)).collect();
    for _ in 0..40 {
        let n = manual_rng.random_range(0..inputs.len());
        layers[0].learn_vector(&inputs[n], 0.05, &mut manual_rng).unwrap();
    }

    let images: Vec<Array1<f64>> = inputs
        .iter()
        .map(|v| layers[0].hidden_image(v, &mut manual_rng).unwrap())
        .collect();
    assert_eq!(images.len(), 2);
    for image in &images {
        assert_eq!(image.len(), 4);
        assert_eq!(image[3], BIAS);
        for &q in image.iter().take(3) {
            assert!(q > 0.0 && q < 1.0, "probability {}", q);
        }
    }

    for _ in 0..40 {
        let n = manual_rng.random_range(0..images.len());
        layers[1].learn_vector(&images[n], 0.05, &mut manual_rng).unwrap();
    }

    let manual: Vec<Vec<f64>> = layers.iter().map(Rbm::flat_weights).collect();
    assert_eq!(stack.weights(), manual);
}

#[test]
fn test_decay_shrinks_weights() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut stack = StackedRbm::random(4, &[3], 1.0, &mut rng).unwrap();
    let before = stack.norms()[0];

    // Decay hits rounds 0 and 16; the learning rate is too small to matter
    let options = TrainingOptions::new(1e-9, 0.5, 32).unwrap();
    stack.train(&two_patterns(), &options, &mut rng, None).unwrap();

    assert_abs_diff_eq!(stack.norms()[0], before * 0.0625, epsilon = 1e-3);
}

#[test]
fn test_training_lowers_stack_error() {
    let mut rng = StdRng::seed_from_u64(6);
    let vectors = two_patterns();
    let mut stack = StackedRbm::random(4, &[3], 1.0, &mut rng).unwrap();

    let untrained = stack.mean_error(&vectors, &mut rng).unwrap();
    let options = TrainingOptions::new(0.01, 0.0, 2000).unwrap();
    stack.train(&vectors, &options, &mut rng, None).unwrap();
    let trained = stack.mean_error(&vectors, &mut rng).unwrap();

    assert!(trained < untrained, "trained {} vs untrained {}", trained, untrained);
}

#[test]
fn test_reconstruct_and_error() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut stack = StackedRbm::random(5, &[4, 3], 1.0, &mut rng).unwrap();
    let vector = vec![1.0, -1.0, 1.0, -1.0, 1.0];

    let reconstructed = stack.reconstruct(&vector, &mut rng).unwrap();
    assert_eq!(reconstructed.len(), 5);
    assert!(reconstructed.iter().all(|&x| x == ON || x == OFF));

    let error = stack.error(&vector, &mut rng).unwrap();
    assert!((0.0..=5.0).contains(&error));

    assert!(matches!(
        stack.reconstruct(&[1.0, -1.0], &mut rng),
        Err(ModelError::ShapeMismatch(_))
    ));
    assert!(stack.mean_error(&[], &mut rng).is_err());
}

#[test]
fn test_mean_error_averages_per_vector_errors() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut stack = StackedRbm::random(4, &[3], 1.0, &mut rng).unwrap();
    let vectors = two_patterns();

    let mut replay = rng.clone();
    let errors = stack.errors(&vectors, &mut rng).unwrap();
    assert_eq!(errors.len(), 2);

    let mean = stack.mean_error(&vectors, &mut replay).unwrap();
    assert_abs_diff_eq!(mean, (errors[0] + errors[1]) / 2.0, epsilon = 1e-12);
    assert!(stack.errors(&[], &mut rng).unwrap().is_empty());
}

#[test]
fn test_sample_up_and_down() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut stack = StackedRbm::random(6, &[4, 3], 1.0, &mut rng).unwrap();

    let hidden = stack.sample_up(&[1.0, 1.0, 1.0, -1.0, -1.0, -1.0], 2, &mut rng).unwrap();
    assert_eq!(hidden.len(), 3);
    assert!(hidden.iter().all(|&x| x == ON || x == OFF));

    let pattern = stack.unit_pattern(1).unwrap();
    assert_eq!(pattern, vec![OFF, ON, OFF]);
    assert!(stack.unit_pattern(3).is_err());

    let visible = stack.sample_down(&pattern, 4, &mut rng).unwrap();
    assert_eq!(visible.len(), 6);
    assert!(visible.iter().all(|&x| x == ON || x == OFF));

    assert!(matches!(
        stack.sample_down(&[ON, OFF], 1, &mut rng),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_display() {
    let stack = StackedRbm::from_weights(2, vec![vec![0.0; 6], vec![1.0; 4]]).unwrap();
    let text = stack.to_string();

    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("layer 0: 1 hidden x 2 visible units"));
    assert!(text.contains("layer 1: 1 hidden x 1 visible units, norm = 4.000000"));
}

#[test]
fn test_snapshot_round_trip() {
    let mut rng = StdRng::seed_from_u64(9);
    let stack = StackedRbm::random(4, &[3, 2], 1.0, &mut rng).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.json");
    let path = path.to_str().unwrap();
    stack.save_to_path(path).unwrap();

    let loaded = StackedRbm::load_from_path(path).unwrap();
    assert_eq!(loaded.hidden_widths(), vec![3, 2]);
    assert_eq!(loaded.visible_width(), 4);
    for (a, b) in loaded.weights().iter().flatten().zip(stack.weights().iter().flatten()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_snapshot_rejects_wrong_widths() {
    let snapshot = SerializableStackedRbm {
        visible_width: 2,
        hidden_widths: vec![2],
        weights: vec![vec![0.0; 6]],
    };
    assert!(matches!(
        snapshot.into_stacked_rbm(),
        Err(ModelError::ShapeMismatch(_))
    ));
}
