use super::*;
use approx::assert_abs_diff_eq;

fn is_bipolar(values: ArrayView1<f64>) -> bool {
    values.iter().all(|&x| x == ON || x == OFF)
}

#[test]
fn test_random_layer_shapes() {
    let mut rng = StdRng::seed_from_u64(42);
    let rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();

    assert_eq!(rbm.num_hidden(), 4);
    assert_eq!(rbm.num_visible(), 5);
    assert_eq!(rbm.weights().dim(), (4, 5));
    assert_eq!(rbm.flat_weights().len(), 20);
    assert_eq!(rbm.hidden()[3], BIAS);
    assert_eq!(rbm.visible()[4], BIAS);
}

#[test]
fn test_from_weights_validation() {
    let rbm = Rbm::from_weights(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    assert_eq!(rbm.weights(), array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    assert_eq!(rbm.flat_weights(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    assert!(matches!(
        Rbm::from_weights(2, 3, vec![0.0; 5]),
        Err(ModelError::ShapeMismatch(_))
    ));
    // A layer needs one real unit plus the bias on both sides
    assert!(Rbm::from_weights(1, 3, vec![0.0; 3]).is_err());
    assert!(Rbm::from_weights(3, 1, vec![0.0; 3]).is_err());
}

#[test]
fn test_up_without_cycles() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();
    let visible = array![1.0, -1.0, 1.0, -1.0, BIAS];

    rbm.up(0, &visible, &mut rng).unwrap();
    assert_eq!(rbm.negative(), rbm.positive());
    assert_eq!(rbm.positive()[3], BIAS);
    assert!(is_bipolar(rbm.hidden()));
    assert_eq!(rbm.hidden()[3], BIAS);
}

#[test]
fn test_up_with_cycles() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut rbm = Rbm::random(3, 6, 1.0, &mut rng).unwrap();
    let visible = array![1.0, 1.0, -1.0, -1.0, 1.0, BIAS];

    rbm.up(3, &visible, &mut rng).unwrap();
    assert!(is_bipolar(rbm.hidden()));
    assert!(is_bipolar(rbm.visible()));
    assert_eq!(rbm.visible()[5], BIAS);
    assert_eq!(rbm.negative()[2], BIAS);
    for &q in rbm.negative().iter().take(2) {
        assert!(q > 0.0 && q < 1.0);
    }

    let wrong = array![1.0, -1.0, BIAS];
    assert!(matches!(
        rbm.up(1, &wrong, &mut rng),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_down_from_clamped_pattern() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut rbm = Rbm::random(4, 6, 1.0, &mut rng).unwrap();

    rbm.clamp_hidden(&array![1.0, -1.0, -1.0, -1.0]).unwrap();
    assert_eq!(rbm.hidden()[3], BIAS);

    let visible = rbm.down(2, &mut rng).unwrap().to_owned();
    assert_eq!(visible.len(), 6);
    assert!(is_bipolar(visible.view()));
    assert_eq!(visible[5], BIAS);

    assert!(matches!(
        rbm.clamp_hidden(&array![1.0, -1.0]),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_learn_vector_preconditions() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();

    // Last slot must be the +1 bias unit
    let no_bias = array![1.0, 1.0, -1.0, -1.0, -1.0];
    assert!(matches!(
        rbm.learn_vector(&no_bias, 0.01, &mut rng),
        Err(ModelError::PreconditionViolation(_))
    ));

    let short = array![1.0, 1.0, BIAS];
    assert!(matches!(
        rbm.learn_vector(&short, 0.01, &mut rng),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_learn_vector_updates() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();
    let visible = array![1.0, 1.0, -1.0, -1.0, BIAS];
    let before = rbm.weights().to_owned();

    for _ in 0..50 {
        rbm.learn_vector(&visible, 0.05, &mut rng).unwrap();
    }
    let after = rbm.weights().to_owned();
    assert_ne!(before, after);

    // P and Q agree on the always-on hidden unit, so its row never moves
    assert_eq!(before.row(3), after.row(3));

    // The frozen row does not feed the downward pass
    let mut zeroed = after.clone();
    zeroed.row_mut(3).fill(0.0);
    let mut blank = Rbm::from_weights(4, 5, zeroed.iter().copied().collect()).unwrap();
    let pattern = array![1.0, -1.0, 1.0, BIAS];
    rbm.clamp_hidden(&pattern).unwrap();
    blank.clamp_hidden(&pattern).unwrap();

    let mut rng_a = StdRng::seed_from_u64(50);
    let mut rng_b = StdRng::seed_from_u64(50);
    for _ in 0..20 {
        let trained = rbm.sample_visible(&mut rng_a).unwrap().to_owned();
        let stripped = blank.sample_visible(&mut rng_b).unwrap().to_owned();
        assert_eq!(trained, stripped);
    }
}

#[test]
fn test_hidden_image() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();
    let visible = array![1.0, -1.0, -1.0, 1.0, BIAS];

    let image = rbm.hidden_image(&visible, &mut rng).unwrap();
    assert_eq!(image.len(), 4);
    assert_eq!(image, rbm.negative());
    assert_eq!(image[3], BIAS);
    for &q in image.iter().take(3) {
        assert!(q > 0.0 && q < 1.0, "probability {}", q);
    }

    assert!(matches!(
        rbm.hidden_image(&array![1.0, BIAS], &mut rng),
        Err(ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_error_is_a_count() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut rbm = Rbm::random(3, 5, 1.0, &mut rng).unwrap();
    let visible = array![1.0, -1.0, 1.0, -1.0, BIAS];

    let error = rbm.error(&visible, &mut rng).unwrap();
    assert!((0.0..=4.0).contains(&error), "error {}", error);

    assert!(rbm.error(&array![1.0, BIAS], &mut rng).is_err());
}

#[test]
fn test_learning_lowers_layer_error() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();
    let vectors = [
        array![1.0, 1.0, -1.0, -1.0, BIAS],
        array![-1.0, -1.0, 1.0, 1.0, BIAS],
    ];

    let untrained: f64 = vectors.iter().map(|v| rbm.error(v, &mut rng).unwrap()).sum();
    for round in 0..2000 {
        rbm.learn_vector(&vectors[round % 2], 0.01, &mut rng).unwrap();
    }
    let trained: f64 = vectors.iter().map(|v| rbm.error(v, &mut rng).unwrap()).sum();

    assert!(trained < untrained, "trained {} vs untrained {}", trained, untrained);
}

#[test]
fn test_norm_and_decay() {
    let mut rbm = Rbm::from_weights(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_abs_diff_eq!(rbm.norm(), 30.0);

    rbm.decay(0.5);
    assert_abs_diff_eq!(rbm.norm(), 7.5);
    assert_eq!(rbm.flat_weights(), vec![0.5, 1.0, 1.5, 2.0]);

    rbm.decay(0.0);
    assert_abs_diff_eq!(rbm.norm(), 7.5);
}

#[test]
fn test_zero_weights_are_coin_flips() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut rbm = Rbm::from_weights(3, 4, vec![0.0; 12]).unwrap();
    let visible = array![1.0, -1.0, 1.0, BIAS];

    let hidden = rbm.sample_hidden(&visible, &mut rng).unwrap().to_owned();
    assert!(is_bipolar(hidden.view()));
    for &p in rbm.positive().iter().take(2) {
        assert_abs_diff_eq!(p, 0.5);
    }

    // Each of the three real visible units is a fair coin
    let error = rbm.error(&visible, &mut rng).unwrap();
    assert!(error > 1.2 && error < 1.8, "error {}", error);
}
