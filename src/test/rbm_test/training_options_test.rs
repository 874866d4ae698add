use super::*;

#[test]
fn test_default_options() {
    let options = TrainingOptions::default();
    assert_eq!(options.get_rate(), 0.001);
    assert_eq!(options.get_decay(), 0.0);
    assert_eq!(options.get_rounds(), 1024);
    assert_eq!(options.get_progress_interval(), 512);
}

#[test]
fn test_new_validation() {
    let options = TrainingOptions::new(0.01, 0.1, 2000).unwrap();
    assert_eq!(options.get_rate(), 0.01);
    assert_eq!(options.get_decay(), 0.1);
    assert_eq!(options.get_rounds(), 2000);
    assert_eq!(options.get_progress_interval(), 512);

    for (rate, decay, rounds) in [
        (0.0, 0.0, 10),
        (-0.1, 0.0, 10),
        (f64::NAN, 0.0, 10),
        (0.01, -0.1, 10),
        (0.01, 1.0, 10),
        (0.01, 0.0, 0),
    ] {
        assert!(matches!(
            TrainingOptions::new(rate, decay, rounds),
            Err(ModelError::InputValidationError(_))
        ));
    }
}

#[test]
fn test_progress_interval() {
    let options = TrainingOptions::default().with_progress_interval(64).unwrap();
    assert_eq!(options.get_progress_interval(), 64);
    assert!(TrainingOptions::default().with_progress_interval(0).is_err());
}

#[test]
fn test_options_serde() {
    let options = TrainingOptions::new(0.5, 0.25, 128).unwrap();
    let json = serde_json::to_string(&options).unwrap();
    let parsed: TrainingOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, options);
}

#[test]
fn test_stored_options_are_validated() {
    let zero_interval = r#"{"rate":0.01,"decay":0.0,"rounds":10,"progress_interval":0}"#;
    assert!(serde_json::from_str::<TrainingOptions>(zero_interval).is_err());

    let negative_rate = r#"{"rate":-1.0,"decay":0.0,"rounds":10,"progress_interval":4}"#;
    assert!(serde_json::from_str::<TrainingOptions>(negative_rate).is_err());

    let valid = r#"{"rate":0.01,"decay":0.0,"rounds":10,"progress_interval":4}"#;
    let options: TrainingOptions = serde_json::from_str(valid).unwrap();
    assert_eq!(options.get_progress_interval(), 4);

    let mut rng = StdRng::seed_from_u64(1);
    let mut stack = StackedRbm::random(2, &[2], 1.0, &mut rng).unwrap();
    assert!(stack.train(&[vec![1.0, -1.0]], &options, &mut rng, None).is_ok());
}
