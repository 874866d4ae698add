use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Weight decay is applied every this many training rounds.
pub const DECAY_INTERVAL: usize = 16;

/// Hyperparameters of the greedy layer-wise training curriculum.
///
/// # Fields
///
/// - `rate` - Learning rate passed to every contrastive-divergence step
/// - `decay` - Multiplicative weight decay applied every [`DECAY_INTERVAL`] rounds (0 disables it)
/// - `rounds` - Training rounds per layer, one randomly selected vector per round
/// - `progress_interval` - The progress monitor is called every this many rounds
///
/// # Example
/// ```rust
/// use rbmstack::rbm::TrainingOptions;
///
/// let options = TrainingOptions::new(0.01, 0.0, 2000).unwrap();
/// assert_eq!(options.get_rounds(), 2000);
/// assert!(TrainingOptions::new(-1.0, 0.0, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTrainingOptions")]
pub struct TrainingOptions {
    rate: f64,
    decay: f64,
    rounds: usize,
    progress_interval: usize,
}

/// Unchecked field values of stored options, validated on the way into [`TrainingOptions`].
#[derive(Deserialize)]
struct StoredTrainingOptions {
    rate: f64,
    decay: f64,
    rounds: usize,
    progress_interval: usize,
}

impl TryFrom<StoredTrainingOptions> for TrainingOptions {
    type Error = ModelError;

    fn try_from(stored: StoredTrainingOptions) -> Result<Self, Self::Error> {
        TrainingOptions::new(stored.rate, stored.decay, stored.rounds)?
            .with_progress_interval(stored.progress_interval)
    }
}

impl Default for TrainingOptions {
    /// # Default Values
    ///
    /// - `rate` - 0.001
    /// - `decay` - 0.0
    /// - `rounds` - 1024
    /// - `progress_interval` - 512
    fn default() -> Self {
        TrainingOptions {
            rate: 0.001,
            decay: 0.0,
            rounds: 1024,
            progress_interval: 512,
        }
    }
}

impl TrainingOptions {
    /// Creates validated training options with the default progress interval.
    ///
    /// # Parameters
    ///
    /// - `rate` - Learning rate, finite and greater than 0
    /// - `decay` - Weight decay, finite and in `[0, 1)`
    /// - `rounds` - Rounds per layer, greater than 0
    ///
    /// # Returns
    ///
    /// - `Ok(TrainingOptions)` - Validated options
    /// - `Err(ModelError::InputValidationError)` - If any value is out of range
    pub fn new(rate: f64, decay: f64, rounds: usize) -> Result<Self, ModelError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ModelError::InputValidationError(format!(
                "learning rate must be positive and finite, got {}",
                rate
            )));
        }
        if !decay.is_finite() || !(0.0..1.0).contains(&decay) {
            return Err(ModelError::InputValidationError(format!(
                "weight decay must be in [0, 1), got {}",
                decay
            )));
        }
        if rounds == 0 {
            return Err(ModelError::InputValidationError(
                "rounds must be greater than 0".to_string(),
            ));
        }

        Ok(TrainingOptions {
            rate,
            decay,
            rounds,
            ..Default::default()
        })
    }

    /// Sets how often (in rounds) the progress monitor is called.
    pub fn with_progress_interval(mut self, interval: usize) -> Result<Self, ModelError> {
        if interval == 0 {
            return Err(ModelError::InputValidationError(
                "progress interval must be greater than 0".to_string(),
            ));
        }
        self.progress_interval = interval;
        Ok(self)
    }

    get_field!(get_rate, rate, f64);
    get_field!(get_decay, decay, f64);
    get_field!(get_rounds, rounds, usize);
    get_field!(get_progress_interval, progress_interval, usize);
}
