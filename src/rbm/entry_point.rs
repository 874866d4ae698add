use super::progress::ProgressMonitor;
use super::stacked_rbm::StackedRbm;
use super::training_options::TrainingOptions;
use crate::error::ModelError;
use log::info;
use ndarray::Array1;
use rand::Rng;

/// Default standard deviation of the Gaussian initial weights.
pub const DEFAULT_WEIGHT_STDDEV: f64 = 1.0;

/// Result of a training run.
///
/// # Fields
///
/// - `weights` - Flattened row-major weight matrices from bottom to top, ready for persistence
/// - `error` - Mean reconstruction error of the trained stack over the training vectors
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub weights: Vec<Vec<f64>>,
    pub error: f64,
}

/// Trains a freshly initialised stack and reports its reconstruction error.
///
/// # Parameters
///
/// - `visible_width` - Width of the training vectors, bias excluded
/// - `hidden_widths` - Width of each hidden layer, bias excluded
/// - `stddev` - Standard deviation of the Gaussian initial weights
/// - `vectors` - Training vectors
/// - `options` - Training hyperparameters
/// - `rng` - Random source used for initialisation, training and evaluation
/// - `progress` - Optional progress monitor
///
/// # Returns
///
/// - `Ok(TrainingOutcome)` - Learned weights and the mean error over `vectors`
/// - `Err(ModelError)` - On shape or validation failures; nothing is produced in that case
pub fn train<R: Rng>(
    visible_width: usize,
    hidden_widths: &[usize],
    stddev: f64,
    vectors: &[Vec<f64>],
    options: &TrainingOptions,
    rng: &mut R,
    progress: Option<&mut dyn ProgressMonitor>,
) -> Result<TrainingOutcome, ModelError> {
    info!(
        "Generating random stack: {} visible units, hidden layers {:?}, stddev {}",
        visible_width, hidden_widths, stddev
    );
    let mut stack = StackedRbm::random(visible_width, hidden_widths, stddev, rng)?;

    info!(
        "Commencing {} rounds of training per layer on {} vectors",
        options.get_rounds(),
        vectors.len()
    );
    stack.train(vectors, options, rng, progress)?;

    let error = stack.mean_error(vectors, rng)?;
    info!("Average reconstruction error: {:.6}", error);

    Ok(TrainingOutcome {
        weights: stack.weights(),
        error,
    })
}

/// Reconstructs one vector through a stack rebuilt from persisted weights.
pub fn reconstruct<R: Rng>(
    weights: Vec<Vec<f64>>,
    visible_width: usize,
    vector: &[f64],
    rng: &mut R,
) -> Result<Array1<f64>, ModelError> {
    let mut stack = StackedRbm::from_weights(visible_width, weights)?;
    stack.reconstruct(vector, rng)
}

/// Mean reconstruction error of a set of vectors under persisted weights.
pub fn error<R: Rng>(
    weights: Vec<Vec<f64>>,
    visible_width: usize,
    vectors: &[Vec<f64>],
    rng: &mut R,
) -> Result<f64, ModelError> {
    let mut stack = StackedRbm::from_weights(visible_width, weights)?;
    stack.mean_error(vectors, rng)
}
