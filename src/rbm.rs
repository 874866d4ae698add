/// Module that contains the external training and inference entry points
pub mod entry_point;
/// Module that contains progress reporting for the training curriculum
pub mod progress;
/// Module that contains the single RBM layer and its contrastive-divergence learning rule
pub mod rbm_layer;
/// Module that contains the JSON snapshot of a stacked RBM
pub mod serialize_weight;
/// Module that contains the stacked RBM and the greedy layer-wise curriculum
pub mod stacked_rbm;
/// Module that contains the training hyperparameters
pub mod training_options;

pub use entry_point::{DEFAULT_WEIGHT_STDDEV, TrainingOutcome};
pub use progress::*;
pub use rbm_layer::*;
pub use serialize_weight::*;
pub use stacked_rbm::*;
pub use training_options::*;
