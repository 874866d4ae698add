/// A macro that generates a getter method for any field.
///
/// This macro creates a public getter method that returns the value of the specified field.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., get_rate)
/// - `$field_name` - The name of the field to access (e.g., rate)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// Error types shared by the model and the array file formats.
///
/// - `ModelError` - Shape, validation and precondition failures of the RBM engine
/// - `IoError` - Failures while reading or writing array files and model snapshots
pub mod error;

/// Module `math` contains the numeric kernels the RBM engine is built from.
///
/// # Core Functions
///
/// - `logistic` - Numerically stable logistic function
/// - `transfer` / `transfer_t` - Matrix-vector products followed by the logistic, writing the bias slot
/// - `sample` / `sample_in_place` - Bipolar stochastic sampling of probabilities
/// - `random_matrix` - Gaussian initial weights
/// - `sign_disagreements` - Counting sign flips between two vectors
///
/// # Example
/// ```rust
/// use rbmstack::math::{BIAS, transfer};
/// use ndarray::{Array1, array};
///
/// let weights = array![[0.5, -0.5, 0.0], [0.0, 0.0, 0.0]];
/// let mut hidden = Array1::<f64>::zeros(2);
/// transfer(&weights, &array![1.0, -1.0, BIAS], &mut hidden).unwrap();
/// assert!(hidden[0] > 0.5);
/// assert_eq!(hidden[1], BIAS);
/// ```
pub mod math;

/// Module `array_io` reads and writes the four array file formats.
///
/// The format is chosen by file extension:
///
/// - `.flt` - Binary little-endian `f64` rows
/// - `.sgn` - Binary packed sign bits
/// - `.tsv` - Tab separated decimal text
/// - `.txt` - Strings of `0` and `1`
///
/// # Example
/// ```rust
/// use rbmstack::array_io::{ArrayFormat, read_array, write_array};
///
/// let data = vec![vec![1.0, -1.0, 1.0], vec![-1.0, -1.0, 1.0]];
/// let mut buffer = Vec::new();
/// write_array(&mut buffer, ArrayFormat::TextSign, &data).unwrap();
/// assert_eq!(buffer, b"101\n001\n");
///
/// let decoded = read_array(buffer.as_slice(), ArrayFormat::TextSign).unwrap();
/// assert_eq!(decoded, Some(data));
/// ```
pub mod array_io;

/// Module `rbm` provides Restricted Boltzmann Machines with bipolar units and their stacking.
///
/// # Components
///
/// - **Rbm**: One layer, trained by contrastive divergence
/// - **StackedRbm**: A chain of layers trained greedily from the bottom up
/// - **TrainingOptions**: Learning rate, weight decay and rounds per layer
/// - **ProgressMonitor**: Progress callbacks, with a log based and an indicatif based implementation
/// - **entry_point**: Train from scratch or run inference from persisted weights
///
/// # Examples
/// ```rust
/// use rbmstack::rbm::*;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let vectors = vec![vec![1.0, 1.0, -1.0, -1.0], vec![-1.0, -1.0, 1.0, 1.0]];
/// let options = TrainingOptions::new(0.01, 0.0, 200).unwrap();
///
/// let mut stack = StackedRbm::random(4, &[3], 1.0, &mut rng).unwrap();
/// stack.train(&vectors, &options, &mut rng, None).unwrap();
/// let reconstruction = stack.reconstruct(&vectors[0], &mut rng).unwrap();
/// assert_eq!(reconstruction.len(), 4);
/// ```
pub mod rbm;

/// A convenience module that re-exports the most commonly used types of this crate.
///
/// # Examples
/// ```rust
/// use rbmstack::prelude::*;
///
/// let options = TrainingOptions::default();
/// assert_eq!(options.get_rounds(), 1024);
/// ```
pub mod prelude;

pub use error::{IoError, ModelError};
