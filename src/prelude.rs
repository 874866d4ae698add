pub use crate::array_io::{
    ArrayFormat, load_vectors, read_array, read_array_file, write_array, write_array_file,
};
pub use crate::error::{IoError, ModelError};
pub use crate::math::{BIAS, OFF, ON, logistic, random_matrix, sample, transfer, transfer_t};
pub use crate::rbm::*;
