use super::stacked_rbm::StackedRbm;
use crate::error::{IoError, ModelError};
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::fs::File;
use std::io::BufWriter;

/// Serializable snapshot of a [`StackedRbm`].
///
/// Only the weights are stored; activation buffers are rebuilt on load.
///
/// # Fields
///
/// - `visible_width` - Width of the input vectors, bias excluded
/// - `hidden_widths` - Width of each hidden layer, bias excluded
/// - `weights` - Flattened row-major weight matrices from bottom to top
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableStackedRbm {
    pub visible_width: usize,
    pub hidden_widths: Vec<usize>,
    pub weights: Vec<Vec<f64>>,
}

impl SerializableStackedRbm {
    pub fn from_stacked_rbm(stack: &StackedRbm) -> Self {
        SerializableStackedRbm {
            visible_width: stack.visible_width(),
            hidden_widths: stack.hidden_widths(),
            weights: stack.weights(),
        }
    }

    /// Rebuilds the stack and checks that the recorded hidden widths match the matrices.
    pub fn into_stacked_rbm(self) -> Result<StackedRbm, ModelError> {
        let stack = StackedRbm::from_weights(self.visible_width, self.weights)?;
        if stack.hidden_widths() != self.hidden_widths {
            return Err(ModelError::ShapeMismatch(format!(
                "recorded hidden widths {:?} disagree with weight matrices {:?}",
                self.hidden_widths,
                stack.hidden_widths()
            )));
        }
        Ok(stack)
    }
}

impl StackedRbm {
    /// Saves the stack as pretty-printed JSON.
    ///
    /// # Parameters
    ///
    /// - `path` - Destination file, created or truncated
    ///
    /// # Returns
    ///
    /// - `Ok(())` - The snapshot was written
    /// - `Err(IoError)` - If the file cannot be created or serialization fails
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        let file = File::create(path).map_err(IoError::StdIoError)?;
        let writer = BufWriter::new(file);
        to_writer_pretty(writer, &SerializableStackedRbm::from_stacked_rbm(self))
            .map_err(IoError::JsonError)
    }

    /// Loads a stack saved with [`StackedRbm::save_to_path`].
    pub fn load_from_path(path: &str) -> Result<Self, IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        let snapshot: SerializableStackedRbm = from_reader(reader).map_err(IoError::JsonError)?;
        Ok(snapshot.into_stacked_rbm()?)
    }
}
