use super::progress::ProgressMonitor;
use super::rbm_layer::{ERROR_TRIALS, Rbm};
use super::training_options::{DECAY_INTERVAL, TrainingOptions};
use crate::array_io::{read_array_file, write_array_file};
use crate::error::{IoError, ModelError};
use crate::math::{OFF, ON, add_bias, sign_disagreements, strip_bias};
use log::{debug, info};
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use std::fmt;

/// A stack of RBM layers trained greedily, one layer at a time.
///
/// Layer 0 faces the raw input. The hidden layer of layer `i` (bias included) is the visible
/// layer of layer `i + 1`, so `layers[i + 1].num_visible() == layers[i].num_hidden()` holds for
/// every adjacent pair.
///
/// Widths handed to the public API never include the bias unit: a stack built with
/// `visible_width = 4` and `hidden_widths = [3, 2]` has weight matrices of shape 4x5 and 3x4.
///
/// # Example
/// ```rust
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use rbmstack::rbm::{StackedRbm, TrainingOptions};
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let vectors = vec![vec![1.0, 1.0, -1.0, -1.0], vec![-1.0, -1.0, 1.0, 1.0]];
///
/// let mut stack = StackedRbm::random(4, &[3, 2], 1.0, &mut rng).unwrap();
/// let options = TrainingOptions::new(0.01, 0.0, 200).unwrap();
/// stack.train(&vectors, &options, &mut rng, None).unwrap();
///
/// let reconstructed = stack.reconstruct(&vectors[0], &mut rng).unwrap();
/// assert_eq!(reconstructed.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct StackedRbm {
    visible_width: usize,
    layers: Vec<Rbm>,
}

impl StackedRbm {
    /// Builds a stack with Gaussian random weights.
    ///
    /// # Parameters
    ///
    /// - `visible_width` - Width of the input vectors, bias excluded
    /// - `hidden_widths` - Width of each hidden layer from bottom to top, bias excluded
    /// - `stddev` - Standard deviation of the initial weights
    /// - `rng` - Random source
    ///
    /// # Returns
    ///
    /// - `Ok(StackedRbm)` - The untrained stack
    /// - `Err(ModelError::InputValidationError)` - If there is no hidden layer or a width is zero
    pub fn random<R: Rng>(
        visible_width: usize,
        hidden_widths: &[usize],
        stddev: f64,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        if visible_width == 0 {
            return Err(ModelError::InputValidationError(
                "visible width must be greater than 0".to_string(),
            ));
        }
        if hidden_widths.is_empty() {
            return Err(ModelError::InputValidationError(
                "at least one hidden layer is required".to_string(),
            ));
        }
        if let Some(i) = hidden_widths.iter().position(|&w| w == 0) {
            return Err(ModelError::InputValidationError(format!(
                "hidden layer {} has zero width",
                i
            )));
        }

        let mut layers = Vec::with_capacity(hidden_widths.len());
        let mut num_visible = visible_width + 1;
        for &width in hidden_widths {
            let num_hidden = width + 1;
            layers.push(Rbm::random(num_hidden, num_visible, stddev, rng)?);
            num_visible = num_hidden;
        }

        Ok(StackedRbm {
            visible_width,
            layers,
        })
    }

    /// Rebuilds a stack from persisted weight matrices.
    ///
    /// The shape of each layer is recovered by dividing the matrix length by the running visible
    /// width (bias included); the recovered hidden width then becomes the visible width of the
    /// next layer.
    ///
    /// # Parameters
    ///
    /// - `visible_width` - Width of the input vectors, bias excluded
    /// - `weights` - Flattened row-major weight matrices from bottom to top
    ///
    /// # Returns
    ///
    /// - `Ok(StackedRbm)` - The stack
    /// - `Err(ModelError::InputValidationError)` - If `weights` is empty
    /// - `Err(ModelError::ShapeMismatch)` - If a matrix does not chain onto the layer below it
    pub fn from_weights(visible_width: usize, weights: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        if weights.is_empty() {
            return Err(ModelError::InputValidationError(
                "no weight matrices to build a stack from".to_string(),
            ));
        }
        if visible_width == 0 {
            return Err(ModelError::InputValidationError(
                "visible width must be greater than 0".to_string(),
            ));
        }

        let mut layers = Vec::with_capacity(weights.len());
        let mut num_visible = visible_width + 1;
        for (i, matrix) in weights.into_iter().enumerate() {
            if matrix.len() % num_visible != 0 || matrix.len() / num_visible < 2 {
                return Err(ModelError::ShapeMismatch(format!(
                    "weight matrix {} has {} entries, inconsistent with {} visible units on the previous layer",
                    i,
                    matrix.len(),
                    num_visible - 1
                )));
            }
            let num_hidden = matrix.len() / num_visible;
            layers.push(Rbm::from_weights(num_hidden, num_visible, matrix)?);
            num_visible = num_hidden;
        }

        Ok(StackedRbm {
            visible_width,
            layers,
        })
    }

    /// Loads a stack from an array file (format chosen by extension).
    ///
    /// # Returns
    ///
    /// - `Ok(StackedRbm)` - The stack
    /// - `Err(IoError::NoData)` - If the file is missing, empty or declares no rows
    /// - `Err(IoError)` - If the file cannot be read or its matrices do not chain
    pub fn load_file(visible_width: usize, path: &str) -> Result<Self, IoError> {
        let weights = read_array_file(path)?.ok_or_else(|| IoError::NoData(path.to_string()))?;
        Ok(Self::from_weights(visible_width, weights)?)
    }

    /// Writes the weight matrices to an array file (format chosen by extension).
    pub fn write_file(&self, path: &str) -> Result<(), IoError> {
        write_array_file(path, &self.weights())
    }

    /// Flattened row-major weight matrices from bottom to top.
    pub fn weights(&self) -> Vec<Vec<f64>> {
        self.layers.iter().map(Rbm::flat_weights).collect()
    }

    pub fn layers(&self) -> &[Rbm] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Width of the input vectors, bias excluded.
    pub fn visible_width(&self) -> usize {
        self.visible_width
    }

    /// Width of each hidden layer, bias excluded.
    pub fn hidden_widths(&self) -> Vec<usize> {
        self.layers.iter().map(|layer| layer.num_hidden() - 1).collect()
    }

    /// Sum of squared weights of every layer.
    pub fn norms(&self) -> Vec<f64> {
        self.layers.iter().map(Rbm::norm).collect()
    }

    fn check_visible(&self, vector: &[f64]) -> Result<(), ModelError> {
        if vector.len() != self.visible_width {
            return Err(ModelError::ShapeMismatch(format!(
                "vector of length {} for a stack with {} visible units",
                vector.len(),
                self.visible_width
            )));
        }
        Ok(())
    }

    /// Greedy layer-wise training.
    ///
    /// Layer `i` is trained for `rounds` rounds, each learning from one vector drawn uniformly
    /// (with replacement) from the current training set. Every [`DECAY_INTERVAL`]th round the
    /// weights of the layer shrink by `1 - decay`. Once a layer is done, each vector of its
    /// training set is pushed through `up(1, _)` and the settled hidden probabilities, bias
    /// clamped, form the training set of the next layer.
    ///
    /// # Parameters
    ///
    /// - `vectors` - Training vectors of width `visible_width`, bias excluded
    /// - `options` - Learning rate, decay, rounds and progress cadence
    /// - `rng` - Random source
    /// - `progress` - Optional monitor ticked every `progress_interval` rounds
    ///
    /// # Returns
    ///
    /// - `Ok(())` - All layers trained
    /// - `Err(ModelError)` - If the training set is empty or a vector has the wrong width
    pub fn train<R: Rng>(
        &mut self,
        vectors: &[Vec<f64>],
        options: &TrainingOptions,
        rng: &mut R,
        mut progress: Option<&mut dyn ProgressMonitor>,
    ) -> Result<(), ModelError> {
        if vectors.is_empty() {
            return Err(ModelError::InputValidationError(
                "no training vectors".to_string(),
            ));
        }
        for vector in vectors {
            self.check_visible(vector)?;
        }

        let mut training: Vec<Array1<f64>> = vectors.iter().map(|v| add_bias(v)).collect();

        let rate = options.get_rate();
        let decay = options.get_decay();
        let rounds = options.get_rounds();
        let interval = options.get_progress_interval();
        let num_layers = self.layers.len();
        let total_rounds = rounds * num_layers;

        for (i, layer) in self.layers.iter_mut().enumerate() {
            info!(
                "Training layer {} ({} hidden x {} visible units, {} rounds)",
                i,
                layer.num_hidden() - 1,
                layer.num_visible() - 1,
                rounds
            );

            for r in 0..rounds {
                let n = rng.random_range(0..training.len());
                layer.learn_vector(&training[n], rate, rng)?;

                if r % interval == 0 {
                    if let Some(monitor) = progress.as_mut() {
                        monitor.tick(i * rounds + r, total_rounds);
                    }
                    debug!("layer {} round {}: norm = {:.6}", i, r, layer.norm());
                }

                if decay > 0.0 && r % DECAY_INTERVAL == 0 {
                    layer.decay(decay);
                }
            }

            info!("Finished layer {}, norm = {:.6}", i, layer.norm());

            if i + 1 < num_layers {
                training = training
                    .iter()
                    .map(|vector| layer.hidden_image(vector, rng))
                    .collect::<Result<Vec<_>, _>>()?;
            }
        }

        if let Some(monitor) = progress {
            monitor.finish();
        }
        Ok(())
    }

    fn encode<R: Rng>(&mut self, vector: &[f64], rng: &mut R) -> Result<(), ModelError> {
        let mut current = add_bias(vector);
        for layer in self.layers.iter_mut() {
            current = layer.sample_hidden(&current, rng)?.to_owned();
        }
        Ok(())
    }

    fn split_top(&mut self) -> Result<(&mut Rbm, &mut [Rbm]), ModelError> {
        self.layers
            .split_last_mut()
            .ok_or_else(|| ModelError::ProcessingError("stack has no layers".to_string()))
    }

    /// Pushes `visible` down through `lower` to the bottom of the stack.
    fn propagate_down<R: Rng>(
        lower: &mut [Rbm],
        mut visible: Array1<f64>,
        rng: &mut R,
    ) -> Result<Array1<f64>, ModelError> {
        for layer in lower.iter_mut().rev() {
            layer.clamp_hidden(&visible)?;
            visible = layer.sample_visible(rng)?.to_owned();
        }
        Ok(strip_bias(&visible).to_owned())
    }

    /// Encodes `vector` up to the top layer and decodes it back down.
    ///
    /// Going up, every layer samples its hidden units from the layer below; going down, every
    /// layer samples its visible units from its hidden units, which become the hidden units of
    /// the layer below. Bias units are clamped after every sample.
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - The reconstructed vector, bias excluded
    /// - `Err(ModelError::ShapeMismatch)` - If `vector.len() != visible_width`
    pub fn reconstruct<R: Rng>(
        &mut self,
        vector: &[f64],
        rng: &mut R,
    ) -> Result<Array1<f64>, ModelError> {
        self.check_visible(vector)?;
        self.encode(vector, rng)?;

        let (top, lower) = self.split_top()?;
        let visible = top.sample_visible(rng)?.to_owned();
        Self::propagate_down(lower, visible, rng)
    }

    /// Estimates the reconstruction error of the whole stack for one vector.
    ///
    /// Runs [`ERROR_TRIALS`] reconstructions and returns the mean number of positions whose sign
    /// disagrees with `vector` (not divided by the width).
    pub fn error<R: Rng>(&mut self, vector: &[f64], rng: &mut R) -> Result<f64, ModelError> {
        self.check_visible(vector)?;
        let reference = ArrayView1::from(vector);

        let mut total = 0usize;
        for _ in 0..ERROR_TRIALS {
            let reconstructed = self.reconstruct(vector, rng)?;
            total += sign_disagreements(&reference, &reconstructed);
        }
        Ok(total as f64 / ERROR_TRIALS as f64)
    }

    /// [`StackedRbm::error`] of every vector, in order.
    pub fn errors<R: Rng>(
        &mut self,
        vectors: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<Vec<f64>, ModelError> {
        vectors.iter().map(|vector| self.error(vector, rng)).collect()
    }

    /// Mean of [`StackedRbm::error`] over a set of vectors.
    pub fn mean_error<R: Rng>(
        &mut self,
        vectors: &[Vec<f64>],
        rng: &mut R,
    ) -> Result<f64, ModelError> {
        if vectors.is_empty() {
            return Err(ModelError::InputValidationError(
                "no vectors to evaluate".to_string(),
            ));
        }

        let errors = self.errors(vectors, rng)?;
        Ok(errors.iter().sum::<f64>() / errors.len() as f64)
    }

    /// Samples the top hidden layer for an input vector.
    ///
    /// The vector is encoded up to the top layer, which then runs `cycles` Gibbs cycles.
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - Hidden sample of the top layer, bias excluded
    pub fn sample_up<R: Rng>(
        &mut self,
        vector: &[f64],
        cycles: usize,
        rng: &mut R,
    ) -> Result<Array1<f64>, ModelError> {
        self.check_visible(vector)?;
        let (top, lower) = self.split_top()?;

        let mut current = add_bias(vector);
        for layer in lower.iter_mut() {
            current = layer.sample_hidden(&current, rng)?.to_owned();
        }
        top.up(cycles, &current, rng)?;
        Ok(strip_bias(&top.hidden()).to_owned())
    }

    /// Generates an input-space sample from a pattern of the top hidden layer.
    ///
    /// The pattern is clamped on the top layer, which runs `down(cycles)`; the result is then
    /// decoded through the lower layers.
    ///
    /// # Parameters
    ///
    /// - `hidden` - Pattern of the top hidden layer, bias excluded
    /// - `cycles` - Gibbs cycles run on the top layer before decoding
    /// - `rng` - Random source
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - Visible sample, bias excluded
    /// - `Err(ModelError::ShapeMismatch)` - If the pattern does not match the top hidden width
    pub fn sample_down<R: Rng>(
        &mut self,
        hidden: &[f64],
        cycles: usize,
        rng: &mut R,
    ) -> Result<Array1<f64>, ModelError> {
        let (top, lower) = self.split_top()?;
        top.clamp_hidden(&add_bias(hidden))?;
        let visible = top.down(cycles, rng)?.to_owned();
        Self::propagate_down(lower, visible, rng)
    }

    /// Bipolar pattern of the top hidden layer with only `unit` switched on.
    pub fn unit_pattern(&self, unit: usize) -> Result<Vec<f64>, ModelError> {
        let width = self.hidden_widths().last().copied().unwrap_or(0);
        if unit >= width {
            return Err(ModelError::InputValidationError(format!(
                "hidden unit {} out of range for a top layer of width {}",
                unit, width
            )));
        }
        let mut pattern = vec![OFF; width];
        pattern[unit] = ON;
        Ok(pattern)
    }
}

impl fmt::Display for StackedRbm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, layer) in self.layers.iter().enumerate() {
            writeln!(
                f,
                "layer {}: {} hidden x {} visible units, norm = {:.6}",
                i,
                layer.num_hidden() - 1,
                layer.num_visible() - 1,
                layer.norm()
            )?;
        }
        Ok(())
    }
}
