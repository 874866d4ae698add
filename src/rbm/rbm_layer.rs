use crate::error::ModelError;
use crate::math::{
    BIAS, check_shape, clamp_bias, random_matrix, sample, sample_in_place, sign_disagreements,
    transfer, transfer_t,
};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Zip, s};
use rand::Rng;

/// Number of contrastive-divergence sub-rounds run by one call to [`Rbm::learn_vector`].
pub const CD_SUB_ROUNDS: usize = 4;
/// Gibbs steps of the negative-phase chain inside each sub-round.
pub const CD_GIBBS_STEPS: usize = 3;
/// Number of one-step reconstructions averaged by the error estimators.
pub const ERROR_TRIALS: usize = 512;

/// A single Restricted Boltzmann Machine layer.
///
/// The layer connects `num_visible` visible units to `num_hidden` hidden units through a
/// dense weight matrix of shape `(num_hidden, num_visible)`. Both widths count the bias
/// unit, which is always the last slot of its vector and is clamped to `+1.0` after every
/// sampling step.
///
/// Units are bipolar: a sampled unit is either `+1.0` or `-1.0`.
///
/// # Fields
///
/// - `weights` - Weight matrix with shape (num_hidden, num_visible)
/// - `hidden` - Current hidden sample (H)
/// - `visible` - Current visible sample (V)
/// - `positive` - Hidden probabilities driven by the data (P)
/// - `negative` - Hidden probabilities at the end of the Gibbs chain (Q)
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use rbmstack::rbm::Rbm;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// // 3 hidden + bias, 4 visible + bias
/// let mut rbm = Rbm::random(4, 5, 1.0, &mut rng).unwrap();
///
/// let visible = array![1.0, 1.0, -1.0, -1.0, 1.0];
/// for _ in 0..100 {
///     rbm.learn_vector(&visible, 0.01, &mut rng).unwrap();
/// }
/// let error = rbm.error(&visible, &mut rng).unwrap();
/// assert!(error >= 0.0 && error <= 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct Rbm {
    weights: Array2<f64>,
    hidden: Array1<f64>,
    visible: Array1<f64>,
    positive: Array1<f64>,
    negative: Array1<f64>,
}

impl Rbm {
    /// Creates a layer with Gaussian random weights.
    ///
    /// # Parameters
    ///
    /// - `num_hidden` - Hidden width including the bias unit (at least 2)
    /// - `num_visible` - Visible width including the bias unit (at least 2)
    /// - `stddev` - Standard deviation of the zero-mean initial weights
    /// - `rng` - Random source
    ///
    /// # Returns
    ///
    /// - `Ok(Rbm)` - The new layer
    /// - `Err(ModelError)` - If a width is too small or `stddev` is invalid
    pub fn random<R: Rng>(
        num_hidden: usize,
        num_visible: usize,
        stddev: f64,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        validate_widths(num_hidden, num_visible)?;
        let flat = random_matrix(num_hidden * num_visible, stddev, rng)?;
        Self::from_weights(num_hidden, num_visible, flat.to_vec())
    }

    /// Creates a layer from a flattened row-major weight matrix.
    ///
    /// # Parameters
    ///
    /// - `num_hidden` - Hidden width including the bias unit
    /// - `num_visible` - Visible width including the bias unit
    /// - `weights` - `num_hidden * num_visible` values, row `h` holding the weights of hidden unit `h`
    ///
    /// # Returns
    ///
    /// - `Ok(Rbm)` - The layer
    /// - `Err(ModelError::ShapeMismatch)` - If the length is not `num_hidden * num_visible`
    pub fn from_weights(
        num_hidden: usize,
        num_visible: usize,
        weights: Vec<f64>,
    ) -> Result<Self, ModelError> {
        validate_widths(num_hidden, num_visible)?;
        let len = weights.len();
        let weights = Array2::from_shape_vec((num_hidden, num_visible), weights).map_err(|_| {
            ModelError::ShapeMismatch(format!(
                "weight matrix of length {} does not fit {} hidden x {} visible units",
                len, num_hidden, num_visible
            ))
        })?;
        Ok(Self::with_matrix(weights))
    }

    fn with_matrix(weights: Array2<f64>) -> Self {
        let (num_hidden, num_visible) = weights.dim();
        let mut rbm = Rbm {
            weights,
            hidden: Array1::zeros(num_hidden),
            visible: Array1::zeros(num_visible),
            positive: Array1::zeros(num_hidden),
            negative: Array1::zeros(num_hidden),
        };
        clamp_bias(&mut rbm.hidden);
        clamp_bias(&mut rbm.visible);
        rbm
    }

    /// Hidden width including the bias unit.
    pub fn num_hidden(&self) -> usize {
        self.weights.nrows()
    }

    /// Visible width including the bias unit.
    pub fn num_visible(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Weight matrix flattened in row-major order, the persisted form.
    pub fn flat_weights(&self) -> Vec<f64> {
        self.weights.iter().copied().collect()
    }

    pub fn hidden(&self) -> ArrayView1<'_, f64> {
        self.hidden.view()
    }

    pub fn visible(&self) -> ArrayView1<'_, f64> {
        self.visible.view()
    }

    /// Hidden probabilities computed from the data by the last [`Rbm::up`] call.
    pub fn positive(&self) -> ArrayView1<'_, f64> {
        self.positive.view()
    }

    /// Hidden probabilities at the end of the Gibbs chain of the last [`Rbm::up`] call.
    pub fn negative(&self) -> ArrayView1<'_, f64> {
        self.negative.view()
    }

    /// Samples the hidden units from `visible`, then runs `n` Gibbs cycles.
    ///
    /// Afterwards `positive` (P) holds the hidden probabilities driven by `visible`,
    /// `negative` (Q) the hidden probabilities after the last cycle (a copy of P when `n == 0`),
    /// `hidden` (H) the current hidden sample and `visible` (V) the last visible sample.
    ///
    /// # Parameters
    ///
    /// - `n` - Number of visible/hidden Gibbs cycles
    /// - `visible` - Visible vector, bias included
    /// - `rng` - Random source
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Buffers updated
    /// - `Err(ModelError::ShapeMismatch)` - If `visible.len() != num_visible`
    pub fn up<S, R>(
        &mut self,
        n: usize,
        visible: &ArrayBase<S, Ix1>,
        rng: &mut R,
    ) -> Result<(), ModelError>
    where
        S: Data<Elem = f64>,
        R: Rng,
    {
        self.sample_hidden(visible, rng)?;
        self.negative.assign(&self.positive);

        for _ in 0..n {
            self.sample_visible(rng)?;
            self.visible_to_hidden(rng)?;
        }
        Ok(())
    }

    /// Generates visible samples from the current hidden pattern without learning.
    ///
    /// Runs `n` hidden -> visible -> hidden cycles followed by a final hidden -> visible pass.
    /// Load the starting pattern with [`Rbm::clamp_hidden`].
    ///
    /// # Returns
    ///
    /// - `Ok(ArrayView1<f64>)` - The final visible sample, bias included
    pub fn down<R: Rng>(
        &mut self,
        n: usize,
        rng: &mut R,
    ) -> Result<ArrayView1<'_, f64>, ModelError> {
        for _ in 0..n {
            self.sample_visible(rng)?;
            self.visible_to_hidden(rng)?;
        }
        self.sample_visible(rng)?;
        Ok(self.visible.view())
    }

    /// Loads a hidden pattern into H. The bias slot is forced to `+1.0`.
    ///
    /// # Returns
    ///
    /// - `Err(ModelError::ShapeMismatch)` - If `pattern.len() != num_hidden`
    pub fn clamp_hidden<S>(&mut self, pattern: &ArrayBase<S, Ix1>) -> Result<(), ModelError>
    where
        S: Data<Elem = f64>,
    {
        if pattern.len() != self.num_hidden() {
            return Err(ModelError::ShapeMismatch(format!(
                "hidden pattern of length {} for a layer with {} hidden units",
                pattern.len(),
                self.num_hidden()
            )));
        }
        self.hidden.assign(pattern);
        clamp_bias(&mut self.hidden);
        Ok(())
    }

    /// Single upward pass: P = transfer(W, visible), then H is sampled from P and its bias clamped.
    ///
    /// # Returns
    ///
    /// - `Ok(ArrayView1<f64>)` - The hidden sample H, bias included
    /// - `Err(ModelError::ShapeMismatch)` - If `visible.len() != num_visible`
    pub fn sample_hidden<S, R>(
        &mut self,
        visible: &ArrayBase<S, Ix1>,
        rng: &mut R,
    ) -> Result<ArrayView1<'_, f64>, ModelError>
    where
        S: Data<Elem = f64>,
        R: Rng,
    {
        transfer(&self.weights, visible, &mut self.positive)?;
        sample(&self.positive, &mut self.hidden, rng)?;
        clamp_bias(&mut self.hidden);
        Ok(self.hidden.view())
    }

    /// Single downward pass: V is sampled from transfer_t(W, H) and its bias clamped.
    ///
    /// # Returns
    ///
    /// - `Ok(ArrayView1<f64>)` - The visible sample V, bias included
    pub fn sample_visible<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<ArrayView1<'_, f64>, ModelError> {
        transfer_t(&self.weights, &self.hidden, &mut self.visible)?;
        sample_in_place(&mut self.visible, rng);
        clamp_bias(&mut self.visible);
        Ok(self.visible.view())
    }

    fn visible_to_hidden<R: Rng>(&mut self, rng: &mut R) -> Result<(), ModelError> {
        transfer(&self.weights, &self.visible, &mut self.negative)?;
        sample(&self.negative, &mut self.hidden, rng)?;
        clamp_bias(&mut self.hidden);
        Ok(())
    }

    /// Runs one contrastive-divergence learning step against a training vector.
    ///
    /// Performs [`CD_SUB_ROUNDS`] sub-rounds; each runs `up(CD_GIBBS_STEPS, visible)` and then
    /// applies `W[h, v] += rate * visible[v] * (P[h] - Q[h])`.
    ///
    /// # Parameters
    ///
    /// - `visible` - Training vector whose last slot is the bias unit set to `+1.0`
    /// - `rate` - Learning rate
    /// - `rng` - Random source
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Weights updated
    /// - `Err(ModelError::ShapeMismatch)` - If `visible.len() != num_visible`
    /// - `Err(ModelError::PreconditionViolation)` - If the bias slot of `visible` is not `+1.0`
    pub fn learn_vector<S, R>(
        &mut self,
        visible: &ArrayBase<S, Ix1>,
        rate: f64,
        rng: &mut R,
    ) -> Result<(), ModelError>
    where
        S: Data<Elem = f64>,
        R: Rng,
    {
        check_shape(&self.weights, self.num_hidden(), visible.len())?;
        if visible[visible.len() - 1] != BIAS {
            return Err(ModelError::PreconditionViolation(format!(
                "training vector must end with the bias unit {:.1}, found {}",
                BIAS,
                visible[visible.len() - 1]
            )));
        }

        for _ in 0..CD_SUB_ROUNDS {
            self.up(CD_GIBBS_STEPS, visible, rng)?;

            Zip::from(self.weights.rows_mut())
                .and(&self.positive)
                .and(&self.negative)
                .for_each(|mut row, &p, &q| {
                    let delta = rate * (p - q);
                    row.zip_mut_with(visible, |w, &v| *w += delta * v);
                });
        }
        Ok(())
    }

    /// Image of `visible` handed to the layer above as training data.
    ///
    /// Runs `up(1, visible)` and returns the settled hidden probabilities Q with the bias slot
    /// clamped to `+1.0`.
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - Hidden probabilities, bias included
    /// - `Err(ModelError::ShapeMismatch)` - If `visible.len() != num_visible`
    pub fn hidden_image<S, R>(
        &mut self,
        visible: &ArrayBase<S, Ix1>,
        rng: &mut R,
    ) -> Result<Array1<f64>, ModelError>
    where
        S: Data<Elem = f64>,
        R: Rng,
    {
        self.up(1, visible, rng)?;
        let mut image = self.negative.clone();
        clamp_bias(&mut image);
        Ok(image)
    }

    /// Estimates how badly the layer reconstructs `visible`.
    ///
    /// Runs [`ERROR_TRIALS`] passes of `up(1, visible)` and counts, per pass, the non-bias
    /// visible positions whose sign flipped. The result is the mean count per pass; divide by
    /// the width to obtain a rate. Repeated calls give statistically close, not identical, values.
    ///
    /// # Returns
    ///
    /// - `Ok(f64)` - Mean number of disagreeing positions
    /// - `Err(ModelError::ShapeMismatch)` - If `visible.len() != num_visible`
    pub fn error<S, R>(
        &mut self,
        visible: &ArrayBase<S, Ix1>,
        rng: &mut R,
    ) -> Result<f64, ModelError>
    where
        S: Data<Elem = f64>,
        R: Rng,
    {
        check_shape(&self.weights, self.num_hidden(), visible.len())?;
        let width = visible.len() - 1;
        let reference = visible.slice(s![..width]);

        let mut total = 0usize;
        for _ in 0..ERROR_TRIALS {
            self.up(1, visible, rng)?;
            total += sign_disagreements(&reference, &self.visible.slice(s![..width]));
        }
        Ok(total as f64 / ERROR_TRIALS as f64)
    }

    /// Sum of squared weights, a training-health diagnostic.
    pub fn norm(&self) -> f64 {
        self.weights.iter().map(|w| w * w).sum()
    }

    /// Multiplies every weight by `1 - factor`.
    pub fn decay(&mut self, factor: f64) {
        let keep = 1.0 - factor;
        self.weights.mapv_inplace(|w| w * keep);
    }
}

fn validate_widths(num_hidden: usize, num_visible: usize) -> Result<(), ModelError> {
    if num_hidden < 2 || num_visible < 2 {
        return Err(ModelError::ShapeMismatch(format!(
            "a layer needs at least one unit plus bias on each side, got {} hidden x {} visible",
            num_hidden, num_visible
        )));
    }
    Ok(())
}
