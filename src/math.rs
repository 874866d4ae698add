use crate::error::ModelError;
use ndarray::{Array1, ArrayBase, ArrayView1, Axis, Data, DataMut, Ix1, Ix2, s};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Value of the always-on bias unit that closes every visible and hidden vector.
pub const BIAS: f64 = 1.0;
/// Encoding of an "on" binary unit.
pub const ON: f64 = 1.0;
/// Encoding of an "off" binary unit. Units are bipolar, so "off" is -1 rather than 0.
pub const OFF: f64 = -1.0;

/// Computes the logistic squashing function `1 / (1 + e^-x)`.
///
/// Negative inputs are evaluated as `e^x / (1 + e^x)` so that `e^-x` is never formed
/// for large negative `x`.
///
/// # Parameters
///
/// - `x` - Activation sum to squash
///
/// # Returns
///
/// - `f64` - Activation probability in the interval (0, 1)
///
/// # Examples
/// ```rust
/// use rbmstack::math::logistic;
///
/// assert!((logistic(0.0) - 0.5).abs() < 1e-12);
/// assert!(logistic(-800.0) >= 0.0);
/// assert!(logistic(800.0) <= 1.0);
/// ```
#[inline]
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Verifies that `matrix` has exactly `rows * cols` entries laid out as `rows x cols`.
///
/// # Parameters
///
/// - `matrix` - Weight matrix to check
/// - `rows` - Expected number of rows (hidden side, bias included)
/// - `cols` - Expected number of columns (visible side, bias included)
///
/// # Returns
///
/// - `Ok(())` - If the shape is consistent
/// - `Err(ModelError::ShapeMismatch)` - If it is not, or if either side is empty
pub fn check_shape<S>(
    matrix: &ArrayBase<S, Ix2>,
    rows: usize,
    cols: usize,
) -> Result<(), ModelError>
where
    S: Data<Elem = f64>,
{
    if matrix.dim() != (rows, cols) || rows == 0 || cols == 0 {
        return Err(ModelError::ShapeMismatch(format!(
            "matrix {} ({}x{}) can't multiply {} into {}",
            matrix.len(),
            matrix.nrows(),
            matrix.ncols(),
            cols,
            rows
        )));
    }
    Ok(())
}

/// Propagates a visible vector up to hidden activation probabilities.
///
/// Computes `dst[h] = logistic(sum_v matrix[h, v] * src[v])` for every hidden unit except
/// the last one, which is the bias slot. The bias slot is set to exactly `1.0` (the
/// always-on unit fires with certainty) and is never derived from the weighted sum.
///
/// # Parameters
///
/// - `matrix` - Weight matrix of shape `(dst.len(), src.len())`
/// - `src` - Visible vector, bias included
/// - `dst` - Output buffer for hidden probabilities, bias slot included
///
/// # Returns
///
/// - `Ok(())` - `dst` holds probabilities
/// - `Err(ModelError::ShapeMismatch)` - If `matrix.len() != dst.len() * src.len()`
///
/// # Examples
/// ```rust
/// use ndarray::{Array1, array};
/// use rbmstack::math::transfer;
///
/// let weights = array![[1.0, -1.0, 0.0], [0.5, 0.5, 0.5]];
/// let visible = array![1.0, 1.0, 1.0];
/// let mut hidden = Array1::<f64>::zeros(2);
/// transfer(&weights, &visible, &mut hidden).unwrap();
/// assert!((hidden[0] - 0.5).abs() < 1e-12);
/// assert_eq!(hidden[1], 1.0);
/// ```
pub fn transfer<S1, S2, S3>(
    matrix: &ArrayBase<S1, Ix2>,
    src: &ArrayBase<S2, Ix1>,
    dst: &mut ArrayBase<S3, Ix1>,
) -> Result<(), ModelError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: DataMut<Elem = f64>,
{
    check_shape(matrix, dst.len(), src.len())?;
    let bias_slot = dst.len() - 1;

    for (h, (row, out)) in matrix.outer_iter().zip(dst.iter_mut()).enumerate() {
        *out = if h == bias_slot {
            BIAS
        } else {
            logistic(row.dot(src))
        };
    }
    Ok(())
}

/// Propagates a hidden vector down to visible activation probabilities.
///
/// The transposed counterpart of [`transfer`]: `dst[v] = logistic(sum_h matrix[h, v] * src[h])`
/// for every visible unit except the bias slot, which is set to `1.0`. The hidden bias unit in
/// the last slot of `src` is left out of the sum.
///
/// # Parameters
///
/// - `matrix` - Weight matrix of shape `(src.len(), dst.len())`
/// - `src` - Hidden vector, bias included
/// - `dst` - Output buffer for visible probabilities, bias slot included
///
/// # Returns
///
/// - `Ok(())` - `dst` holds probabilities
/// - `Err(ModelError::ShapeMismatch)` - If `matrix.len() != src.len() * dst.len()`
pub fn transfer_t<S1, S2, S3>(
    matrix: &ArrayBase<S1, Ix2>,
    src: &ArrayBase<S2, Ix1>,
    dst: &mut ArrayBase<S3, Ix1>,
) -> Result<(), ModelError>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: DataMut<Elem = f64>,
{
    check_shape(matrix, src.len(), dst.len())?;
    let bias_slot = dst.len() - 1;
    let units = src.len() - 1;
    let hidden = src.slice(s![..units]);

    for (v, (column, out)) in matrix.axis_iter(Axis(1)).zip(dst.iter_mut()).enumerate() {
        *out = if v == bias_slot {
            BIAS
        } else {
            logistic(column.slice(s![..units]).dot(&hidden))
        };
    }
    Ok(())
}

#[inline]
fn draw_sign<R: Rng>(probability: f64, rng: &mut R) -> f64 {
    if rng.random::<f64>() < probability {
        ON
    } else {
        OFF
    }
}

/// Draws a bipolar sample from a vector of activation probabilities.
///
/// For each index a uniform value in `[0, 1)` is drawn; the unit is `+1.0` when that value is
/// below the probability and `-1.0` otherwise. The bias slot is not treated specially, so
/// callers clamp it with [`clamp_bias`] afterwards.
///
/// # Parameters
///
/// - `probabilities` - Activation probabilities
/// - `out` - Output buffer receiving the signs
/// - `rng` - Random source
///
/// # Returns
///
/// - `Ok(())` - `out` holds the sample
/// - `Err(ModelError::ShapeMismatch)` - If the two vectors differ in length
pub fn sample<S1, S2, R>(
    probabilities: &ArrayBase<S1, Ix1>,
    out: &mut ArrayBase<S2, Ix1>,
    rng: &mut R,
) -> Result<(), ModelError>
where
    S1: Data<Elem = f64>,
    S2: DataMut<Elem = f64>,
    R: Rng,
{
    if probabilities.len() != out.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "cannot sample {} probabilities into {} units",
            probabilities.len(),
            out.len()
        )));
    }

    for (o, &p) in out.iter_mut().zip(probabilities.iter()) {
        *o = draw_sign(p, rng);
    }
    Ok(())
}

/// Replaces every probability in `values` by a bipolar sample drawn from it.
///
/// Same rule as [`sample`], for the case where the output buffer is the probability buffer.
pub fn sample_in_place<S, R>(values: &mut ArrayBase<S, Ix1>, rng: &mut R)
where
    S: DataMut<Elem = f64>,
    R: Rng,
{
    values.mapv_inplace(|p| draw_sign(p, rng));
}

/// Overwrites the last element of an activation vector with the bias value `+1.0`.
#[inline]
pub fn clamp_bias<S>(vector: &mut ArrayBase<S, Ix1>)
where
    S: DataMut<Elem = f64>,
{
    let n = vector.len();
    if n > 0 {
        vector[n - 1] = BIAS;
    }
}

/// Returns a copy of `values` with the bias unit appended.
///
/// # Examples
/// ```rust
/// use rbmstack::math::add_bias;
///
/// let augmented = add_bias(&[1.0, -1.0]);
/// assert_eq!(augmented.to_vec(), vec![1.0, -1.0, 1.0]);
/// ```
pub fn add_bias(values: &[f64]) -> Array1<f64> {
    values
        .iter()
        .copied()
        .chain(std::iter::once(BIAS))
        .collect()
}

/// Returns a view of `vector` without its trailing bias slot.
pub fn strip_bias<S>(vector: &ArrayBase<S, Ix1>) -> ArrayView1<'_, f64>
where
    S: Data<Elem = f64>,
{
    vector.slice(s![..vector.len().saturating_sub(1)])
}

/// Counts the positions where the two vectors disagree in sign (`reference[i] * candidate[i] < 0`).
///
/// Zero entries never count as a disagreement. Only the overlapping prefix is compared.
pub fn sign_disagreements<S1, S2>(
    reference: &ArrayBase<S1, Ix1>,
    candidate: &ArrayBase<S2, Ix1>,
) -> usize
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
{
    reference
        .iter()
        .zip(candidate.iter())
        .filter(|(r, c)| *r * *c < 0.0)
        .count()
}

/// Generates `size` independent draws from a zero-mean Gaussian.
///
/// Used once, for the initial weights of a layer.
///
/// # Parameters
///
/// - `size` - Number of values to draw
/// - `stddev` - Standard deviation of the Gaussian
/// - `rng` - Random source
///
/// # Returns
///
/// - `Ok(Array1<f64>)` - The random values
/// - `Err(ModelError::InputValidationError)` - If `stddev` is negative or not finite
///
/// # Examples
/// ```rust
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use rbmstack::math::random_matrix;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let weights = random_matrix(15, 0.5, &mut rng).unwrap();
/// assert_eq!(weights.len(), 15);
/// ```
pub fn random_matrix<R: Rng>(
    size: usize,
    stddev: f64,
    rng: &mut R,
) -> Result<Array1<f64>, ModelError> {
    if !stddev.is_finite() || stddev < 0.0 {
        return Err(ModelError::InputValidationError(format!(
            "weight standard deviation must be finite and non-negative, got {}",
            stddev
        )));
    }
    let normal = Normal::new(0.0, stddev).map_err(|e| {
        ModelError::InputValidationError(format!("invalid weight distribution: {}", e))
    })?;

    Ok((0..size).map(|_| normal.sample(rng)).collect())
}
