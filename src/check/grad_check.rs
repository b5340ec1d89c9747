use log::{debug, warn};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Relative error above which a checked entry is reported at `warn` level.
const WARN_RELATIVE_ERROR: f64 = 1e-5;

/// One compared entry of a gradient check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradSample {
    pub row: usize,
    pub col: usize,
    pub analytic: f64,
    pub numeric: f64,
    pub relative_error: f64,
}

/// Outcome of comparing an analytic gradient against central differences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradCheckReport {
    pub samples: Vec<GradSample>,
    pub max_relative_error: f64,
}

impl GradCheckReport {
    fn push(&mut self, sample: GradSample) {
        self.max_relative_error = self.max_relative_error.max(sample.relative_error);
        self.samples.push(sample);
    }

    /// True if every sample is within `tolerance` relative error, or within
    /// `abs_floor` absolute error (entries whose true value is ~0 make the
    /// relative error meaningless).
    pub fn passes(&self, tolerance: f64, abs_floor: f64) -> bool {
        self.samples.iter().all(|s| {
            s.relative_error <= tolerance || (s.analytic - s.numeric).abs() <= abs_floor
        })
    }
}

/// `|a - b| / (|a| + |b|)`, or 0 when both are exactly zero.
pub fn relative_error(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff == 0.0 {
        return 0.0;
    }
    diff / (a.abs() + b.abs()).max(f64::MIN_POSITIVE)
}

/// Central-difference estimate of `df/dw[row][col]`.
///
/// `w` is perturbed in place and restored before returning.
fn central_difference<F>(f: &mut F, w: &mut Matrix, row: usize, col: usize, h: f64) -> Result<f64>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    let old = w.get(row, col);

    w.set(row, col, old + h);
    let plus = f(w);
    w.set(row, col, old - h);
    let minus = f(w);
    w.set(row, col, old);

    Ok((plus? - minus?) / (2.0 * h))
}

fn check_step(h: f64) -> Result<()> {
    if h.is_finite() && h > 0.0 {
        Ok(())
    } else {
        Err(SoftmaxError::InvalidStep(h))
    }
}

/// Numerical gradient of `f` at `w`, one central difference per entry.
pub fn numerical_gradient<F>(mut f: F, w: &Matrix, h: f64) -> Result<Matrix>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    check_step(h)?;
    let mut perturbed = w.clone();
    let mut grad = Matrix::zeros(w.rows, w.cols);
    for i in 0..w.rows {
        for j in 0..w.cols {
            let g = central_difference(&mut f, &mut perturbed, i, j, h)?;
            grad.set(i, j, g);
        }
    }
    Ok(grad)
}

/// Compares `analytic` against central differences at every entry of `w`.
pub fn grad_check_full<F>(f: F, w: &Matrix, analytic: &Matrix, h: f64) -> Result<GradCheckReport>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    check_shapes(w, analytic)?;
    let entries: Vec<(usize, usize)> = (0..w.rows)
        .flat_map(|i| (0..w.cols).map(move |j| (i, j)))
        .collect();
    check_entries(f, w, analytic, &entries, h)
}

/// Compares `analytic` against central differences at `samples` entries of
/// `w` chosen uniformly at random (with replacement).
pub fn grad_check_sparse<F, R>(
    f: F,
    w: &Matrix,
    analytic: &Matrix,
    samples: usize,
    h: f64,
    rng: &mut R,
) -> Result<GradCheckReport>
where
    F: FnMut(&Matrix) -> Result<f64>,
    R: Rng + ?Sized,
{
    check_shapes(w, analytic)?;
    if w.rows == 0 || w.cols == 0 {
        return Ok(GradCheckReport::default());
    }
    let entries: Vec<(usize, usize)> = (0..samples)
        .map(|_| (rng.gen_range(0..w.rows), rng.gen_range(0..w.cols)))
        .collect();
    check_entries(f, w, analytic, &entries, h)
}

fn check_shapes(w: &Matrix, analytic: &Matrix) -> Result<()> {
    if w.shape() != analytic.shape() {
        return Err(SoftmaxError::shape("W", w.shape(), "analytic gradient", analytic.shape()));
    }
    Ok(())
}

fn check_entries<F>(
    mut f: F,
    w: &Matrix,
    analytic: &Matrix,
    entries: &[(usize, usize)],
    h: f64,
) -> Result<GradCheckReport>
where
    F: FnMut(&Matrix) -> Result<f64>,
{
    check_step(h)?;
    let mut perturbed = w.clone();
    let mut report = GradCheckReport::default();

    for &(row, col) in entries {
        let numeric = central_difference(&mut f, &mut perturbed, row, col, h)?;
        let exact = analytic.get(row, col);
        let rel = relative_error(exact, numeric);

        if rel > WARN_RELATIVE_ERROR {
            warn!("grad check ({row}, {col}): analytic {exact:e} numeric {numeric:e} rel {rel:e}");
        } else {
            debug!("grad check ({row}, {col}): analytic {exact:e} numeric {numeric:e} rel {rel:e}");
        }

        report.push(GradSample { row, col, analytic: exact, numeric, relative_error: rel });
    }

    Ok(report)
}
