use log::debug;

use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

/// Softmax cross-entropy loss and gradient using explicit loops over
/// examples and classes. This is the reference implementation.
///
/// Inputs have dimension D, there are C classes, and we operate on a
/// minibatch of N examples:
/// - `w`   — weights, shape (D, C)
/// - `x`   — minibatch, shape (N, D)
/// - `y`   — labels, length N; `y[i] = c` means `x[i]` has label `c < C`
/// - `reg` — L2 regularization strength, applied as `reg * sum(W^2)`
///
/// Returns `(loss, dW)` where `dW` has the shape of `w`.
///
/// Scores are shifted by their row maximum before exponentiating, and the
/// per-example term is evaluated as `log(sum(exp(s))) - s[y]` so it stays
/// finite even when the true-class probability underflows.
pub fn softmax_loss_naive(
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Matrix)> {
    validate_inputs(w, x, y, reg)?;
    debug!("softmax_loss_naive: N={} D={} C={} reg={reg}", x.rows, w.rows, w.cols);

    let num_train = x.rows;
    let num_classes = w.cols;
    let dim = w.rows;

    let mut loss = 0.0;
    let mut dw = Matrix::zeros(dim, num_classes);
    let mut scores = vec![0.0; num_classes];

    for i in 0..num_train {
        let xi = x.row(i);

        for (j, s) in scores.iter_mut().enumerate() {
            *s = 0.0;
            for k in 0..dim {
                *s += xi[k] * w.data[k][j];
            }
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut sum_exp = 0.0;
        for s in scores.iter_mut() {
            *s -= max;
            sum_exp += s.exp();
        }

        loss += sum_exp.ln() - scores[y[i]];

        for (j, &s) in scores.iter().enumerate() {
            let p = s.exp() / sum_exp;
            let coeff = if j == y[i] { p - 1.0 } else { p };
            for k in 0..dim {
                dw.data[k][j] += coeff * xi[k];
            }
        }
    }

    let inv_n = 1.0 / num_train as f64;
    loss *= inv_n;
    loss += reg * w.sum_squares();

    for k in 0..dim {
        for j in 0..num_classes {
            dw.data[k][j] = dw.data[k][j] * inv_n + 2.0 * reg * w.data[k][j];
        }
    }

    Ok((loss, dw))
}

/// Softmax cross-entropy loss and gradient using whole-matrix operations.
///
/// Same inputs and outputs as [`softmax_loss_naive`]; results agree with it
/// to within floating-point rounding.
pub fn softmax_loss_vectorized(
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Matrix)> {
    validate_inputs(w, x, y, reg)?;
    debug!("softmax_loss_vectorized: N={} D={} C={} reg={reg}", x.rows, w.rows, w.cols);

    let num_train = x.rows as f64;

    let scores = x * w;
    let shifted = scores.sub_column(&scores.row_max());
    let exp_scores = shifted.map(f64::exp);
    // One sum per row: zipped with the correct-class scores for the loss,
    // broadcast as an (N, 1) column when normalizing.
    let sums = exp_scores.row_sums();

    let correct = shifted.gather(y);
    let data_loss: f64 = sums.iter().zip(&correct).map(|(s, c)| s.ln() - c).sum();

    let mut probs = exp_scores.div_column(&sums);
    probs.sub_at(y, 1.0);

    let dw = &(&x.transpose() * &probs).scale(1.0 / num_train) + &w.scale(2.0 * reg);
    let loss = data_loss / num_train + reg * w.sum_squares();

    Ok((loss, dw))
}

/// Checks every precondition of the loss functions, in a fixed order, before
/// any arithmetic happens.
pub fn validate_inputs(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<()> {
    if x.rows == 0 {
        return Err(SoftmaxError::EmptyBatch);
    }
    if x.cols != w.rows {
        return Err(SoftmaxError::shape("X", x.shape(), "W", w.shape()));
    }
    if y.len() != x.rows {
        return Err(SoftmaxError::LabelCountMismatch { examples: x.rows, labels: y.len() });
    }
    if let Some((index, &label)) = y.iter().enumerate().find(|(_, &label)| label >= w.cols) {
        return Err(SoftmaxError::LabelOutOfRange { index, label, classes: w.cols });
    }
    if !(reg.is_finite() && reg >= 0.0) {
        return Err(SoftmaxError::InvalidRegularization(reg));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    type LossFn = fn(&Matrix, &Matrix, &[usize], f64) -> Result<(f64, Matrix)>;

    const STRATEGIES: [(&str, LossFn); 2] = [
        ("naive", softmax_loss_naive),
        ("vectorized", softmax_loss_vectorized),
    ];

    fn random_problem(rng: &mut StdRng, n: usize, d: usize, c: usize) -> (Matrix, Matrix, Vec<usize>) {
        let w = Matrix::gaussian_with(d, c, 0.1, rng);
        let x = Matrix::gaussian_with(n, d, 1.0, rng);
        let y = (0..n).map(|_| rng.gen_range(0..c)).collect();
        (w, x, y)
    }

    #[test]
    fn two_by_two_scenario() {
        let w = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let x = Matrix::from_data(vec![vec![1.0, 1.0]]);

        for (name, f) in STRATEGIES {
            let (loss, dw) = f(&w, &x, &[0], 0.0).unwrap();
            assert_relative_eq!(loss, 2.0_f64.ln(), epsilon = 1e-12);
            let expected = [[-0.5, 0.5], [-0.5, 0.5]];
            for k in 0..2 {
                for j in 0..2 {
                    assert!(
                        (dw.get(k, j) - expected[k][j]).abs() < 1e-12,
                        "{name}: dW[{k}][{j}] = {}", dw.get(k, j)
                    );
                }
            }
        }
    }

    #[test]
    fn strategies_agree_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(231);
        for &(n, d, c, reg) in &[(1, 1, 1, 0.0), (5, 3, 4, 0.1), (20, 7, 10, 5e-3), (3, 12, 2, 1.0)] {
            let (w, x, y) = random_problem(&mut rng, n, d, c);
            let (loss_a, grad_a) = softmax_loss_naive(&w, &x, &y, reg).unwrap();
            let (loss_b, grad_b) = softmax_loss_vectorized(&w, &x, &y, reg).unwrap();
            assert!((loss_a - loss_b).abs() < 1e-7, "loss {loss_a} vs {loss_b}");
            assert!(grad_a.max_abs_diff(&grad_b) < 1e-7);
        }
    }

    #[test]
    fn small_weights_give_loss_near_ln_classes() {
        let mut rng = StdRng::seed_from_u64(1);
        let w = Matrix::gaussian_with(10, 10, 1e-4, &mut rng);
        let x = Matrix::gaussian_with(50, 10, 1.0, &mut rng);
        let y: Vec<usize> = (0..50).map(|i| i % 10).collect();

        let (loss, _) = softmax_loss_vectorized(&w, &x, &y, 0.0).unwrap();
        assert_relative_eq!(loss, 10.0_f64.ln(), epsilon = 1e-2);
    }

    #[test]
    fn large_scores_stay_finite() {
        let mut rng = StdRng::seed_from_u64(9);
        let (w, x, y) = random_problem(&mut rng, 8, 5, 6);
        let w = w.scale(1e5);

        let (loss_a, grad_a) = softmax_loss_naive(&w, &x, &y, 0.0).unwrap();
        let (loss_b, grad_b) = softmax_loss_vectorized(&w, &x, &y, 0.0).unwrap();
        let scores = &x * &w;
        assert!(scores.data.iter().flatten().any(|s| s.abs() >= 1e4));

        for (loss, grad) in [(loss_a, &grad_a), (loss_b, &grad_b)] {
            assert!(loss.is_finite(), "loss = {loss}");
            assert!(grad.is_finite());
        }
        assert_relative_eq!(loss_a, loss_b, max_relative = 1e-9);
    }

    #[test]
    fn zero_inputs_leave_only_regularization() {
        let mut rng = StdRng::seed_from_u64(4);
        let w = Matrix::gaussian_with(3, 4, 1.0, &mut rng);
        let x = Matrix::zeros(2, 3);
        let reg = 0.25;

        for (_, f) in STRATEGIES {
            let (loss, dw) = f(&w, &x, &[1, 3], reg).unwrap();
            // Uniform softmax contributes ln(C); the gradient data term vanishes.
            assert_relative_eq!(loss, 4.0_f64.ln() + reg * w.sum_squares(), epsilon = 1e-12);
            assert!(dw.max_abs_diff(&w.scale(2.0 * reg)) < 1e-12);
        }
    }

    #[test]
    fn single_class_has_zero_data_loss() {
        let mut rng = StdRng::seed_from_u64(5);
        let (w, x, y) = random_problem(&mut rng, 6, 4, 1);
        let reg = 0.3;

        for (_, f) in STRATEGIES {
            let (loss, dw) = f(&w, &x, &y, reg).unwrap();
            assert_relative_eq!(loss, reg * w.sum_squares(), epsilon = 1e-12);
            assert!(dw.max_abs_diff(&w.scale(2.0 * reg)) < 1e-12);
        }
    }

    #[test]
    fn inputs_are_not_mutated() {
        let mut rng = StdRng::seed_from_u64(6);
        let (w, x, y) = random_problem(&mut rng, 4, 3, 3);
        let (w0, x0, y0) = (w.clone(), x.clone(), y.clone());

        for (_, f) in STRATEGIES {
            let (_, dw) = f(&w, &x, &y, 0.5).unwrap();
            assert_eq!(dw.shape(), w.shape());
        }
        assert_eq!((w, x, y), (w0, x0, y0));
    }

    #[test]
    fn rejects_invalid_inputs() {
        let w = Matrix::zeros(3, 2);
        let x = Matrix::zeros(2, 3);

        for (_, f) in STRATEGIES {
            assert_eq!(f(&w, &Matrix::zeros(0, 3), &[], 0.0).unwrap_err(), SoftmaxError::EmptyBatch);
            assert!(matches!(
                f(&w, &Matrix::zeros(2, 4), &[0, 1], 0.0).unwrap_err(),
                SoftmaxError::ShapeMismatch { left_cols: 4, right_rows: 3, .. }
            ));
            assert_eq!(
                f(&w, &x, &[0], 0.0).unwrap_err(),
                SoftmaxError::LabelCountMismatch { examples: 2, labels: 1 }
            );
            assert_eq!(
                f(&w, &x, &[1, 2], 0.0).unwrap_err(),
                SoftmaxError::LabelOutOfRange { index: 1, label: 2, classes: 2 }
            );
            assert_eq!(f(&w, &x, &[0, 1], -1.0).unwrap_err(), SoftmaxError::InvalidRegularization(-1.0));
            assert!(matches!(
                f(&w, &x, &[0, 1], f64::NAN).unwrap_err(),
                SoftmaxError::InvalidRegularization(_)
            ));
        }
    }

    #[test]
    fn error_messages_name_the_violation() {
        let err = SoftmaxError::LabelOutOfRange { index: 3, label: 7, classes: 5 };
        assert_eq!(err.to_string(), "label y[3] = 7 is out of range for 5 classes");
    }
}
