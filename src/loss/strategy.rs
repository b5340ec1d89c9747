use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::softmax::{softmax_loss_naive, softmax_loss_vectorized};
use crate::math::matrix::Matrix;

/// Selects which implementation evaluates the softmax loss.
///
/// - `ElementWise`: explicit loops over examples and classes; the reference.
/// - `Bulk`: whole-matrix operations; faster, same results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossStrategy {
    ElementWise,
    #[default]
    Bulk,
}

impl LossStrategy {
    /// Returns `(loss, dW)` computed by the selected implementation.
    pub fn compute(self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
        match self {
            LossStrategy::ElementWise => softmax_loss_naive(w, x, y, reg),
            LossStrategy::Bulk => softmax_loss_vectorized(w, x, y, reg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&LossStrategy::ElementWise).unwrap(), "\"element_wise\"");
        let parsed: LossStrategy = serde_json::from_str("\"bulk\"").unwrap();
        assert_eq!(parsed, LossStrategy::Bulk);
    }

    #[test]
    fn dispatches_to_matching_implementation() {
        let w = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let x = Matrix::from_data(vec![vec![1.0, 1.0]]);
        for strategy in [LossStrategy::ElementWise, LossStrategy::Bulk] {
            let (loss, _) = strategy.compute(&w, &x, &[1], 0.0).unwrap();
            assert!((loss - 2.0_f64.ln()).abs() < 1e-12);
        }
    }
}
