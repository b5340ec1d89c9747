use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, SoftmaxError};
use crate::loss::strategy::LossStrategy;
use crate::math::matrix::Matrix;

/// Standard deviation of the Gaussian used to initialise fresh weights.
pub const DEFAULT_WEIGHT_SCALE: f64 = 1e-3;

/// Linear softmax classifier: `scores = X · W`, one column of `W` per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Matrix,
}

impl LinearClassifier {
    /// Fresh classifier with `DEFAULT_WEIGHT_SCALE` Gaussian weights.
    pub fn new(dim: usize, classes: usize) -> LinearClassifier {
        LinearClassifier::with_rng(dim, classes, DEFAULT_WEIGHT_SCALE, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        dim: usize,
        classes: usize,
        scale: f64,
        rng: &mut R,
    ) -> LinearClassifier {
        LinearClassifier { weights: Matrix::gaussian_with(dim, classes, scale, rng) }
    }

    pub fn from_weights(weights: Matrix) -> LinearClassifier {
        LinearClassifier { weights }
    }

    pub fn dim(&self) -> usize {
        self.weights.rows
    }

    pub fn classes(&self) -> usize {
        self.weights.cols
    }

    /// Loss and weight gradient on a minibatch.
    pub fn loss(
        &self,
        x: &Matrix,
        y: &[usize],
        reg: f64,
        strategy: LossStrategy,
    ) -> Result<(f64, Matrix)> {
        strategy.compute(&self.weights, x, y, reg)
    }

    /// Raw class scores, shape (N, C).
    pub fn scores(&self, x: &Matrix) -> Result<Matrix> {
        if x.cols != self.weights.rows {
            return Err(SoftmaxError::shape("X", x.shape(), "W", self.weights.shape()));
        }
        Ok(x * &self.weights)
    }

    /// Predicted class per row of `x`.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        Ok(self.scores(x)?.argmax_rows())
    }

    /// Fraction of rows of `x` whose prediction equals the label.
    pub fn accuracy(&self, x: &Matrix, y: &[usize]) -> Result<f64> {
        if y.len() != x.rows {
            return Err(SoftmaxError::LabelCountMismatch { examples: x.rows, labels: y.len() });
        }
        if y.is_empty() {
            return Ok(0.0);
        }
        let predicted = self.predict(x)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Serializes the classifier weights to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Deserializes a classifier from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<LinearClassifier> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let classifier: LinearClassifier = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        // The stored header must match the data; it is kept so C survives D = 0.
        let Matrix { rows, cols, data } = classifier.weights;
        let weights = Matrix::try_from_parts(rows, cols, data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(LinearClassifier { weights })
    }
}
