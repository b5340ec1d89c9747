use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one vanilla gradient-descent update: `W -= lr * dW`.
    pub fn step(&self, weights: &mut Matrix, grad: &Matrix) -> Result<()> {
        if weights.shape() != grad.shape() {
            return Err(SoftmaxError::shape("W", weights.shape(), "dW", grad.shape()));
        }
        for (w_row, g_row) in weights.data.iter_mut().zip(&grad.data) {
            for (w, g) in w_row.iter_mut().zip(g_row) {
                *w -= self.learning_rate * g;
            }
        }
        Ok(())
    }
}
