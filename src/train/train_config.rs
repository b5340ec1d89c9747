use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{Result, SoftmaxError};
use crate::loss::strategy::LossStrategy;
use crate::train::iteration_stats::IterationStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `learning_rate` — SGD step size
/// - `reg`           — L2 regularization strength passed to the loss
/// - `iterations`    — number of SGD steps
/// - `batch_size`    — examples sampled (with replacement) per step
/// - `strategy`      — which softmax implementation evaluates the loss
/// - `seed`          — seeds minibatch sampling; `None` uses the thread RNG
/// - `log_every`     — log progress at `info` every this many iterations
///                     (`0` disables)
/// - `progress_tx`   — optional channel sender; one `IterationStats` per step.
///                     If the receiver is dropped the loop terminates early.
/// - `stop_flag`     — optional atomic flag; when set to `true` from another
///                     thread the loop terminates before the next step.
pub struct TrainConfig {
    pub learning_rate: f64,
    pub reg: f64,
    pub iterations: usize,
    pub batch_size: usize,
    pub strategy: LossStrategy,
    pub seed: Option<u64>,
    pub log_every: usize,
    pub progress_tx: Option<mpsc::Sender<IterationStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` using the bulk strategy, logging every
    /// 100 iterations, with no seed, progress channel or stop flag.
    pub fn new(learning_rate: f64, reg: f64, iterations: usize, batch_size: usize) -> Self {
        TrainConfig {
            learning_rate,
            reg,
            iterations,
            batch_size,
            strategy: LossStrategy::default(),
            seed: None,
            log_every: 100,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SoftmaxError::InvalidConfig(format!(
                "learning_rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(SoftmaxError::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        if !(self.reg.is_finite() && self.reg >= 0.0) {
            return Err(SoftmaxError::InvalidRegularization(self.reg));
        }
        Ok(())
    }
}
