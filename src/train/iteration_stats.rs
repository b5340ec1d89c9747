use serde::{Serialize, Deserialize};

/// Per-iteration statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `IterationStats` value after every SGD step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationStats {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Total iterations requested for this run.
    pub total_iterations: usize,
    /// Minibatch loss (data term plus regularization) before the step.
    pub loss: f64,
    /// Wall-clock duration of this step in milliseconds.
    pub elapsed_ms: u64,
}
