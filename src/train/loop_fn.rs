use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{debug, info};
use rand::prelude::*;

use crate::classifier::linear::LinearClassifier;
use crate::error::{Result, SoftmaxError};
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;
use crate::train::iteration_stats::IterationStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `classifier` with minibatch SGD and returns the loss of every
/// completed iteration.
///
/// # Arguments
/// - `classifier` — mutable reference; its weights are updated in place
/// - `x`          — training data, shape (N, D)
/// - `y`          — labels, length N, each in [0, C)
/// - `config`     — hyperparameters, optional progress channel, optional stop flag
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Errors
/// `EmptyBatch` / `LabelCountMismatch` for bad data, `InvalidConfig` for a
/// bad learning rate or batch size, and any error from the loss evaluator.
pub fn train_loop(
    classifier: &mut LinearClassifier,
    x: &Matrix,
    y: &[usize],
    config: &TrainConfig,
) -> Result<Vec<f64>> {
    config.validate()?;
    if x.rows == 0 {
        return Err(SoftmaxError::EmptyBatch);
    }
    if y.len() != x.rows {
        return Err(SoftmaxError::LabelCountMismatch { examples: x.rows, labels: y.len() });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let optimizer = Sgd::new(config.learning_rate);
    let mut history = Vec::with_capacity(config.iterations);

    info!(
        "training: N={} D={} C={} iterations={} batch_size={} lr={} reg={} strategy={:?}",
        x.rows, classifier.dim(), classifier.classes(), config.iterations,
        config.batch_size, config.learning_rate, config.reg, config.strategy
    );

    for iteration in 1..=config.iterations {
        if stop_requested(config) {
            debug!("stop flag set before iteration {iteration}");
            break;
        }

        let t_start = Instant::now();

        // ── Sample a minibatch and take one step ───────────────────────────
        let (x_batch, y_batch) = sample_batch(x, y, config.batch_size, &mut rng);
        let (loss, grad) = classifier.loss(&x_batch, &y_batch, config.reg, config.strategy)?;
        optimizer.step(&mut classifier.weights, &grad)?;
        history.push(loss);

        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        if config.log_every > 0 && iteration % config.log_every == 0 {
            info!("iteration {iteration} / {}: loss {loss:.6}", config.iterations);
        }

        // ── Emit progress ─────────────────────────────────────────────────
        if let Some(ref tx) = config.progress_tx {
            let stats = IterationStats {
                iteration,
                total_iterations: config.iterations,
                loss,
                elapsed_ms,
            };
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                debug!("progress receiver dropped after iteration {iteration}");
                break;
            }
        }
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config.stop_flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Draws `batch_size` examples uniformly with replacement.
fn sample_batch<R: Rng>(
    x: &Matrix,
    y: &[usize],
    batch_size: usize,
    rng: &mut R,
) -> (Matrix, Vec<usize>) {
    let indices: Vec<usize> = (0..batch_size).map(|_| rng.gen_range(0..x.rows)).collect();
    let y_batch = indices.iter().map(|&i| y[i]).collect();
    (x.select_rows(&indices), y_batch)
}
