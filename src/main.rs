// Sanity-check binary: evaluates both softmax implementations on one problem,
// compares them, and runs a sparse gradient check.
//
//   cargo run -- [problem.json]
//
// Without a path the problem is generated from the SOFTMAX_* environment
// variables (see `ProblemConfig::from_env`). Set RUST_LOG=debug for details.
use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use rand::prelude::*;
use serde_json::json;

use ferrite_softmax::{
    grad_check_sparse, softmax_loss_naive, softmax_loss_vectorized, Problem, ProblemConfig,
};

const GRAD_CHECK_STEP: f64 = 1e-5;
const AGREEMENT_TOLERANCE: f64 = 1e-7;

fn main() -> Result<()> {
    env_logger::init();

    let config = ProblemConfig::from_env().context("reading SOFTMAX_* configuration")?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let problem = match env::args().nth(1) {
        Some(path) => {
            info!("loading problem from {path}");
            Problem::load_json(&path).with_context(|| format!("loading problem from {path}"))?
        }
        None => Problem::random(&config, &mut rng).context("generating random problem")?,
    };
    problem.validate().context("invalid problem")?;

    let Problem { weights, inputs, labels, reg } = &problem;
    info!(
        "problem: N={} D={} C={} reg={reg}",
        inputs.rows, weights.rows, weights.cols
    );

    let t_naive = Instant::now();
    let (loss_naive, grad_naive) = softmax_loss_naive(weights, inputs, labels, *reg)?;
    let naive_ms = t_naive.elapsed().as_secs_f64() * 1e3;

    let t_vec = Instant::now();
    let (loss_vec, grad_vec) = softmax_loss_vectorized(weights, inputs, labels, *reg)?;
    let vectorized_ms = t_vec.elapsed().as_secs_f64() * 1e3;

    let loss_difference = (loss_naive - loss_vec).abs();
    let grad_difference = grad_naive.max_abs_diff(&grad_vec);
    if loss_difference > AGREEMENT_TOLERANCE || grad_difference > AGREEMENT_TOLERANCE {
        warn!("implementations disagree: loss {loss_difference:e}, gradient {grad_difference:e}");
    }

    let report = grad_check_sparse(
        |w| softmax_loss_vectorized(w, inputs, labels, *reg).map(|(loss, _)| loss),
        weights,
        &grad_vec,
        config.grad_samples,
        GRAD_CHECK_STEP,
        &mut rng,
    )?;

    let out = json!({
        "examples": inputs.rows,
        "features": weights.rows,
        "classes": weights.cols,
        "reg": reg,
        "loss_naive": loss_naive,
        "loss_vectorized": loss_vec,
        "loss_difference": loss_difference,
        "grad_difference": grad_difference,
        "naive_ms": naive_ms,
        "vectorized_ms": vectorized_ms,
        "sanity_loss": (problem.classes() as f64).ln(),
        "grad_check_max_relative_error": report.max_relative_error,
        "grad_check": report.samples,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    Ok(())
}
