use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::softmax::validate_inputs;
use crate::math::matrix::Matrix;
use crate::problem::config::ProblemConfig;

/// One complete set of inputs to the softmax loss: `W` (D, C), `X` (N, D),
/// labels `y` (N) and the regularization strength.
///
/// Can be saved to / loaded from JSON so a specific case can be replayed
/// through the sanity-check binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub weights: Matrix,
    pub inputs: Matrix,
    pub labels: Vec<usize>,
    pub reg: f64,
}

impl Problem {
    /// Draws `W ~ weight_scale * N(0, 1)`, `X ~ N(0, 1)` and uniform labels.
    pub fn random<R: Rng + ?Sized>(config: &ProblemConfig, rng: &mut R) -> Result<Problem> {
        config.validate()?;
        let weights = Matrix::gaussian_with(config.features, config.classes, config.weight_scale, rng);
        let inputs = Matrix::gaussian_with(config.examples, config.features, 1.0, rng);
        let labels = (0..config.examples).map(|_| rng.gen_range(0..config.classes)).collect();
        Ok(Problem { weights, inputs, labels, reg: config.reg })
    }

    pub fn examples(&self) -> usize {
        self.inputs.rows
    }

    pub fn classes(&self) -> usize {
        self.weights.cols
    }

    /// Runs the same precondition checks as the loss functions.
    pub fn validate(&self) -> Result<()> {
        validate_inputs(&self.weights, &self.inputs, &self.labels, self.reg)
    }

    /// Serializes the problem to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Deserializes a problem from a JSON file. Each matrix's stored
    /// `rows`/`cols` header must agree with its data and is kept as written,
    /// so a zero-feature problem loads back with its class count intact.
    pub fn load_json(path: &str) -> std::io::Result<Problem> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let raw: Problem = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let invalid = |e| std::io::Error::new(std::io::ErrorKind::InvalidData, e);
        let Matrix { rows, cols, data } = raw.weights;
        let weights = Matrix::try_from_parts(rows, cols, data).map_err(invalid)?;
        let Matrix { rows, cols, data } = raw.inputs;
        let inputs = Matrix::try_from_parts(rows, cols, data).map_err(invalid)?;
        Ok(Problem { weights, inputs, labels: raw.labels, reg: raw.reg })
    }
}
