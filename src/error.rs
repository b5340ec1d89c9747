use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SoftmaxError>;

/// Precondition violations reported by the loss evaluator and its helpers.
///
/// Every check runs before any arithmetic, so an error never comes with a
/// partially computed loss or gradient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SoftmaxError {
    #[error("empty batch: X must contain at least one example")]
    EmptyBatch,

    #[error("shape mismatch: {left} is {left_rows}x{left_cols} but {right} is {right_rows}x{right_cols}")]
    ShapeMismatch {
        left: &'static str,
        left_rows: usize,
        left_cols: usize,
        right: &'static str,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("label count mismatch: X has {examples} rows but y has {labels} labels")]
    LabelCountMismatch { examples: usize, labels: usize },

    #[error("label y[{index}] = {label} is out of range for {classes} classes")]
    LabelOutOfRange {
        index: usize,
        label: usize,
        classes: usize,
    },

    #[error("regularization strength must be finite and non-negative, got {0}")]
    InvalidRegularization(f64),

    #[error("ragged matrix: row {row} has {found} entries, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("matrix header declares {declared} rows but data has {found}")]
    RowCountMismatch { declared: usize, found: usize },

    #[error("finite-difference step must be finite and positive, got {0}")]
    InvalidStep(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SoftmaxError {
    /// Shape mismatch between two named matrices given as `(rows, cols)`.
    pub fn shape(
        left: &'static str,
        (left_rows, left_cols): (usize, usize),
        right: &'static str,
        (right_rows, right_cols): (usize, usize),
    ) -> SoftmaxError {
        SoftmaxError::ShapeMismatch {
            left,
            left_rows,
            left_cols,
            right,
            right_rows,
            right_cols,
        }
    }
}
