pub mod error;
pub mod math;
pub mod loss;
pub mod check;
pub mod optim;
pub mod classifier;
pub mod train;
pub mod problem;

// Convenience re-exports
pub use error::{Result, SoftmaxError};
pub use math::matrix::Matrix;
pub use loss::softmax::{softmax_loss_naive, softmax_loss_vectorized};
pub use loss::strategy::LossStrategy;
pub use check::grad_check::{grad_check_full, grad_check_sparse, GradCheckReport};
pub use optim::sgd::Sgd;
pub use classifier::linear::LinearClassifier;
pub use train::{train_loop, TrainConfig};
pub use problem::{Problem, ProblemConfig};
