pub mod softmax;
pub mod strategy;

pub use softmax::{softmax_loss_naive, softmax_loss_vectorized};
pub use strategy::LossStrategy;
