pub mod iteration_stats;
pub mod train_config;
pub mod loop_fn;

pub use iteration_stats::IterationStats;
pub use train_config::TrainConfig;
pub use loop_fn::train_loop;
