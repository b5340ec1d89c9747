pub mod config;
pub mod problem;

pub use config::ProblemConfig;
pub use problem::Problem;
