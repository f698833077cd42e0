pub mod executor;
pub mod eval_config;
pub mod eval_stats;
pub mod evaluate;

pub use executor::{Executor, argmax};
pub use eval_config::EvalConfig;
pub use eval_stats::{EvalStats, Prediction};
pub use evaluate::evaluate_dir;
