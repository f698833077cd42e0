use std::path::PathBuf;

use serde::{Serialize, Deserialize};

/// Outcome of classifying one image during `evaluate_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub path: PathBuf,
    /// Name of the directory the image sits in.
    pub expected: String,
    /// Class index returned by the network.
    pub predicted: usize,
    /// Label of `predicted`, if the labels file has one.
    pub label: Option<String>,
    pub correct: bool,
}

/// Totals for a dataset evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalStats {
    /// Images classified.
    pub total: usize,
    /// Images whose predicted label matched their directory name.
    pub correct: usize,
    /// Images that could not be read or decoded.
    pub skipped: usize,
    /// Wall-clock duration of the whole walk in milliseconds.
    pub elapsed_ms: u64,
}

impl EvalStats {
    /// Accuracy in percent; 0 when nothing was classified.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64 * 100.0
    }
}
