use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::infer::eval_stats::Prediction;

/// Configuration for an `evaluate_dir` run.
///
/// # Fields
/// - `extensions`  — file extensions (lower case, no dot) treated as images
/// - `progress_tx` — optional channel sender; one `Prediction` is sent per
///                   classified image.  If the receiver is dropped the walk
///                   stops early.
/// - `stop_flag`   — optional atomic flag; when set to `true` from another
///                   thread the walk stops before the next image.
pub struct EvalConfig {
    pub extensions: Vec<String>,
    pub progress_tx: Option<mpsc::Sender<Prediction>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl EvalConfig {
    /// Creates a config accepting the given extensions, with no progress
    /// channel and no stop flag.
    pub fn new(extensions: &[&str]) -> Self {
        EvalConfig {
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            progress_tx: None,
            stop_flag: None,
        }
    }

    /// True if `ext` (any case) is one of the configured extensions.
    pub fn accepts(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.extensions.iter().any(|e| *e == ext)
    }
}

impl Default for EvalConfig {
    /// JPEG files only.
    fn default() -> Self {
        EvalConfig::new(&["jpg", "jpeg"])
    }
}
