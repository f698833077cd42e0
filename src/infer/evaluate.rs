use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::infer::eval_config::EvalConfig;
use crate::infer::eval_stats::{EvalStats, Prediction};
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;
use crate::preprocess::image::load_image_input;

/// Whether the walk should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Classifies every image under `dir`, recursively, and counts how many
/// land on the right class.
///
/// The expected class of an image is the name of the directory holding it;
/// a prediction is correct when `metadata`'s label for the predicted index
/// equals that name. Entries are visited in path order.
///
/// # Early termination
/// The walk stops early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// Images that fail to read or decode are logged and counted as skipped.
/// An unreadable directory is an error.
pub fn evaluate_dir(
    network: &mut Network,
    dir: impl AsRef<Path>,
    metadata: &ModelMetadata,
    config: &EvalConfig,
) -> Result<EvalStats> {
    let t_start = Instant::now();
    let mut stats = EvalStats::default();

    walk(network, dir.as_ref(), metadata, config, &mut stats)?;

    stats.elapsed_ms = t_start.elapsed().as_millis() as u64;
    info!("evaluated {} images ({} skipped): {:.2}% correct in {} ms",
        stats.total, stats.skipped, stats.accuracy(), stats.elapsed_ms);
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn walk(
    network: &mut Network,
    dir: &Path,
    metadata: &ModelMetadata,
    config: &EvalConfig,
    stats: &mut EvalStats,
) -> Result<Flow> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::unreadable(dir, e))? {
        paths.push(entry.map_err(|e| Error::unreadable(dir, e))?.path());
    }
    paths.sort();

    let class_name = dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for path in paths {
        if path.is_dir() {
            if walk(network, &path, metadata, config, stats)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
            continue;
        }

        let is_image = path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| config.accepts(e));
        if !path.is_file() || !is_image {
            continue;
        }

        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                return Ok(Flow::Stop);
            }
        }

        let input = match load_image_input(&path, network.input_shape()) {
            Ok(input) => input,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                stats.skipped += 1;
                continue;
            }
        };

        let predicted = network.infer(&input)?;
        let label = metadata.label(predicted).map(str::to_owned);
        let correct = label.as_deref() == Some(class_name.as_str());

        stats.total += 1;
        if correct {
            stats.correct += 1;
        }
        debug!("{} -> {predicted} ({})", path.display(), label.as_deref().unwrap_or("?"));

        if let Some(ref tx) = config.progress_tx {
            let prediction = Prediction {
                path,
                expected: class_name.clone(),
                predicted,
                label,
                correct,
            };
            // If the receiver has been dropped, stop evaluating.
            if tx.send(prediction).is_err() {
                return Ok(Flow::Stop);
            }
        }
    }

    Ok(Flow::Continue)
}
