// Evaluates a network over a directory of labelled images.
//
// Usage:
//   tinyann [network_config] [parameters] [images_dir] [classes]
//
// Missing arguments fall back to the files under extern/. Each image's
// expected class is the name of the directory it sits in. Set RUST_LOG=info
// for the per-layer construction table, RUST_LOG=debug for every prediction.

use std::process::ExitCode;

use log::error;

use tinyann::{evaluate_dir, EvalConfig, ModelMetadata, Network};

const DEFAULTS: [&str; 4] = [
    "extern/network_config.txt",
    "extern/parameters.txt",
    "extern/test_data",
    "extern/classes.txt",
];

fn run(args: &[String]) -> tinyann::Result<()> {
    let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or(DEFAULTS[i]);
    let (config_path, params_path, images_path, classes_path) = (arg(0), arg(1), arg(2), arg(3));

    let mut network = Network::from_files(config_path, params_path)?;
    let metadata = ModelMetadata::load_labels(classes_path, network.class_count())?;

    let stats = evaluate_dir(&mut network, images_path, &metadata, &EvalConfig::default())?;

    println!("Total Images = {}", stats.total);
    println!("Accuracy = {:.6}", stats.accuracy());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("ERROR TINYANN: {e}");
            ExitCode::from(e.code().unsigned_abs() as u8)
        }
    }
}
