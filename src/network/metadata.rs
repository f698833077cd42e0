use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How an image is turned into the network's input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// One luma channel.
    ImageGrayscale,
    /// Three channels, red first.
    ImageRgb,
}

impl InputType {
    /// Picks the image layout matching an input channel count.
    pub fn for_channels(channels: usize) -> Result<InputType> {
        match channels {
            1 => Ok(InputType::ImageGrayscale),
            3 => Ok(InputType::ImageRgb),
            other => Err(Error::malformed(format!(
                "no image layout for {other} input channels (expected 1 or 3)"
            ))),
        }
    }
}

/// Class labels for a network's outputs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    /// Human-readable class labels, indexed by the network's output.
    pub output_labels: Vec<String>,
}

impl ModelMetadata {
    /// Reads the first `count` lines of a labels file, one label per line.
    /// Missing trailing lines become empty labels.
    pub fn load_labels(path: impl AsRef<Path>, count: usize) -> Result<ModelMetadata> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
        let labels = ModelMetadata::read_labels(BufReader::new(file), count)?;
        Ok(ModelMetadata { output_labels: labels })
    }

    pub fn read_labels<R: BufRead>(reader: R, count: usize) -> Result<Vec<String>> {
        let mut labels = Vec::with_capacity(count);
        for line in reader.lines().take(count) {
            labels.push(line?);
        }
        labels.resize(count, String::new());
        Ok(labels)
    }

    pub fn label(&self, class: usize) -> Option<&str> {
        self.output_labels.get(class).map(String::as_str)
    }
}
