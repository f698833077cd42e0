use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::layers::descriptor::{LayerDescriptor, Operation, LAYER_FIELDS};
use crate::math::shape::Shape;
use crate::network::tokens::Tokens;

/// A parsed network description: the input image shape and the ordered
/// layer list (input → output).
///
/// The last layer never computes anything; it only holds the final scores,
/// one per class, in its input channels.
///
/// Text format:
/// ```text
/// 3 128 128              <- input channels, rows, cols
/// 4                      <- layer count
/// 1 1 1 3 1 3 8          <- op stride padding kernel activation in out
/// 3 0 0 0 0 8 0
/// 4 0 0 0 0 131072 10
/// 4 0 0 0 0 10 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input: Shape,
    pub layers: Vec<LayerDescriptor>,
}

impl NetworkSpec {
    pub fn new(input: Shape, layers: Vec<LayerDescriptor>) -> NetworkSpec {
        NetworkSpec { input, layers }
    }

    /// Parses the text description from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<NetworkSpec> {
        let mut tokens = Tokens::new(reader);
        let input = Shape::new(
            tokens.expect("input channel count")?,
            tokens.expect("input row count")?,
            tokens.expect("input column count")?,
        );
        let count: usize = tokens.expect("layer count")?;

        let mut layers = Vec::with_capacity(count);
        for index in 0..count {
            let mut fields = [0usize; LAYER_FIELDS];
            for field in fields.iter_mut() {
                *field = tokens.expect(&format!("attribute of layer {}", index + 1))?;
            }
            let layer = LayerDescriptor::from_fields(fields)
                .map_err(|e| Error::malformed(format!("layer {}: {e}", index + 1)))?;
            layers.push(layer);
        }

        Ok(NetworkSpec { input, layers })
    }

    /// Reads a text description from disk.
    pub fn load_text(path: impl AsRef<Path>) -> Result<NetworkSpec> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
        NetworkSpec::parse(BufReader::new(file))
    }

    /// Renders the description in the text format `parse` accepts.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {} {}", self.input.channels, self.input.height, self.input.width);
        let _ = writeln!(out, "{}", self.layers.len());
        for layer in &self.layers {
            let fields: Vec<String> = layer.to_fields().iter().map(|f| f.to_string()).collect();
            let _ = writeln!(out, "{}", fields.join(" "));
        }
        out
    }

    /// Serializes the description to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a description from a JSON file written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkSpec> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Checks that every layer's shape arithmetic is well formed, that
    /// consecutive layers agree on channel counts and that the whole arena
    /// is addressable. Returns the input shape of every layer.
    pub fn validate(&self) -> Result<Vec<Shape>> {
        let Shape { channels, height, width } = self.input;
        match self.input.checked_volume() {
            Some(0) => {
                return Err(Error::malformed(format!("input shape {channels}x{height}x{width} is empty")));
            }
            None => {
                return Err(Error::malformed(format!("input shape {channels}x{height}x{width} is too large")));
            }
            Some(_) => {}
        }
        if self.layers.len() < 2 {
            return Err(Error::malformed(format!(
                "need at least one computing layer and an output layer, got {} layers",
                self.layers.len()
            )));
        }
        if self.layers[0].input_channels != self.input.channels {
            return Err(Error::malformed(format!(
                "layer 1 expects {} input channels but the image has {}",
                self.layers[0].input_channels, self.input.channels
            )));
        }

        let mut shapes = Vec::with_capacity(self.layers.len());
        let (mut height, mut width) = (self.input.height, self.input.width);
        let last = self.layers.len() - 1;
        let mut capacity = 0usize;
        let mut params = 0usize;

        for (index, layer) in self.layers.iter().enumerate() {
            let name = index + 1;
            if layer.input_channels == 0 {
                return Err(Error::malformed(format!("layer {name}: input channel count is 0")));
            }
            let shape = Shape::new(layer.input_channels, height, width);
            shapes.push(shape);

            // Past this point the padded extents of this layer fit in usize.
            capacity = layer.checked_feature_len(height, width)
                .and_then(|len| capacity.checked_add(len))
                .ok_or_else(|| too_large(name, "feature map"))?;

            if index == last {
                if height != 1 || width != 1 {
                    return Err(Error::malformed(format!(
                        "output layer {name} must be 1x1 spatially, got {height}x{width}"
                    )));
                }
                break;
            }

            match layer.operation {
                Operation::Convolution | Operation::MaxPool => {
                    if layer.stride == 0 || layer.kernel_size == 0 {
                        return Err(Error::malformed(format!(
                            "layer {name}: stride and kernel size must be at least 1"
                        )));
                    }
                    if layer.kernel_size > height + 2 * layer.padding
                        || layer.kernel_size > width + 2 * layer.padding
                    {
                        return Err(Error::malformed(format!(
                            "layer {name}: kernel {k} does not fit padded input {h}x{w}",
                            k = layer.kernel_size,
                            h = height + 2 * layer.padding,
                            w = width + 2 * layer.padding,
                        )));
                    }
                }
                Operation::Flatten | Operation::FullyConnected => {
                    if layer.padding != 0 {
                        return Err(Error::malformed(format!(
                            "layer {name}: flatten and fully-connected layers take no padding"
                        )));
                    }
                }
            }
            if layer.operation == Operation::FullyConnected && (height != 1 || width != 1) {
                return Err(Error::malformed(format!(
                    "layer {name}: fully-connected input must be flattened first, got {height}x{width}"
                )));
            }
            if layer.operation.has_parameters() {
                if layer.output_channels == 0 {
                    return Err(Error::malformed(format!("layer {name}: output channel count is 0")));
                }
                params = layer.checked_weight_len()
                    .and_then(|len| len.checked_add(layer.bias_len()))
                    .and_then(|len| params.checked_add(len))
                    .ok_or_else(|| too_large(name, "parameter block"))?;
            }

            let produced = layer.produced_channels(shape);
            let next = &self.layers[index + 1];
            if next.input_channels != produced {
                return Err(Error::malformed(format!(
                    "layer {name} produces {produced} channels but layer {} expects {}",
                    name + 1,
                    next.input_channels
                )));
            }

            (height, width) = layer.next_extent(height, width);
        }

        if capacity.checked_add(params).is_none() {
            return Err(Error::malformed("network does not fit in addressable memory"));
        }
        Ok(shapes)
    }
}

fn too_large(layer: usize, what: &str) -> Error {
    Error::malformed(format!("layer {layer}: {what} is too large to address"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "3 4 4\n4\n1 1 1 3 1 3 4\n3 0 0 0 0 4 0\n4 0 0 0 0 64 2\n4 0 0 0 0 2 0\n";

    #[test]
    fn parses_and_renders_text() {
        let spec = NetworkSpec::parse(SMALL.as_bytes()).unwrap();
        assert_eq!(spec.input, Shape::new(3, 4, 4));
        assert_eq!(spec.layers.len(), 4);
        assert_eq!(spec.layers[0].operation, Operation::Convolution);
        assert_eq!(spec.to_text(), SMALL);
    }

    #[test]
    fn validate_resolves_shapes() {
        let spec = NetworkSpec::parse(SMALL.as_bytes()).unwrap();
        let shapes = spec.validate().unwrap();
        assert_eq!(shapes, vec![
            Shape::new(3, 4, 4),
            Shape::new(4, 4, 4),
            Shape::new(64, 1, 1),
            Shape::new(2, 1, 1),
        ]);
    }

    #[test]
    fn truncated_description_is_malformed() {
        let err = NetworkSpec::parse("3 4 4\n2\n1 1 1 3".as_bytes()).unwrap_err();
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn channel_chain_mismatch_is_rejected() {
        let text = "3 4 4\n4\n1 1 1 3 1 3 4\n3 0 0 0 0 5 0\n4 0 0 0 0 80 2\n4 0 0 0 0 2 0\n";
        let spec = NetworkSpec::parse(text.as_bytes()).unwrap();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn zero_stride_is_rejected() {
        let text = "1 4 4\n3\n2 0 0 2 0 1 0\n3 0 0 0 0 1 0\n4 0 0 0 0 4 0\n";
        let spec = NetworkSpec::parse(text.as_bytes()).unwrap();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn unflattened_output_is_rejected() {
        let text = "1 4 4\n2\n1 1 0 1 0 1 1\n4 0 0 0 0 1 0\n";
        let spec = NetworkSpec::parse(text.as_bytes()).unwrap();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn huge_input_shape_is_malformed() {
        let text = "1 4294967296 4294967296\n2\n3 0 0 0 0 1 0\n4 0 0 0 0 1 0\n";
        let err = NetworkSpec::parse(text.as_bytes()).unwrap().validate().unwrap_err();
        assert_eq!(err.code(), -4);
        assert!(err.to_string().contains("too large"), "{err}");
    }

    #[test]
    fn huge_padding_is_malformed() {
        let text = format!("1 2 2\n3\n1 1 {} 1 0 1 1\n3 0 0 0 0 1 0\n4 0 0 0 0 1 0\n", usize::MAX / 2);
        let err = NetworkSpec::parse(text.as_bytes()).unwrap().validate().unwrap_err();
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn huge_weight_block_is_malformed() {
        let wide = 1usize << 40;
        let text = format!("1 1 1\n3\n4 0 0 0 0 1 {wide}\n4 0 0 0 0 {wide} {wide}\n4 0 0 0 0 {wide} 0\n");
        let err = NetworkSpec::parse(text.as_bytes()).unwrap().validate().unwrap_err();
        assert_eq!(err.code(), -4);
        assert!(err.to_string().contains("parameter block"), "{err}");
    }
}
