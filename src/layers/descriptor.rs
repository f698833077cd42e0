use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::math::shape::{Shape, output_extent};

/// Number of integers describing one layer in the text format.
pub const LAYER_FIELDS: usize = 7;

/// Operation performed by a layer, with the integer codes used in the
/// network description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Convolution = 1,
    MaxPool = 2,
    Flatten = 3,
    FullyConnected = 4,
}

impl Operation {
    pub fn from_code(code: usize) -> Result<Operation> {
        match code {
            1 => Ok(Operation::Convolution),
            2 => Ok(Operation::MaxPool),
            3 => Ok(Operation::Flatten),
            4 => Ok(Operation::FullyConnected),
            other => Err(Error::malformed(format!("unknown operation code {other}"))),
        }
    }

    pub fn code(&self) -> usize {
        *self as usize
    }

    /// Convolution and fully-connected layers own a weight and bias block.
    pub fn has_parameters(&self) -> bool {
        matches!(self, Operation::Convolution | Operation::FullyConnected)
    }

    /// Windowed operations keep a spatial shape; the others collapse it to 1×1.
    pub fn is_windowed(&self) -> bool {
        matches!(self, Operation::Convolution | Operation::MaxPool)
    }
}

/// One layer of the network description.
///
/// Fields:
/// - `stride`, `padding`, `kernel_size` — window attributes; only meaningful
///   for Convolution and MaxPool, written as 0 otherwise
/// - `activation`       — applied to this layer's output
/// - `input_channels`   — channels of this layer's input feature map, or the
///                        flattened feature count for FullyConnected
/// - `output_channels`  — channels (or units) this layer produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub operation: Operation,
    pub stride: usize,
    pub padding: usize,
    pub kernel_size: usize,
    pub activation: ActivationFunction,
    pub input_channels: usize,
    pub output_channels: usize,
}

impl LayerDescriptor {
    /// Builds a descriptor from the seven integers of one description line,
    /// in the order `operation stride padding kernel_size activation
    /// input_channels output_channels`.
    pub fn from_fields(fields: [usize; LAYER_FIELDS]) -> Result<LayerDescriptor> {
        Ok(LayerDescriptor {
            operation: Operation::from_code(fields[0])?,
            stride: fields[1],
            padding: fields[2],
            kernel_size: fields[3],
            activation: ActivationFunction::from_code(fields[4])?,
            input_channels: fields[5],
            output_channels: fields[6],
        })
    }

    pub fn to_fields(&self) -> [usize; LAYER_FIELDS] {
        [
            self.operation.code(),
            self.stride,
            self.padding,
            self.kernel_size,
            self.activation.code(),
            self.input_channels,
            self.output_channels,
        ]
    }

    /// Kernel side length used to size the weight block. Fully-connected
    /// layers record 0 but behave as a 1×1 kernel.
    pub fn kernel_extent(&self) -> usize {
        match self.operation {
            Operation::FullyConnected => 1,
            _ => self.kernel_size,
        }
    }

    /// Weight count, saturating at `usize::MAX` so an oversized layer fails
    /// the allocation instead of wrapping.
    pub fn weight_len(&self) -> usize {
        self.checked_weight_len().unwrap_or(usize::MAX)
    }

    pub fn checked_weight_len(&self) -> Option<usize> {
        let k = self.kernel_extent();
        self.input_channels
            .checked_mul(self.output_channels)?
            .checked_mul(k)?
            .checked_mul(k)
    }

    pub fn bias_len(&self) -> usize {
        self.output_channels
    }

    /// Padded feature-map size of this layer's input at spatial `(height, width)`,
    /// saturating at `usize::MAX`.
    pub fn feature_len(&self, height: usize, width: usize) -> usize {
        self.checked_feature_len(height, width).unwrap_or(usize::MAX)
    }

    /// `None` if the padded map does not fit in `usize`.
    pub fn checked_feature_len(&self, height: usize, width: usize) -> Option<usize> {
        let border = self.padding.checked_mul(2)?;
        self.input_channels
            .checked_mul(height.checked_add(border)?)?
            .checked_mul(width.checked_add(border)?)
    }

    /// Spatial extent `(height, width)` handed to the next layer.
    pub fn next_extent(&self, height: usize, width: usize) -> (usize, usize) {
        if !self.operation.is_windowed() {
            return (1, 1);
        }
        (
            output_extent(height, self.padding, self.kernel_size, self.stride),
            output_extent(width, self.padding, self.kernel_size, self.stride),
        )
    }

    /// Channels this layer writes into the next one, given its own input shape.
    pub fn produced_channels(&self, input: Shape) -> usize {
        match self.operation {
            Operation::Convolution | Operation::FullyConnected => self.output_channels,
            Operation::MaxPool => input.channels,
            Operation::Flatten => self.feature_len(input.height, input.width),
        }
    }
}
