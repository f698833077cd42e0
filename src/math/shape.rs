use serde::{Serialize, Deserialize};

/// Spatial shape of one feature map: channels × height × width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub const fn new(channels: usize, height: usize, width: usize) -> Shape {
        Shape { channels, height, width }
    }

    /// Number of values without any padding border, saturating at
    /// `usize::MAX`.
    pub fn volume(&self) -> usize {
        self.checked_volume().unwrap_or(usize::MAX)
    }

    pub fn checked_volume(&self) -> Option<usize> {
        self.channels.checked_mul(self.height)?.checked_mul(self.width)
    }
}

/// A shape together with the zero border stored around each channel plane.
///
/// Feature maps live in the arena as `channels × (height + 2·padding) ×
/// (width + 2·padding)` floats, channel-major, row-major inside a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub shape: Shape,
    pub padding: usize,
}

impl Geometry {
    pub fn new(shape: Shape, padding: usize) -> Geometry {
        Geometry { shape, padding }
    }

    pub fn padded_height(&self) -> usize {
        self.shape.height + 2 * self.padding
    }

    pub fn padded_width(&self) -> usize {
        self.shape.width + 2 * self.padding
    }

    /// Floats per channel plane, border included.
    pub fn plane(&self) -> usize {
        self.padded_height() * self.padded_width()
    }

    /// Floats in the whole padded buffer.
    pub fn len(&self) -> usize {
        self.shape.channels * self.plane()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of interior element `(channel, row, col)`, skipping the border.
    #[inline]
    pub fn offset(&self, channel: usize, row: usize, col: usize) -> usize {
        self.raw_offset(channel, row + self.padding, col + self.padding)
    }

    /// Offset of a coordinate in padded space, where `(0, 0)` is the top-left
    /// corner of the border.
    #[inline]
    pub fn raw_offset(&self, channel: usize, padded_row: usize, padded_col: usize) -> usize {
        channel * self.plane() + padded_row * self.padded_width() + padded_col
    }
}

/// Output extent of a convolution or pooling window sliding over `extent`.
///
/// `1 + (extent + 2·padding − kernel) / stride`, integer division. A window
/// larger than the padded input yields 1 and a zero stride is treated as 1;
/// callers that care reject both before getting here.
pub fn output_extent(extent: usize, padding: usize, kernel: usize, stride: usize) -> usize {
    let padded = extent.saturating_add(padding.saturating_mul(2));
    1 + padded.saturating_sub(kernel) / stride.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_padding_keeps_extent() {
        assert_eq!(output_extent(32, 1, 3, 1), 32);
    }

    #[test]
    fn stride_two_pool_halves_extent() {
        assert_eq!(output_extent(32, 0, 2, 2), 16);
    }

    #[test]
    fn strided_conv_truncates() {
        // (128 + 2 - 3) / 2 = 63, plus one
        assert_eq!(output_extent(128, 1, 3, 2), 64);
    }

    #[test]
    fn offsets_skip_the_border() {
        let g = Geometry::new(Shape::new(2, 3, 4), 1);
        assert_eq!(g.padded_height(), 5);
        assert_eq!(g.padded_width(), 6);
        assert_eq!(g.len(), 60);
        assert_eq!(g.offset(0, 0, 0), 7);
        assert_eq!(g.offset(1, 2, 3), 30 + 3 * 6 + 4);
        assert_eq!(g.raw_offset(1, 0, 0), 30);
    }
}
