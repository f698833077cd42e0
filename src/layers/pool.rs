use crate::math::shape::Geometry;

/// Max pooling, channel by channel.
///
/// Output `(ch, r, c)` is the maximum of the `k × k` window at padded input
/// position `(r·stride, c·stride)` of the same channel. Border cells take
/// part in the window like any other value.
pub fn forward(
    input: &[f32],
    input_geometry: Geometry,
    output: &mut [f32],
    output_geometry: Geometry,
    kernel: usize,
    stride: usize,
) {
    let out = output_geometry.shape;
    for channel in 0..out.channels {
        for row in 0..out.height {
            for col in 0..out.width {
                let mut max = f32::NEG_INFINITY;
                for kr in 0..kernel {
                    let base = input_geometry.raw_offset(channel, row * stride + kr, col * stride);
                    for &x in &input[base..base + kernel] {
                        if x > max {
                            max = x;
                        }
                    }
                }
                output[output_geometry.offset(channel, row, col)] = max;
            }
        }
    }
}
