use crate::math::shape::Geometry;

/// 2-D convolution from one padded feature map into the next.
///
/// Weights are laid out `[out][in][row][col]`; output element
/// `(out, r, c)` is the dot product of the `in × k × k` window starting at
/// padded input position `(r·stride, c·stride)` with filter `out`, plus
/// `bias[out]`. Results land in the interior of `output`; its border is
/// left alone.
pub fn forward(
    input: &[f32],
    input_geometry: Geometry,
    output: &mut [f32],
    output_geometry: Geometry,
    weights: &[f32],
    bias: &[f32],
    kernel: usize,
    stride: usize,
) {
    let in_channels = input_geometry.shape.channels;
    let out = output_geometry.shape;
    let window = kernel * kernel;

    for filter in 0..out.channels {
        let filter_base = filter * in_channels * window;
        for row in 0..out.height {
            for col in 0..out.width {
                let mut sum = 0.0f32;
                for channel in 0..in_channels {
                    let w = &weights[filter_base + channel * window..][..window];
                    for kr in 0..kernel {
                        let base = input_geometry.raw_offset(channel, row * stride + kr, col * stride);
                        let taps = &input[base..base + kernel];
                        let w_row = &w[kr * kernel..(kr + 1) * kernel];
                        sum += taps.iter().zip(w_row).map(|(x, w)| x * w).sum::<f32>();
                    }
                }
                output[output_geometry.offset(filter, row, col)] = sum + bias[filter];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::shape::Shape;

    #[test]
    fn one_by_one_kernel_is_an_affine_map() {
        let geometry = Geometry::new(Shape::new(1, 2, 3), 0);
        let input = vec![1.0, -2.0, 0.5, 4.0, 0.0, 3.0];
        let mut output = vec![0.0; geometry.len()];

        forward(&input, geometry, &mut output, geometry, &[2.5], &[-1.0], 1, 1);

        let expected: Vec<f32> = input.iter().map(|x| x * 2.5 - 1.0).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn same_padding_counts_in_bounds_taps() {
        // all-ones 1x3x3 input with a zero border, 3x3 unit kernel
        let in_geometry = Geometry::new(Shape::new(1, 3, 3), 1);
        let mut input = vec![0.0; in_geometry.len()];
        for r in 0..3 {
            for c in 0..3 {
                input[in_geometry.offset(0, r, c)] = 1.0;
            }
        }
        let out_geometry = Geometry::new(Shape::new(1, 3, 3), 0);
        let mut output = vec![0.0; out_geometry.len()];

        forward(&input, in_geometry, &mut output, out_geometry, &[1.0; 9], &[0.0], 3, 1);

        assert_eq!(output, vec![4.0, 6.0, 4.0, 6.0, 9.0, 6.0, 4.0, 6.0, 4.0]);
    }

    #[test]
    fn mixes_input_channels_and_writes_padded_output() {
        // 2 input channels of constant 1 and 2, one 1x1 filter [3, 4]
        let in_geometry = Geometry::new(Shape::new(2, 2, 2), 0);
        let input = vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        let out_geometry = Geometry::new(Shape::new(1, 2, 2), 1);
        let mut output = vec![0.0; out_geometry.len()];

        forward(&input, in_geometry, &mut output, out_geometry, &[3.0, 4.0], &[0.5], 1, 1);

        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(output[out_geometry.offset(0, r, c)], 11.5);
            }
        }
        assert_eq!(output.iter().filter(|&&x| x == 0.0).count(), 12);
    }

    #[test]
    fn stride_skips_positions() {
        // 1x4x4 ramp, 2x2 unit kernel, stride 2 -> 2x2 block sums
        let in_geometry = Geometry::new(Shape::new(1, 4, 4), 0);
        let input: Vec<f32> = (0..16).map(|x| x as f32).collect();
        let out_geometry = Geometry::new(Shape::new(1, 2, 2), 0);
        let mut output = vec![0.0; 4];

        forward(&input, in_geometry, &mut output, out_geometry, &[1.0; 4], &[0.0], 2, 2);

        assert_eq!(output, vec![10.0, 18.0, 42.0, 50.0]);
    }
}
