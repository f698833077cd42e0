use crate::math::shape::Geometry;

/// Fully-connected layer over a flattened input.
///
/// `output[o] = Σ_i input[i] · weights[o · in + i] + bias[o]`, written to
/// channel `o` of the (1×1) output geometry.
pub fn forward(
    input: &[f32],
    output: &mut [f32],
    output_geometry: Geometry,
    weights: &[f32],
    bias: &[f32],
) {
    let units = output_geometry.shape.channels;
    let fan_in = input.len();
    for (unit, b) in bias.iter().enumerate().take(units) {
        let row = &weights[unit * fan_in..(unit + 1) * fan_in];
        let z: f32 = input.iter().zip(row).map(|(x, w)| x * w).sum();
        output[output_geometry.offset(unit, 0, 0)] = z + b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::shape::Shape;

    #[test]
    fn matrix_vector_product_plus_bias() {
        let geometry = Geometry::new(Shape::new(2, 1, 1), 0);
        let mut output = vec![0.0; 2];
        let weights = [
            1.0, 2.0, 3.0,
            -1.0, 0.0, 1.0,
        ];

        forward(&[1.0, 1.0, 2.0], &mut output, geometry, &weights, &[0.5, -0.5]);

        assert_eq!(output, vec![9.5, 0.5]);
    }
}
