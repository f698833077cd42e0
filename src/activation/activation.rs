use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::shape::Geometry;

/// Activation applied to a layer's output right after its linear kernel.
///
/// The description format encodes it as an integer: `0` none, `1` ReLU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivationFunction {
    #[default]
    Identity,
    ReLU,
}

impl ActivationFunction {
    pub fn from_code(code: usize) -> Result<ActivationFunction> {
        match code {
            0 => Ok(ActivationFunction::Identity),
            1 => Ok(ActivationFunction::ReLU),
            other => Err(Error::malformed(format!("unknown activation code {other}"))),
        }
    }

    pub fn code(&self) -> usize {
        match self {
            ActivationFunction::Identity => 0,
            ActivationFunction::ReLU => 1,
        }
    }

    /// Element-wise activation.
    pub fn function(&self, x: f32) -> f32 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
        }
    }

    /// Applies the activation in place over the interior of a padded feature
    /// map, leaving the border untouched.
    pub fn apply(&self, buffer: &mut [f32], geometry: Geometry) {
        if *self == ActivationFunction::Identity {
            return;
        }
        let shape = geometry.shape;
        for channel in 0..shape.channels {
            for row in 0..shape.height {
                let start = geometry.offset(channel, row, 0);
                for x in &mut buffer[start..start + shape.width] {
                    *x = self.function(*x);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::shape::Shape;

    #[test]
    fn relu_clamps_interior_only() {
        // 1 channel, 1x2 interior, padding 1 -> 3x4 plane
        let geometry = Geometry::new(Shape::new(1, 1, 2), 1);
        let mut buffer = vec![-1.0; geometry.len()];
        ActivationFunction::ReLU.apply(&mut buffer, geometry);

        assert_eq!(buffer[geometry.offset(0, 0, 0)], 0.0);
        assert_eq!(buffer[geometry.offset(0, 0, 1)], 0.0);
        assert_eq!(buffer.iter().filter(|&&x| x == -1.0).count(), 10);
    }

    #[test]
    fn identity_is_a_no_op() {
        let geometry = Geometry::new(Shape::new(1, 2, 2), 0);
        let mut buffer = vec![-3.0, 2.0, -0.5, 0.0];
        ActivationFunction::Identity.apply(&mut buffer, geometry);
        assert_eq!(buffer, vec![-3.0, 2.0, -0.5, 0.0]);
    }

    #[test]
    fn codes_round_trip() {
        assert_eq!(ActivationFunction::from_code(1).unwrap(), ActivationFunction::ReLU);
        assert_eq!(ActivationFunction::Identity.code(), 0);
        assert!(ActivationFunction::from_code(7).is_err());
    }
}
