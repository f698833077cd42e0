//! Arena sizing and layout assignment.
//!
//! Sizing walks the descriptors twice: once for feature maps, whose size
//! depends on the running spatial shape, and once for weight and bias
//! blocks. Layout then walks the same order handing out spans from a single
//! cursor, so the arena ends up as
//!
//! ```text
//! [ map 0 | map 1 | ... | map N-1 | w 0 | b 0 | w 2 | b 2 | ... ]
//! ```

use log::info;

use crate::error::{Error, Result};
use crate::layers::descriptor::LayerDescriptor;
use crate::math::arena::Span;
use crate::math::shape::{Geometry, Shape};
use crate::network::spec::NetworkSpec;

/// Whether a layer's feature map still holds data the executor needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferState {
    #[default]
    Unconsumed,
    Consumed,
}

/// Capacity required by a description, split by region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sizing {
    /// Input shape of every layer, in order.
    pub shapes: Vec<Shape>,
    /// Padded feature-map length of every layer, in order.
    pub feature_lens: Vec<usize>,
    pub feature_total: usize,
    pub param_total: usize,
}

impl Sizing {
    pub fn capacity(&self) -> usize {
        self.feature_total.saturating_add(self.param_total)
    }
}

/// Computes the arena capacity for `spec` without allocating anything.
///
/// Malformed descriptions are not rejected here; the window formula
/// truncates silently and oversized totals saturate at `usize::MAX`, which
/// no allocation can satisfy. Call `NetworkSpec::validate` first.
pub fn size(spec: &NetworkSpec) -> Sizing {
    let mut shapes = Vec::with_capacity(spec.layers.len());
    let mut feature_lens = Vec::with_capacity(spec.layers.len());
    let (mut height, mut width) = (spec.input.height, spec.input.width);

    for layer in &spec.layers {
        shapes.push(Shape::new(layer.input_channels, height, width));
        feature_lens.push(layer.feature_len(height, width));
        (height, width) = layer.next_extent(height, width);
    }

    let param_total = spec.layers.iter()
        .take(spec.layers.len().saturating_sub(1))
        .filter(|layer| layer.operation.has_parameters())
        .map(|layer| layer.weight_len().saturating_add(layer.bias_len()))
        .fold(0, usize::saturating_add);

    Sizing {
        feature_total: feature_lens.iter().copied().fold(0, usize::saturating_add),
        shapes,
        feature_lens,
        param_total,
    }
}

/// A descriptor with its resolved input shape and arena spans.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer {
    pub descriptor: LayerDescriptor,
    pub shape: Shape,
    pub feature: Span,
    pub weights: Span,
    pub bias: Span,
    pub state: BufferState,
}

impl ResolvedLayer {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.shape, self.descriptor.padding)
    }

    pub fn has_parameters(&self) -> bool {
        !self.weights.is_empty() || !self.bias.is_empty()
    }
}

/// The ordered, resolved layers of a network and where each lives in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPlan {
    layers: Vec<ResolvedLayer>,
    input: Shape,
    params_base: usize,
    capacity: usize,
}

/// Hands out consecutive spans, refusing to run past the arena.
struct Cursor {
    position: usize,
    capacity: usize,
}

impl Cursor {
    fn take(&mut self, len: usize) -> Result<Span> {
        let end = match self.position.checked_add(len) {
            Some(end) if end <= self.capacity => end,
            _ => return Err(Error::RegionExceeded {
                requested: self.position.saturating_add(len),
                capacity: self.capacity,
            }),
        };
        let span = Span::new(self.position, len);
        self.position = end;
        Ok(span)
    }
}

impl NetworkPlan {
    /// Assigns spans for every layer of `spec` inside an arena of `capacity`
    /// floats, using the shapes and lengths from `sizing`.
    pub fn assign(spec: &NetworkSpec, sizing: &Sizing, capacity: usize) -> Result<NetworkPlan> {
        let mut cursor = Cursor { position: 0, capacity };

        let mut layers = Vec::with_capacity(spec.layers.len());
        for ((descriptor, &shape), &len) in spec.layers.iter().zip(&sizing.shapes).zip(&sizing.feature_lens) {
            layers.push(ResolvedLayer {
                descriptor: *descriptor,
                shape,
                feature: cursor.take(len)?,
                weights: Span::EMPTY,
                bias: Span::EMPTY,
                state: BufferState::Unconsumed,
            });
        }

        let params_base = cursor.position;
        let last = layers.len().saturating_sub(1);
        for layer in layers.iter_mut().take(last) {
            if layer.descriptor.operation.has_parameters() {
                layer.weights = cursor.take(layer.descriptor.weight_len())?;
                layer.bias = cursor.take(layer.descriptor.bias_len())?;
            }
        }

        debug_assert_eq!(cursor.position, capacity, "layout does not cover the arena");

        Ok(NetworkPlan { layers, input: spec.input, params_base, capacity })
    }

    pub fn layers(&self) -> &[ResolvedLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> &ResolvedLayer {
        &self.layers[index]
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [ResolvedLayer] {
        &mut self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn last(&self) -> &ResolvedLayer {
        &self.layers[self.layers.len() - 1]
    }

    pub fn input_shape(&self) -> Shape {
        self.input
    }

    /// Arena offset where the weight and bias blocks begin.
    pub fn params_base(&self) -> usize {
        self.params_base
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Absolute arena offset of interior element `(channel, row, col)` of
    /// layer `layer`'s feature map.
    pub fn offset(&self, layer: usize, channel: usize, row: usize, col: usize) -> usize {
        let resolved = &self.layers[layer];
        resolved.feature.start + resolved.geometry().offset(channel, row, col)
    }

    /// Logs one line per layer: its attributes and resolved input shape.
    pub fn log_summary(&self) {
        info!("arena: {} floats ({} feature, {} parameters)",
            self.capacity, self.params_base, self.capacity - self.params_base);
        for (index, layer) in self.layers.iter().enumerate() {
            let fields: Vec<String> = layer.descriptor.to_fields().iter().map(|f| f.to_string()).collect();
            info!("layer {} : {} | {} {} {}",
                index + 1, fields.join(" "), layer.shape.channels, layer.shape.height, layer.shape.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(text: &str) -> NetworkSpec {
        NetworkSpec::parse(text.as_bytes()).unwrap()
    }

    #[test]
    fn conv_pool_shapes_propagate() {
        let s = spec("3 32 32\n4\n1 1 1 3 1 3 3\n2 2 0 2 0 3 0\n3 0 0 0 0 3 0\n4 0 0 0 0 768 0\n");
        let sizing = size(&s);
        assert_eq!(sizing.shapes[1], Shape::new(3, 32, 32));
        assert_eq!(sizing.shapes[2], Shape::new(3, 16, 16));
        assert_eq!(sizing.shapes[3], Shape::new(768, 1, 1));
        // 3*34*34 + 3*32*32 + 3*16*16 + 768
        assert_eq!(sizing.feature_total, 3468 + 3072 + 768 + 768);
        // conv weights and bias only; the output layer owns nothing
        assert_eq!(sizing.param_total, 3 * 3 * 9 + 3);
    }

    #[test]
    fn last_layer_owns_no_parameters() {
        let s = spec("1 1 1\n2\n4 0 0 0 0 1 3\n4 0 0 0 0 3 5\n");
        let sizing = size(&s);
        assert_eq!(sizing.param_total, 3 + 3);
        let plan = NetworkPlan::assign(&s, &sizing, sizing.capacity()).unwrap();
        assert!(plan.layer(0).has_parameters());
        assert!(!plan.last().has_parameters());
    }

    #[test]
    fn undersized_region_is_reported() {
        let s = spec("1 2 2\n3\n1 1 0 1 0 1 1\n3 0 0 0 0 1 0\n4 0 0 0 0 4 0\n");
        let sizing = size(&s);
        let err = NetworkPlan::assign(&s, &sizing, sizing.feature_total - 1).unwrap_err();
        assert_eq!(err.code(), -2);
    }

    #[test]
    fn cursor_overrun_near_usize_max_is_reported() {
        let mut cursor = Cursor { position: 8, capacity: 16 };
        let err = cursor.take(usize::MAX - 4).unwrap_err();
        assert!(matches!(err, Error::RegionExceeded { requested: usize::MAX, capacity: 16 }));
        assert_eq!(cursor.take(8).unwrap(), Span::new(8, 8));
    }

    #[test]
    fn oversized_description_saturates_instead_of_wrapping() {
        let s = spec("1 4294967296 4294967296\n2\n3 0 0 0 0 1 0\n4 0 0 0 0 1 0\n");
        let sizing = size(&s);
        assert_eq!(sizing.feature_lens[0], usize::MAX);
        assert_eq!(sizing.capacity(), usize::MAX);
    }

    #[test]
    fn offset_addresses_padded_interior() {
        let s = spec("1 2 2\n3\n1 1 1 3 0 1 1\n3 0 0 0 0 1 0\n4 0 0 0 0 4 0\n");
        let sizing = size(&s);
        let plan = NetworkPlan::assign(&s, &sizing, sizing.capacity()).unwrap();
        // layer 0 is 1x4x4 with its border; interior (0,0) sits at 1*4+1
        assert_eq!(plan.offset(0, 0, 0, 0), 5);
        assert_eq!(plan.offset(0, 0, 1, 1), 10);
        // layer 1 starts right after layer 0's 16 floats
        assert_eq!(plan.offset(1, 0, 1, 0), 16 + 2);
    }
}
