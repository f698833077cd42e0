use log::debug;

use crate::layers::{conv, dense, flatten, pool};
use crate::layers::descriptor::Operation;
use crate::math::arena::Arena;
use crate::network::plan::{BufferState, NetworkPlan};

/// Runs one forward pass over a plan and its arena.
///
/// Layer `i` is read and layer `i + 1` written, for `i` in `0..N-1`. Once a
/// layer has been read it is marked `Consumed` and zeroed, so at the end of
/// a pass only the final layer holds data.
pub struct Executor<'n> {
    plan: &'n mut NetworkPlan,
    arena: &'n mut Arena,
}

impl<'n> Executor<'n> {
    pub fn new(plan: &'n mut NetworkPlan, arena: &'n mut Arena) -> Executor<'n> {
        Executor { plan, arena }
    }

    /// Feeds `image` (channel, row, col order) through every layer and
    /// returns the winning class. The image length must match the plan's
    /// input shape.
    pub fn run(mut self, image: &[f32]) -> usize {
        self.reset();
        self.load_input(image);
        for index in 0..self.plan.len() - 1 {
            self.step(index);
        }
        argmax(&scores(self.plan, self.arena))
    }

    /// Marks every layer unconsumed and clears the previous pass's output.
    fn reset(&mut self) {
        let last = self.plan.last().feature;
        self.arena.zero(last);
        for layer in self.plan.layers_mut() {
            layer.state = BufferState::Unconsumed;
        }
    }

    /// Copies the image into the interior of layer 0's padded buffer.
    fn load_input(&mut self, image: &[f32]) {
        let first = self.plan.layer(0);
        let geometry = first.geometry();
        let shape = self.plan.input_shape();
        let buffer = self.arena.slice_mut(first.feature);

        for (plane, channel) in image.chunks_exact(shape.height * shape.width).zip(0..shape.channels) {
            for (row, values) in plane.chunks_exact(shape.width).enumerate() {
                let start = geometry.offset(channel, row, 0);
                buffer[start..start + shape.width].copy_from_slice(values);
            }
        }
    }

    /// Executes layer `index`, writing into layer `index + 1`.
    fn step(&mut self, index: usize) {
        let source = self.plan.layer(index).clone();
        let target = self.plan.layer(index + 1).clone();
        debug_assert_eq!(source.state, BufferState::Unconsumed, "layer {} read twice", index + 1);

        let descriptor = source.descriptor;
        let in_geometry = source.geometry();
        let out_geometry = target.geometry();

        let stage = self.arena.stage(source.feature, target.feature, self.plan.params_base());
        let weights = stage.param(source.weights);
        let bias = stage.param(source.bias);
        let input = stage.input;
        let output = stage.output;

        match descriptor.operation {
            Operation::Convolution => conv::forward(
                input, in_geometry, output, out_geometry,
                weights, bias, descriptor.kernel_size, descriptor.stride,
            ),
            Operation::MaxPool => pool::forward(
                input, in_geometry, output, out_geometry,
                descriptor.kernel_size, descriptor.stride,
            ),
            Operation::Flatten => flatten::forward(input, output),
            Operation::FullyConnected => dense::forward(input, output, out_geometry, weights, bias),
        }
        if descriptor.operation.has_parameters() {
            descriptor.activation.apply(output, out_geometry);
        }

        self.arena.zero(source.feature);
        self.plan.layers_mut()[index].state = BufferState::Consumed;

        debug!("layer {} ({:?}) -> {}x{}x{}",
            index + 1, descriptor.operation,
            target.shape.channels, target.shape.height, target.shape.width);
    }
}

/// Values held by the final layer, one per class.
pub fn scores(plan: &NetworkPlan, arena: &Arena) -> Vec<f32> {
    let last = plan.len() - 1;
    let channels = plan.last().shape.channels;
    (0..channels)
        .map(|channel| arena.value(plan.offset(last, channel, 0, 0)))
        .collect()
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.9, 0.9, 0.1]), 1);
    }

    #[test]
    fn argmax_handles_negative_scores() {
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
        assert_eq!(argmax(&[4.0]), 0);
    }
}
