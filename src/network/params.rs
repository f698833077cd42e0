use std::io::{BufRead, Write};

use rand::Rng;

use crate::error::Result;
use crate::math::arena::Arena;
use crate::network::plan::NetworkPlan;
use crate::network::tokens::Tokens;

/// Fills every parametric layer's weight and bias spans from a token stream.
///
/// Per layer, in network order: `out × in × k × k` weights nested as
/// (out, in, row, col), then `out` biases. Layers without parameters are
/// skipped. The stream must hold exactly the expected number of tokens.
pub fn load_params<R: BufRead>(plan: &NetworkPlan, arena: &mut Arena, reader: R) -> Result<usize> {
    let mut tokens = Tokens::new(reader);

    for (index, layer) in plan.layers().iter().enumerate() {
        if !layer.has_parameters() {
            continue;
        }
        let what = format!("weight of layer {}", index + 1);
        for w in arena.slice_mut(layer.weights) {
            *w = tokens.expect(&what)?;
        }
        let what = format!("bias of layer {}", index + 1);
        for b in arena.slice_mut(layer.bias) {
            *b = tokens.expect(&what)?;
        }
    }

    let read = tokens.consumed();
    tokens.finish("parameter file")?;
    Ok(read)
}

/// Writes every parametric layer's weights and biases in the order
/// `load_params` reads them.
///
/// Each kernel row goes on its own line with blank lines between filters;
/// values use the shortest representation that parses back to the same
/// `f32`.
pub fn write_params<W: Write>(plan: &NetworkPlan, arena: &Arena, mut writer: W) -> Result<()> {
    for layer in plan.layers().iter().filter(|l| l.has_parameters()) {
        let descriptor = &layer.descriptor;
        let k = descriptor.kernel_extent();
        let weights = arena.slice(layer.weights);

        for filter in weights.chunks(descriptor.input_channels * k * k) {
            for plane in filter.chunks(k * k) {
                for row in plane.chunks(k) {
                    for w in row {
                        write!(writer, "{w} ")?;
                    }
                    writeln!(writer)?;
                }
                writeln!(writer)?;
            }
            writeln!(writer)?;
        }
        for b in arena.slice(layer.bias) {
            write!(writer, "{b} ")?;
        }
        writeln!(writer, "\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// He initialization: weights from N(0, sqrt(2 / fan_in)), biases zero.
///
/// `fan_in` is `input_channels × k²`. Useful for exercising an architecture
/// before trained parameters exist.
pub fn init_he<G: Rng + ?Sized>(plan: &NetworkPlan, arena: &mut Arena, rng: &mut G) {
    for layer in plan.layers().iter().filter(|l| l.has_parameters()) {
        let k = layer.descriptor.kernel_extent();
        let fan_in = (layer.descriptor.input_channels * k * k).max(1);
        let std_dev = (2.0 / fan_in as f64).sqrt();
        for w in arena.slice_mut(layer.weights) {
            *w = (sample_standard_normal(rng) * std_dev) as f32;
        }
        arena.zero(layer.bias);
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<G: Rng + ?Sized>(rng: &mut G) -> f64 {
    // Uniform on (0, 1] so the logarithm stays finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Number of parameter tokens a plan expects.
pub fn expected_tokens(plan: &NetworkPlan) -> usize {
    plan.layers().iter().map(|l| l.weights.len + l.bias.len).sum()
}
