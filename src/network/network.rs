use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use rand::Rng;

use crate::error::{Error, Result};
use crate::infer::executor::{self, Executor};
use crate::math::arena::Arena;
use crate::math::shape::Shape;
use crate::network::params;
use crate::network::plan::{self, NetworkPlan};
use crate::network::spec::NetworkSpec;

/// A network ready for inference: its description, the resolved plan and
/// the one arena holding every feature map, weight and bias.
///
/// Cloning gives a fully independent copy, which is how several threads run
/// inference at once.
#[derive(Debug, Clone)]
pub struct Network {
    spec: NetworkSpec,
    plan: NetworkPlan,
    arena: Arena,
}

impl Network {
    /// Validates `spec`, sizes and allocates the arena and lays out every
    /// layer. Parameters start out as zeros.
    pub fn build(spec: NetworkSpec) -> Result<Network> {
        spec.validate()?;
        let sizing = plan::size(&spec);
        let arena = Arena::allocate(sizing.capacity())?;
        let plan = NetworkPlan::assign(&spec, &sizing, arena.capacity())?;

        info!("network: {} layers, input {}x{}x{}, {} classes",
            plan.len(), spec.input.channels, spec.input.height, spec.input.width,
            plan.last().shape.channels);
        plan.log_summary();

        Ok(Network { spec, plan, arena })
    }

    /// Reads the description at `config`, builds the network and loads the
    /// parameters at `params`.
    pub fn from_files(config: impl AsRef<Path>, params: impl AsRef<Path>) -> Result<Network> {
        let spec = NetworkSpec::load_text(config)?;
        let mut network = Network::build(spec)?;
        network.load_params(params)?;
        Ok(network)
    }

    /// Loads weights and biases from a parameter file.
    pub fn load_params(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
        let read = self.read_params(BufReader::new(file))?;
        info!("loaded {read} parameters from {}", path.display());
        Ok(())
    }

    /// Loads weights and biases from any token stream. Returns the number of
    /// values read.
    pub fn read_params<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        params::load_params(&self.plan, &mut self.arena, reader)
    }

    pub fn save_params(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_params(BufWriter::new(file))
    }

    pub fn write_params<W: Write>(&self, writer: W) -> Result<()> {
        params::write_params(&self.plan, &self.arena, writer)
    }

    /// Replaces all parameters with He-initialized random values.
    pub fn init_he<G: Rng + ?Sized>(&mut self, rng: &mut G) {
        params::init_he(&self.plan, &mut self.arena, rng);
    }

    /// Runs one forward pass and returns the predicted class index.
    pub fn infer(&mut self, image: &[f32]) -> Result<usize> {
        let expected = self.input_len();
        if image.len() != expected {
            return Err(Error::InputMismatch { expected, actual: image.len() });
        }
        Ok(Executor::new(&mut self.plan, &mut self.arena).run(image))
    }

    /// Final-layer values left by the last forward pass.
    pub fn scores(&self) -> Vec<f32> {
        executor::scores(&self.plan, &self.arena)
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn plan(&self) -> &NetworkPlan {
        &self.plan
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn input_shape(&self) -> Shape {
        self.spec.input
    }

    /// Number of floats `infer` expects.
    pub fn input_len(&self) -> usize {
        self.spec.input.volume()
    }

    pub fn class_count(&self) -> usize {
        self.plan.last().shape.channels
    }

    /// Weights of layer `layer`; empty for layers without parameters.
    pub fn weights(&self, layer: usize) -> &[f32] {
        self.arena.slice(self.plan.layer(layer).weights)
    }

    pub fn weights_mut(&mut self, layer: usize) -> &mut [f32] {
        let span = self.plan.layer(layer).weights;
        self.arena.slice_mut(span)
    }

    pub fn bias(&self, layer: usize) -> &[f32] {
        self.arena.slice(self.plan.layer(layer).bias)
    }

    pub fn bias_mut(&mut self, layer: usize) -> &mut [f32] {
        let span = self.plan.layer(layer).bias;
        self.arena.slice_mut(span)
    }
}
