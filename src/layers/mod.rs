pub mod descriptor;
pub mod conv;
pub mod pool;
pub mod flatten;
pub mod dense;

pub use descriptor::{LayerDescriptor, Operation, LAYER_FIELDS};
