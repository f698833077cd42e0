pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod infer;
pub mod preprocess;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::{Arena, Shape, Span};
pub use activation::activation::ActivationFunction;
pub use layers::descriptor::{LayerDescriptor, Operation};
pub use network::network::Network;
pub use network::spec::NetworkSpec;
pub use network::metadata::ModelMetadata;
pub use network::plan::{NetworkPlan, ResolvedLayer, BufferState};
pub use infer::{evaluate_dir, EvalConfig, EvalStats};
