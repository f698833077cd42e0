pub mod metadata;
pub mod network;
pub mod params;
pub mod plan;
pub mod spec;
pub mod tokens;

pub use metadata::{InputType, ModelMetadata};
pub use network::Network;
pub use plan::{BufferState, NetworkPlan, ResolvedLayer, Sizing};
pub use spec::NetworkSpec;
