pub mod arena;
pub mod shape;

pub use arena::{Arena, Span, Stage};
pub use shape::{Geometry, Shape, output_extent};
