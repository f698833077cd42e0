pub mod image;

pub use self::image::{image_to_input, load_image_input, normalize};
