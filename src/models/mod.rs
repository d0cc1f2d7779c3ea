pub mod common;
pub mod image;
pub mod manga;

pub use common::*;
pub use image::*;
pub use manga::*;
