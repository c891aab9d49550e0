pub mod block;
pub mod chunk;
pub mod color_noise;
pub mod coords;
pub mod expand;
pub mod face;
pub mod lighting;
pub mod mesher;
pub mod packed;

pub use packed::{PackedFormat, PackedQuadVertex};
