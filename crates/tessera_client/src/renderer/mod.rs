pub mod chunk_renderer;
pub mod pipeline;
pub mod vertex;

pub use chunk_renderer::{render_batches, upload_batch, BatchRenderData};
pub use pipeline::ChunkPipeline;
