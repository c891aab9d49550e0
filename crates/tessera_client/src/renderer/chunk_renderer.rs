use bytemuck::Pod;
use glam::Vec3;
use tessera_shared::block::BlockId;
use tessera_shared::coords::ChunkPos;
use tessera_shared::expand::{quad_indices, StreamLayout};
use tessera_shared::mesher::QuadBatch;
use tracing::debug;
use wgpu::util::DeviceExt;

use crate::renderer::vertex::{ChunkUniform, GpuPackedQuad, GpuQuadCorner};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchUploadStats {
    pub uploaded_bytes: u64,
    pub buffers_created: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkPassStats {
    pub draw_calls: u32,
    pub rendered_quads: u64,
    pub rendered_indices: u64,
}

pub struct BatchRenderData {
    pub layout: StreamLayout,
    pub chunk_pos: ChunkPos,
    pub block: BlockId,
    pub record_buffer: wgpu::Buffer,
    /// Unit-quad corners; only present for instanced streams.
    pub corner_buffer: Option<wgpu::Buffer>,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub quad_count: u32,
    pub chunk_uniform_buffer: wgpu::Buffer,
    pub chunk_bind_group: wgpu::BindGroup,
}

/// Record stream and index list for `batch` as laid out for `layout`.
pub fn batch_streams(batch: &QuadBatch, layout: StreamLayout) -> (Vec<GpuPackedQuad>, Vec<u32>) {
    match layout {
        StreamLayout::PerVertex => (
            batch
                .per_vertex_stream()
                .iter()
                .copied()
                .map(GpuPackedQuad::from)
                .collect(),
            quad_indices(batch.quad_count()),
        ),
        StreamLayout::Instanced => (
            batch
                .instanced_stream()
                .into_iter()
                .map(GpuPackedQuad::from)
                .collect(),
            quad_indices(1),
        ),
    }
}

pub fn upload_batch(
    device: &wgpu::Device,
    batch: &QuadBatch,
    chunk_pos: ChunkPos,
    layout: StreamLayout,
    chunk_layout: &wgpu::BindGroupLayout,
) -> (BatchRenderData, BatchUploadStats) {
    let (records, indices) = batch_streams(batch, layout);
    let mut stats = BatchUploadStats::default();

    let record_buffer = create_init_buffer(
        device,
        "Chunk Quad Record Buffer",
        &records,
        wgpu::BufferUsages::VERTEX,
        &mut stats,
    );
    let index_buffer = create_init_buffer(
        device,
        "Chunk Quad Index Buffer",
        &indices,
        wgpu::BufferUsages::INDEX,
        &mut stats,
    );
    let corner_buffer = match layout {
        StreamLayout::PerVertex => None,
        StreamLayout::Instanced => Some(create_init_buffer(
            device,
            "Chunk Quad Corner Buffer",
            &GpuQuadCorner::unit_quad(),
            wgpu::BufferUsages::VERTEX,
            &mut stats,
        )),
    };

    let (chunk_uniform_buffer, chunk_bind_group) =
        create_chunk_binding(device, chunk_layout, chunk_pos, batch.base_color, &mut stats);

    debug!(
        "Uploaded {} quads of block {} for chunk {:?} ({} bytes, {:?})",
        batch.quad_count(),
        batch.block.0,
        chunk_pos,
        stats.uploaded_bytes,
        layout
    );

    (
        BatchRenderData {
            layout,
            chunk_pos,
            block: batch.block,
            record_buffer,
            corner_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            quad_count: batch.quad_count() as u32,
            chunk_uniform_buffer,
            chunk_bind_group,
        },
        stats,
    )
}

pub fn render_batches<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    batches: &'a [BatchRenderData],
    camera_bind_group: &'a wgpu::BindGroup,
    material_bind_group: &'a wgpu::BindGroup,
) -> ChunkPassStats {
    pass.set_bind_group(0, camera_bind_group, &[]);
    pass.set_bind_group(2, material_bind_group, &[]);

    let mut stats = ChunkPassStats::default();
    for batch in batches {
        if batch.quad_count == 0 {
            continue;
        }
        pass.set_bind_group(1, &batch.chunk_bind_group, &[]);
        pass.set_vertex_buffer(0, batch.record_buffer.slice(..));
        pass.set_index_buffer(batch.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        match &batch.corner_buffer {
            Some(corners) => {
                pass.set_vertex_buffer(1, corners.slice(..));
                pass.draw_indexed(0..batch.index_count, 0, 0..batch.quad_count);
            }
            None => pass.draw_indexed(0..batch.index_count, 0, 0..1),
        }

        stats.draw_calls += 1;
        stats.rendered_quads += u64::from(batch.quad_count);
        stats.rendered_indices += u64::from(batch.index_count) * instance_factor(batch);
    }
    stats
}

fn instance_factor(batch: &BatchRenderData) -> u64 {
    match batch.layout {
        StreamLayout::PerVertex => 1,
        StreamLayout::Instanced => u64::from(batch.quad_count),
    }
}

fn create_init_buffer<T: Pod>(
    device: &wgpu::Device,
    label: &str,
    contents: &[T],
    usage: wgpu::BufferUsages,
    stats: &mut BatchUploadStats,
) -> wgpu::Buffer {
    let bytes: &[u8] = bytemuck::cast_slice(contents);
    stats.uploaded_bytes += bytes.len() as u64;
    stats.buffers_created += 1;
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytes,
        usage: usage | wgpu::BufferUsages::COPY_DST,
    })
}

fn create_chunk_binding(
    device: &wgpu::Device,
    chunk_layout: &wgpu::BindGroupLayout,
    chunk_pos: ChunkPos,
    base_color: Vec3,
    stats: &mut BatchUploadStats,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let uniform = ChunkUniform::new(chunk_pos, base_color);
    let chunk_uniform_buffer = create_init_buffer(
        device,
        "Chunk Uniform Buffer",
        &[uniform],
        wgpu::BufferUsages::UNIFORM,
        stats,
    );
    let chunk_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Chunk Uniform Bind Group"),
        layout: chunk_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: chunk_uniform_buffer.as_entire_binding(),
        }],
    });
    (chunk_uniform_buffer, chunk_bind_group)
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, UVec3, Vec3};
    use tessera_shared::block::BlockId;
    use tessera_shared::expand::StreamLayout;
    use tessera_shared::face::Face;
    use tessera_shared::mesher::QuadBatch;
    use tessera_shared::packed::{PackedFormat, PackedQuadVertex};

    use super::batch_streams;

    fn batch() -> QuadBatch {
        let up = |ao| PackedQuadVertex::new(UVec3::new(1, 2, 3), Face::Up, ao, UVec2::ONE);
        let left = PackedQuadVertex::new(UVec3::new(4, 5, 6), Face::Left, 1, UVec2::new(2, 3));
        QuadBatch {
            block: BlockId(3),
            base_color: Vec3::splat(0.5),
            vertices: vec![up(0), up(2), up(1), up(0), left, left, left, left],
        }
    }

    #[test]
    fn per_vertex_streams_keep_corner_records_and_index_every_quad() {
        let (records, indices) = batch_streams(&batch(), StreamLayout::PerVertex);
        assert_eq!(records.len(), 8);
        let ao: Vec<u32> = records
            .iter()
            .map(|r| PackedQuadVertex(r.packed).ao(PackedFormat::Stretched))
            .collect();
        assert_eq!(ao, vec![0, 2, 1, 0, 1, 1, 1, 1]);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn instanced_streams_hold_one_record_per_quad() {
        let (records, indices) = batch_streams(&batch(), StreamLayout::Instanced);
        assert_eq!(records.len(), 2);
        let first = PackedQuadVertex(records[0].packed).decode(PackedFormat::Stretched);
        assert_eq!(first.face, Face::Up);
        assert_eq!(first.ao, 2);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
    }
}
