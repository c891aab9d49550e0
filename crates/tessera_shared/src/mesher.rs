//! Reference producer for packed quad streams: face culling, per-corner AO
//! buckets and greedy merging over each face's U/V plane.

use glam::{IVec3, UVec2, UVec3, Vec3};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::block::{BlockId, BlockRegistry};
use crate::chunk::ChunkData;
use crate::coords::{ChunkPos, LocalPos, CHUNK_SIZE, CHUNK_SIZE_I32};
use crate::expand::QUAD_CORNERS;
use crate::face::{Face, FaceBasis};
use crate::packed::{PackedFormat, PackedQuadVertex};

const MASK_SIZE: usize = CHUNK_SIZE * CHUNK_SIZE;
const MAX_AO_BUCKET: u8 = 3;

#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkNeighbors<'a> {
    pub pos_x: Option<&'a ChunkData>,
    pub neg_x: Option<&'a ChunkData>,
    pub pos_y: Option<&'a ChunkData>,
    pub neg_y: Option<&'a ChunkData>,
    pub pos_z: Option<&'a ChunkData>,
    pub neg_z: Option<&'a ChunkData>,
}

/// Quads of one block type. `vertices` holds four canonical-format records
/// per quad, one per corner, each carrying that corner's AO bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadBatch {
    pub block: BlockId,
    pub base_color: Vec3,
    pub vertices: Vec<PackedQuadVertex>,
}

impl QuadBatch {
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Record `i` belongs to corner `wind(QUAD_CORNERS[i % 4])`.
    pub fn per_vertex_stream(&self) -> &[PackedQuadVertex] {
        &self.vertices
    }

    /// One record per quad. A single record has one AO field, so it carries
    /// the darkest of the four corner buckets.
    pub fn instanced_stream(&self) -> Vec<PackedQuadVertex> {
        let ao_field = PackedFormat::Stretched.layout().ao;
        self.vertices
            .chunks_exact(4)
            .map(|corners| {
                let darkest = corners
                    .iter()
                    .map(|record| record.ao(PackedFormat::Stretched))
                    .max()
                    .unwrap_or(0);
                PackedQuadVertex(ao_field.insert(corners[0].0, darkest))
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkQuads {
    pub chunk_pos: ChunkPos,
    pub batches: Vec<QuadBatch>,
}

impl ChunkQuads {
    pub fn quad_count(&self) -> usize {
        self.batches.iter().map(QuadBatch::quad_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
struct MaskCell {
    block: BlockId,
    /// AO bucket per unit corner, in `QUAD_CORNERS` order.
    corner_ao: [u8; 4],
}

pub fn build_chunk_quads(
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
    chunk_pos: ChunkPos,
) -> ChunkQuads {
    let mut by_block: FxHashMap<BlockId, Vec<PackedQuadVertex>> = FxHashMap::default();

    if !(chunk.is_uniform() && !registry.is_meshable(chunk.blocks[0])) {
        let mut mask = vec![None::<MaskCell>; MASK_SIZE];
        for face in Face::ALL {
            let basis = face.basis();
            for slice in 0..CHUNK_SIZE_I32 {
                fill_face_mask(&mut mask, chunk, registry, neighbors, basis, slice);
                merge_face_mask(&mut mask, face, slice, &mut by_block);
            }
        }
    }

    let mut batches: Vec<QuadBatch> = by_block
        .into_iter()
        .map(|(block, vertices)| QuadBatch {
            block,
            base_color: registry.base_color(block),
            vertices,
        })
        .collect();
    batches.sort_by_key(|batch| batch.block);

    let chunk_quads = ChunkQuads { chunk_pos, batches };
    debug!(
        "Meshed chunk {:?}: {} quads in {} batches",
        chunk_pos,
        chunk_quads.quad_count(),
        chunk_quads.batches.len()
    );
    chunk_quads
}

fn fill_face_mask(
    mask: &mut [Option<MaskCell>],
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
    basis: &FaceBasis,
    slice: i32,
) {
    mask.fill(None);
    for v in 0..CHUNK_SIZE_I32 {
        for u in 0..CHUNK_SIZE_I32 {
            let coords = face_block_coords(basis, slice, u, v);
            let block = sample_block(chunk, neighbors, coords);
            if !registry.is_meshable(block) {
                continue;
            }

            let adjacent = sample_block(chunk, neighbors, coords + basis.normal);
            if adjacent == block || !registry.get(adjacent).exposes_neighbour() {
                continue;
            }

            mask[(v * CHUNK_SIZE_I32 + u) as usize] = Some(MaskCell {
                block,
                corner_ao: corner_ao_buckets(chunk, registry, neighbors, basis, coords),
            });
        }
    }
}

fn merge_face_mask(
    mask: &mut [Option<MaskCell>],
    face: Face,
    slice: i32,
    by_block: &mut FxHashMap<BlockId, Vec<PackedQuadVertex>>,
) {
    let basis = face.basis();
    for v in 0..CHUNK_SIZE {
        let mut u = 0usize;
        while u < CHUNK_SIZE {
            let Some(cell) = mask[v * CHUNK_SIZE + u] else {
                u += 1;
                continue;
            };

            let mut width = 1usize;
            while u + width < CHUNK_SIZE && mask[v * CHUNK_SIZE + u + width] == Some(cell) {
                width += 1;
            }

            let mut height = 1usize;
            'height: while v + height < CHUNK_SIZE {
                let row = (v + height) * CHUNK_SIZE;
                for du in 0..width {
                    if mask[row + u + du] != Some(cell) {
                        break 'height;
                    }
                }
                height += 1;
            }

            for dv in 0..height {
                let row = (v + dv) * CHUNK_SIZE;
                mask[row + u..row + u + width].fill(None);
            }

            let local = face_block_coords(basis, slice, u as i32, v as i32).as_uvec3();
            let stretch = UVec2::new(width as u32, height as u32);
            let vertices = by_block.entry(cell.block).or_default();
            for corner in QUAD_CORNERS {
                let ao = cell.corner_ao[corner_slot(basis.wind(corner))];
                vertices.push(PackedQuadVertex::new(local, face, u32::from(ao), stretch));
            }

            u += width;
        }
    }
}

/// Occlusion count per unit corner of the face, in `QUAD_CORNERS` order. Each
/// corner counts its two edge neighbours and the diagonal between them in the
/// layer the face looks into; two solid edges always give the darkest bucket.
fn corner_ao_buckets(
    chunk: &ChunkData,
    registry: &BlockRegistry,
    neighbors: &ChunkNeighbors<'_>,
    basis: &FaceBasis,
    coords: IVec3,
) -> [u8; 4] {
    let layer = coords + basis.normal;
    let u_dir = basis.u_dir();
    let v_dir = basis.v_dir();
    let occludes = |pos: IVec3| {
        let def = registry.get(sample_block(chunk, neighbors, pos));
        def.is_meshable && !def.is_transparent
    };

    QUAD_CORNERS.map(|corner| {
        let su = corner.x as i32 * 2 - 1;
        let sv = corner.y as i32 * 2 - 1;
        let side_u = occludes(layer + u_dir * su);
        let side_v = occludes(layer + v_dir * sv);
        let diagonal = occludes(layer + u_dir * su + v_dir * sv);
        if side_u && side_v {
            MAX_AO_BUCKET
        } else {
            u8::from(side_u) + u8::from(side_v) + u8::from(diagonal)
        }
    })
}

fn corner_slot(corner: UVec2) -> usize {
    match (corner.x, corner.y) {
        (0, 0) => 0,
        (1, 0) => 1,
        (1, 1) => 2,
        _ => 3,
    }
}

fn face_block_coords(basis: &FaceBasis, slice: i32, u: i32, v: i32) -> IVec3 {
    let mut coords = IVec3::ZERO;
    coords[basis.axis] = slice;
    coords[basis.u_axis] = u;
    coords[basis.v_axis] = v;
    coords
}

fn sample_block(chunk: &ChunkData, neighbors: &ChunkNeighbors<'_>, coords: IVec3) -> BlockId {
    if let Some(local) = LocalPos::from_ivec3(coords) {
        return chunk.get(local);
    }

    let neighbor = match (axis_out(coords.x), axis_out(coords.y), axis_out(coords.z)) {
        (-1, 0, 0) => neighbors.neg_x,
        (1, 0, 0) => neighbors.pos_x,
        (0, -1, 0) => neighbors.neg_y,
        (0, 1, 0) => neighbors.pos_y,
        (0, 0, -1) => neighbors.neg_z,
        (0, 0, 1) => neighbors.pos_z,
        _ => None,
    };

    match neighbor {
        Some(neighbor_chunk) => {
            let wrapped = UVec3::new(
                coords.x.rem_euclid(CHUNK_SIZE_I32) as u32,
                coords.y.rem_euclid(CHUNK_SIZE_I32) as u32,
                coords.z.rem_euclid(CHUNK_SIZE_I32) as u32,
            );
            neighbor_chunk.get(LocalPos::new(wrapped.x as u8, wrapped.y as u8, wrapped.z as u8))
        }
        None => BlockId::AIR,
    }
}

fn axis_out(value: i32) -> i8 {
    if value < 0 {
        -1
    } else if value >= CHUNK_SIZE_I32 {
        1
    } else {
        0
    }
}
