use bytemuck::{Pod, Zeroable};
use glam::{IVec3, Mat4, Vec3};
use tessera_shared::coords::ChunkPos;
use tessera_shared::expand::{StreamLayout, QUAD_CORNERS};
use tessera_shared::lighting::PbrMaterial;
use tessera_shared::packed::PackedQuadVertex;

/// Vertex-buffer view of a packed record. One 32-bit word, decoded in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuPackedQuad {
    pub packed: u32,
}
const _: [(); 4] = [(); std::mem::size_of::<GpuPackedQuad>()];

impl GpuPackedQuad {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Uint32];

    /// Per-vertex layouts step once per vertex, instanced layouts once per quad.
    pub fn desc<'a>(layout: StreamLayout) -> wgpu::VertexBufferLayout<'a> {
        let step_mode = match layout {
            StreamLayout::PerVertex => wgpu::VertexStepMode::Vertex,
            StreamLayout::Instanced => wgpu::VertexStepMode::Instance,
        };
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuPackedQuad>() as wgpu::BufferAddress,
            step_mode,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<PackedQuadVertex> for GpuPackedQuad {
    fn from(record: PackedQuadVertex) -> Self {
        Self { packed: record.0 }
    }
}

/// Unit-quad corner fed alongside instanced records.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuQuadCorner {
    pub corner: [u32; 2],
}
const _: [(); 8] = [(); std::mem::size_of::<GpuQuadCorner>()];

impl GpuQuadCorner {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Uint32x2];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuQuadCorner>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn unit_quad() -> [Self; 4] {
        QUAD_CORNERS.map(|corner| Self {
            corner: corner.to_array(),
        })
    }
}

/// Vertex buffers a pipeline expects for `layout`, in slot order.
pub fn vertex_buffer_layouts<'a>(layout: StreamLayout) -> Vec<wgpu::VertexBufferLayout<'a>> {
    match layout {
        StreamLayout::PerVertex => vec![GpuPackedQuad::desc(layout)],
        StreamLayout::Instanced => vec![GpuPackedQuad::desc(layout), GpuQuadCorner::desc()],
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    /// rgb light color, w ambient strength.
    pub light_color: [f32; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4, light_position: Vec3, light_color: Vec3, ambient: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            light_color: light_color.extend(ambient).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ChunkUniform {
    /// Chunk coordinate; the shader scales it by the chunk size.
    pub origin: [i32; 4],
    pub base_color: [f32; 4],
}

impl ChunkUniform {
    pub fn new(chunk_pos: ChunkPos, base_color: Vec3) -> Self {
        let origin: IVec3 = chunk_pos.as_ivec3();
        Self {
            origin: origin.extend(0).to_array(),
            base_color: base_color.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub reflectance: f32,
    pub perceptual_roughness: f32,
    pub metallic: f32,
    _padding: f32,
}

impl From<PbrMaterial> for MaterialUniform {
    fn from(material: PbrMaterial) -> Self {
        Self {
            reflectance: material.reflectance,
            perceptual_roughness: material.perceptual_roughness,
            metallic: material.metallic,
            _padding: 0.0,
        }
    }
}

impl Default for MaterialUniform {
    fn default() -> Self {
        PbrMaterial::default().into()
    }
}
