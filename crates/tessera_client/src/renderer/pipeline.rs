use tessera_shared::expand::StreamLayout;
use tracing::debug;

use crate::renderer::vertex::vertex_buffer_layouts;

#[derive(Debug)]
pub struct ChunkPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: StreamLayout,
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    pub chunk_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
}

impl ChunkPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        layout: StreamLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chunk Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../../assets/shaders/chunk.wgsl"
                ))
                .into(),
            ),
        });

        let camera_bind_group_layout = uniform_bind_group_layout(
            device,
            "Chunk Camera Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let chunk_bind_group_layout = uniform_bind_group_layout(
            device,
            "Chunk Origin Bind Group Layout",
            wgpu::ShaderStages::VERTEX,
        );
        let material_bind_group_layout = uniform_bind_group_layout(
            device,
            "Chunk Material Bind Group Layout",
            wgpu::ShaderStages::FRAGMENT,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chunk Pipeline Layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &chunk_bind_group_layout,
                &material_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let buffers = vertex_buffer_layouts(layout);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Chunk Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(vertex_entry_point(layout)),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        debug!("Created chunk pipeline for {:?} streams", layout);

        Self {
            pipeline,
            layout,
            camera_bind_group_layout,
            chunk_bind_group_layout,
            material_bind_group_layout,
        }
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn stream_layout(&self) -> StreamLayout {
        self.layout
    }
}

pub fn vertex_entry_point(layout: StreamLayout) -> &'static str {
    match layout {
        StreamLayout::PerVertex => "vs_main",
        StreamLayout::Instanced => "vs_instanced",
    }
}

fn uniform_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}
