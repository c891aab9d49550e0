//! Per-vertex and per-fragment evaluation of decoded chunk quads.

use glam::{Mat4, UVec2, Vec3, Vec4};

use crate::coords::ChunkPos;
use crate::expand::expand;
use crate::packed::{PackedFormat, PackedQuadVertex};

/// Brightness multiplier per AO bucket, brightest first.
pub const AO_BRIGHTNESS: [f32; 4] = [1.0, 0.7, 0.5, 0.15];

pub const DEFAULT_AMBIENT_STRENGTH: f32 = 0.1;
pub const DEFAULT_LIGHT_POSITION: Vec3 = Vec3::new(64.0, 96.0, 48.0);

/// Buckets past the table (reachable with the 3-bit plain layout) use the darkest entry.
#[inline]
pub fn ao_brightness(bucket: u32) -> f32 {
    AO_BRIGHTNESS[(bucket as usize).min(AO_BRIGHTNESS.len() - 1)]
}

#[inline]
pub fn clip_position(view_proj: Mat4, world_position: Vec3) -> Vec4 {
    view_proj * world_position.extend(1.0)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FragmentInput {
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub base_color: Vec3,
    pub ao: u32,
}

pub trait LightingModel {
    fn shade(&self, fragment: &FragmentInput) -> Vec3;
}

/// Single point light with a fixed ambient fraction and Lambertian diffuse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AmbientDiffuse {
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub ambient_strength: f32,
}

impl Default for AmbientDiffuse {
    fn default() -> Self {
        Self {
            light_position: DEFAULT_LIGHT_POSITION,
            light_color: Vec3::ONE,
            ambient_strength: DEFAULT_AMBIENT_STRENGTH,
        }
    }
}

impl LightingModel for AmbientDiffuse {
    fn shade(&self, fragment: &FragmentInput) -> Vec3 {
        let albedo = fragment.base_color * ao_brightness(fragment.ao);
        let light_dir = (self.light_position - fragment.world_position).normalize_or_zero();
        let diffuse = fragment.world_normal.dot(light_dir).max(0.0);
        let ambient = self.light_color * self.ambient_strength;
        (ambient + self.light_color * diffuse) * albedo
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PbrMaterial {
    pub reflectance: f32,
    pub perceptual_roughness: f32,
    pub metallic: f32,
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self {
            reflectance: 0.5,
            perceptual_roughness: 0.9,
            metallic: 0.0,
        }
    }
}

/// Everything a host physically-based evaluator needs for one fragment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PbrInput {
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub base_color: Vec3,
    pub material: PbrMaterial,
}

pub trait PbrEvaluator {
    fn evaluate(&self, input: &PbrInput) -> Vec3;
}

/// Hands shading to a host-supplied PBR evaluator. AO is folded into the base
/// color so the evaluator never sees the bucket.
#[derive(Clone, Debug)]
pub struct Pbr<E> {
    pub evaluator: E,
    pub material: PbrMaterial,
}

impl<E: PbrEvaluator> Pbr<E> {
    pub fn new(evaluator: E, material: PbrMaterial) -> Self {
        Self {
            evaluator,
            material,
        }
    }
}

impl<E: PbrEvaluator> LightingModel for Pbr<E> {
    fn shade(&self, fragment: &FragmentInput) -> Vec3 {
        self.evaluator.evaluate(&PbrInput {
            world_position: fragment.world_position,
            world_normal: fragment.world_normal,
            base_color: fragment.base_color * ao_brightness(fragment.ao),
            material: self.material,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub world_position: Vec3,
    pub world_normal: Vec3,
    pub ao: u32,
    /// Base color with AO applied.
    pub blend_color: Vec3,
}

impl VertexOutput {
    pub fn fragment(&self, base_color: Vec3) -> FragmentInput {
        FragmentInput {
            world_position: self.world_position,
            world_normal: self.world_normal,
            base_color,
            ao: self.ao,
        }
    }
}

/// Decode, expand and project one record.
pub fn vertex_stage(
    record: PackedQuadVertex,
    format: PackedFormat,
    origin: ChunkPos,
    corner: UVec2,
    view_proj: Mat4,
    base_color: Vec3,
) -> VertexOutput {
    let quad = record.decode(format);
    let vertex = expand(&quad, origin, corner);
    VertexOutput {
        clip_position: clip_position(view_proj, vertex.position),
        world_position: vertex.position,
        world_normal: vertex.normal,
        ao: vertex.ao,
        blend_color: base_color * ao_brightness(vertex.ao),
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, UVec2, UVec3, Vec3, Vec4};

    use super::{
        ao_brightness, vertex_stage, AmbientDiffuse, FragmentInput, LightingModel, Pbr,
        PbrEvaluator, PbrInput, PbrMaterial, AO_BRIGHTNESS,
    };
    use crate::coords::ChunkPos;
    use crate::face::Face;
    use crate::packed::{PackedFormat, PackedQuadVertex};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn ao_brightness_never_increases_with_bucket() {
        for pair in AO_BRIGHTNESS.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert!(ao_brightness(0) >= ao_brightness(3));
        assert_eq!(ao_brightness(7), 0.15);
    }

    #[test]
    fn facing_light_gets_ambient_plus_full_diffuse() {
        let model = AmbientDiffuse {
            light_position: Vec3::new(0.0, 10.0, 0.0),
            ..AmbientDiffuse::default()
        };
        let fragment = FragmentInput {
            world_position: Vec3::ZERO,
            world_normal: Vec3::Y,
            base_color: Vec3::new(0.5, 0.4, 0.2),
            ao: 0,
        };
        assert!(approx(model.shade(&fragment), Vec3::new(0.55, 0.44, 0.22)));
    }

    #[test]
    fn back_facing_surface_only_sees_ambient() {
        let model = AmbientDiffuse {
            light_position: Vec3::new(0.0, -10.0, 0.0),
            ..AmbientDiffuse::default()
        };
        let fragment = FragmentInput {
            world_position: Vec3::ZERO,
            world_normal: Vec3::Y,
            base_color: Vec3::ONE,
            ao: 1,
        };
        assert!(approx(model.shade(&fragment), Vec3::splat(0.1 * 0.7)));
    }

    struct EchoBaseColor;

    impl PbrEvaluator for EchoBaseColor {
        fn evaluate(&self, input: &PbrInput) -> Vec3 {
            input.base_color * (1.0 - input.material.metallic)
        }
    }

    #[test]
    fn pbr_delegation_passes_ao_modulated_base_color() {
        let model = Pbr::new(EchoBaseColor, PbrMaterial::default());
        let fragment = FragmentInput {
            world_position: Vec3::ONE,
            world_normal: Vec3::X,
            base_color: Vec3::splat(0.8),
            ao: 2,
        };
        assert!(approx(model.shade(&fragment), Vec3::splat(0.4)));
    }

    #[test]
    fn vertex_stage_projects_expanded_position() {
        let record = PackedQuadVertex::new(UVec3::new(3, 4, 5), Face::Up, 3, UVec2::new(2, 1));
        let view_proj = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let out = vertex_stage(
            record,
            PackedFormat::Stretched,
            ChunkPos::ORIGIN,
            UVec2::new(1, 1),
            view_proj,
            Vec3::ONE,
        );
        assert_eq!(out.world_position, Vec3::new(5.0, 5.0, 6.0));
        assert_eq!(out.clip_position, Vec4::new(5.0, 5.0, -4.0, 1.0));
        assert_eq!(out.world_normal, Vec3::Y);
        assert!(approx(out.blend_color, Vec3::splat(0.15)));

        let fragment = out.fragment(Vec3::ONE);
        assert_eq!(fragment.ao, 3);
    }
}
