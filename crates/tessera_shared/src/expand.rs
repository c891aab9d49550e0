use glam::{IVec3, UVec2, Vec3};
use rayon::prelude::*;

use crate::coords::ChunkPos;
use crate::packed::{DecodedQuad, PackedFormat, PackedQuadVertex};

/// Unit-quad corners in canonical order; `(u, v)` components are 0 or 1.
pub const QUAD_CORNERS: [UVec2; 4] = [
    UVec2::new(0, 0),
    UVec2::new(1, 0),
    UVec2::new(1, 1),
    UVec2::new(0, 1),
];

/// How corners are paired with packed records.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StreamLayout {
    /// Four records per quad; record `i` uses corner `i % 4`.
    #[default]
    PerVertex,
    /// One record per quad, expanded against all four corners.
    Instanced,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExpandedVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub ao: u32,
}

/// World-space block coordinate of `corner` on the quad's face.
///
/// Corner components outside {0, 1} are not rejected; they produce a point
/// off the quad.
pub fn expand_corner(quad: &DecodedQuad, origin: ChunkPos, corner: UVec2) -> IVec3 {
    let basis = quad.face.basis();
    let mut position = origin.world_origin().wrapping_add(quad.local.as_ivec3());
    let u_step = corner.x.wrapping_mul(quad.stretch.x) as i32;
    let v_step = corner.y.wrapping_mul(quad.stretch.y) as i32;
    position[basis.u_axis] = position[basis.u_axis].wrapping_add(u_step);
    position[basis.v_axis] = position[basis.v_axis].wrapping_add(v_step);
    position[basis.axis] = position[basis.axis].wrapping_add(basis.plane_offset);
    position
}

#[inline]
pub fn expand(quad: &DecodedQuad, origin: ChunkPos, corner: UVec2) -> ExpandedVertex {
    ExpandedVertex {
        position: expand_corner(quad, origin, corner).as_vec3(),
        normal: quad.face.basis().normal_f32(),
        ao: quad.ao,
    }
}

/// The quad's four corners, wound counter-clockwise as seen from outside.
pub fn quad_positions(quad: &DecodedQuad, origin: ChunkPos) -> [IVec3; 4] {
    let basis = quad.face.basis();
    QUAD_CORNERS.map(|corner| expand_corner(quad, origin, basis.wind(corner)))
}

pub fn expand_stream(
    records: &[PackedQuadVertex],
    format: PackedFormat,
    layout: StreamLayout,
    origin: ChunkPos,
) -> Vec<ExpandedVertex> {
    match layout {
        StreamLayout::PerVertex => records
            .par_iter()
            .enumerate()
            .map(|(i, record)| {
                let quad = record.decode(format);
                let corner = quad.face.basis().wind(QUAD_CORNERS[i % 4]);
                expand(&quad, origin, corner)
            })
            .collect(),
        StreamLayout::Instanced => records
            .par_iter()
            .flat_map_iter(|record| {
                let quad = record.decode(format);
                let basis = quad.face.basis();
                QUAD_CORNERS
                    .into_iter()
                    .map(move |corner| expand(&quad, origin, basis.wind(corner)))
            })
            .collect(),
    }
}

/// Two counter-clockwise triangles per quad over consecutive groups of four vertices.
pub fn quad_indices(quad_count: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quad_count * 6);
    for quad in 0..quad_count as u32 {
        let base = quad * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, UVec2, UVec3, Vec3};

    use super::{
        expand, expand_corner, expand_stream, quad_indices, quad_positions, StreamLayout,
        QUAD_CORNERS,
    };
    use crate::coords::{ChunkPos, CHUNK_SIZE_I32};
    use crate::face::Face;
    use crate::packed::{DecodedQuad, PackedFormat, PackedQuadVertex};

    fn sorted(mut corners: Vec<IVec3>) -> Vec<IVec3> {
        corners.sort_by_key(|c| (c.x, c.y, c.z));
        corners
    }

    fn cube_face(face: Face) -> Vec<IVec3> {
        let basis = face.basis();
        let mut corners = Vec::new();
        for x in 0..=1 {
            for y in 0..=1 {
                for z in 0..=1 {
                    let corner = IVec3::new(x, y, z);
                    if corner[basis.axis] == basis.plane_offset {
                        corners.push(corner);
                    }
                }
            }
        }
        sorted(corners)
    }

    #[test]
    fn unit_quads_land_on_unit_cube_faces() {
        for face in Face::ALL {
            let packed = PackedQuadVertex::new(UVec3::ZERO, face, 0, UVec2::ONE);
            let quad = packed.decode(PackedFormat::Stretched);
            let corners = quad_positions(&quad, ChunkPos::ORIGIN);
            assert_eq!(sorted(corners.to_vec()), cube_face(face), "{face:?}");

            let vertex = expand(&quad, ChunkPos::ORIGIN, UVec2::ZERO);
            assert_eq!(vertex.normal, face.basis().normal_f32());
        }
    }

    #[test]
    fn up_face_scenario_lands_on_expected_corner() {
        let packed = PackedQuadVertex::new(UVec3::new(3, 4, 5), Face::Up, 1, UVec2::new(2, 1));
        let quad = packed.decode(PackedFormat::Stretched);
        let vertex = expand(&quad, ChunkPos::ORIGIN, UVec2::new(1, 1));
        assert_eq!(vertex.position, Vec3::new(5.0, 5.0, 6.0));
        assert_eq!(vertex.normal, Vec3::Y);
        assert_eq!(vertex.ao, 1);
    }

    #[test]
    fn stretched_quad_spans_exact_extents() {
        for face in Face::ALL {
            let basis = face.basis();
            let unit = DecodedQuad::unit(UVec3::new(7, 8, 9), face, 0);
            let stretched = DecodedQuad {
                stretch: UVec2::new(5, 3),
                ..unit
            };
            let corners = quad_positions(&stretched, ChunkPos::ORIGIN);
            let min = corners.iter().copied().reduce(IVec3::min).unwrap();
            let max = corners.iter().copied().reduce(IVec3::max).unwrap();
            assert_eq!(max[basis.u_axis] - min[basis.u_axis], 5, "{face:?}");
            assert_eq!(max[basis.v_axis] - min[basis.v_axis], 3, "{face:?}");
            assert_eq!(min[basis.axis], max[basis.axis]);

            let unit_plane = expand_corner(&unit, ChunkPos::ORIGIN, UVec2::ZERO)[basis.axis];
            assert_eq!(min[basis.axis], unit_plane, "{face:?}");
        }
    }

    #[test]
    fn adjacent_chunks_share_boundary_plane() {
        let edge = (CHUNK_SIZE_I32 - 1) as u32;
        let right = DecodedQuad::unit(UVec3::new(edge, 2, 3), Face::Right, 0);
        let left = DecodedQuad::unit(UVec3::new(0, 2, 3), Face::Left, 0);

        let a = quad_positions(&right, ChunkPos::new(0, 0, 0));
        let b = quad_positions(&left, ChunkPos::new(1, 0, 0));
        assert!(a.iter().all(|c| c.x == CHUNK_SIZE_I32));
        assert_eq!(sorted(a.to_vec()), sorted(b.to_vec()));
    }

    #[test]
    fn chunk_origin_translates_by_chunk_edge() {
        let quad = DecodedQuad::unit(UVec3::new(1, 2, 3), Face::Down, 0);
        let here = expand_corner(&quad, ChunkPos::new(0, 0, 0), UVec2::ZERO);
        let there = expand_corner(&quad, ChunkPos::new(-1, 2, 0), UVec2::ZERO);
        assert_eq!(there - here, IVec3::new(-32, 64, 0));
    }

    #[test]
    fn extreme_chunk_origin_expands_without_overflow_panic() {
        let quad = DecodedQuad {
            local: UVec3::new(31, 31, 31),
            face: Face::Right,
            ao: 0,
            stretch: UVec2::new(32, 32),
        };
        let origin = ChunkPos::new(i32::MAX, i32::MAX, i32::MAX);
        let corner = expand_corner(&quad, origin, UVec2::ONE);
        let base = i32::MAX.wrapping_mul(CHUNK_SIZE_I32).wrapping_add(31);
        assert_eq!(corner, IVec3::new(base + 1, base + 32, base + 32));
    }

    #[test]
    fn per_vertex_and_instanced_streams_agree() {
        let quads = [
            PackedQuadVertex::new(UVec3::new(1, 1, 1), Face::Up, 2, UVec2::new(3, 2)),
            PackedQuadVertex::new(UVec3::new(4, 0, 9), Face::Forward, 0, UVec2::new(1, 4)),
        ];
        let per_vertex: Vec<PackedQuadVertex> = quads.iter().flat_map(|&q| [q; 4]).collect();
        let origin = ChunkPos::new(2, -1, 0);

        let a = expand_stream(
            &per_vertex,
            PackedFormat::Stretched,
            StreamLayout::PerVertex,
            origin,
        );
        let b = expand_stream(&quads, PackedFormat::Stretched, StreamLayout::Instanced, origin);
        assert_eq!(a.len(), 8);
        assert_eq!(a, b);

        for (i, quad) in quads.iter().enumerate() {
            let decoded = quad.decode(PackedFormat::Stretched);
            let expected = quad_positions(&decoded, origin);
            for (j, corner) in expected.iter().enumerate() {
                assert_eq!(a[i * 4 + j].position, corner.as_vec3());
            }
        }
    }

    #[test]
    fn indexed_triangles_face_outward() {
        let indices = quad_indices(1);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        for face in Face::ALL {
            let quad = DecodedQuad::unit(UVec3::ZERO, face, 0);
            let corners = quad_positions(&quad, ChunkPos::ORIGIN);
            for tri in indices.chunks(3) {
                let [a, b, c] = [0, 1, 2].map(|k| corners[tri[k] as usize]);
                assert_eq!((b - a).cross(c - a), face.basis().normal, "{face:?}");
            }
        }
    }

    #[test]
    fn quad_indices_offsets_each_quad() {
        let indices = quad_indices(2);
        assert_eq!(&indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(QUAD_CORNERS.len(), 4);
    }
}
