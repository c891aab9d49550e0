use std::ops::{Add, Sub};

use glam::IVec3;
use serde::{Deserialize, Serialize};

pub const CHUNK_SIZE: usize = 32;
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Grid-space origin of a chunk, in chunk units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl ChunkPos {
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// World-space block coordinate of this chunk's (0, 0, 0) cell.
    ///
    /// Exact for chunk coordinates within ±2^26; beyond that the result wraps
    /// in two's complement, the same as the shader's `i32` arithmetic.
    pub fn world_origin(self) -> IVec3 {
        self.as_ivec3().wrapping_mul(IVec3::splat(CHUNK_SIZE_I32))
    }

    pub fn offset(self, delta: IVec3) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.z + delta.z)
    }
}

impl From<IVec3> for ChunkPos {
    fn from(value: IVec3) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl Add for ChunkPos {
    type Output = ChunkPos;

    fn add(self, rhs: Self) -> Self::Output {
        self.offset(rhs.as_ivec3())
    }
}

impl Sub for ChunkPos {
    type Output = ChunkPos;

    fn sub(self, rhs: Self) -> Self::Output {
        self.offset(-rhs.as_ivec3())
    }
}

impl LocalPos {
    pub const fn new(x: u8, y: u8, z: u8) -> Self {
        Self { x, y, z }
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(i32::from(self.x), i32::from(self.y), i32::from(self.z))
    }

    /// Returns `None` when any component falls outside `[0, CHUNK_SIZE)`.
    pub fn from_ivec3(value: IVec3) -> Option<Self> {
        let in_bounds = |v: i32| (0..CHUNK_SIZE_I32).contains(&v);
        if in_bounds(value.x) && in_bounds(value.y) && in_bounds(value.z) {
            Some(Self::new(value.x as u8, value.y as u8, value.z as u8))
        } else {
            None
        }
    }
}

fn div_rem_floor(value: i32, divisor: i32) -> (i32, i32) {
    (value.div_euclid(divisor), value.rem_euclid(divisor))
}

pub fn world_to_chunk(world_pos: IVec3) -> (ChunkPos, LocalPos) {
    let (chunk_x, local_x) = div_rem_floor(world_pos.x, CHUNK_SIZE_I32);
    let (chunk_y, local_y) = div_rem_floor(world_pos.y, CHUNK_SIZE_I32);
    let (chunk_z, local_z) = div_rem_floor(world_pos.z, CHUNK_SIZE_I32);

    (
        ChunkPos::new(chunk_x, chunk_y, chunk_z),
        LocalPos::new(local_x as u8, local_y as u8, local_z as u8),
    )
}

pub fn chunk_to_world(chunk_pos: ChunkPos, local: LocalPos) -> IVec3 {
    chunk_pos.world_origin().wrapping_add(local.as_ivec3())
}

pub fn local_to_index(local: LocalPos) -> usize {
    usize::from(local.x)
        + usize::from(local.z) * CHUNK_SIZE
        + usize::from(local.y) * CHUNK_SIZE * CHUNK_SIZE
}

pub fn index_to_local(index: usize) -> LocalPos {
    assert!(index < CHUNK_VOLUME, "chunk index out of bounds: {index}");

    let y = index / (CHUNK_SIZE * CHUNK_SIZE);
    let rem = index % (CHUNK_SIZE * CHUNK_SIZE);
    LocalPos::new((rem % CHUNK_SIZE) as u8, y as u8, (rem / CHUNK_SIZE) as u8)
}
