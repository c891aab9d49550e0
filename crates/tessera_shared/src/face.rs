use glam::{IVec3, UVec2, Vec3};

/// Block face orientation, in the order the packed format stores it.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Left = 0,
    Right = 1,
    Down = 2,
    Up = 3,
    Forward = 4,
    Back = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Left,
        Face::Right,
        Face::Down,
        Face::Up,
        Face::Forward,
        Face::Back,
    ];

    /// Selectors 6 and 7 fit the 3-bit field but name no face; they resolve to `Up`.
    pub const fn from_index(index: u32) -> Self {
        match index {
            0 => Face::Left,
            1 => Face::Right,
            2 => Face::Down,
            4 => Face::Forward,
            5 => Face::Back,
            _ => Face::Up,
        }
    }

    pub const fn index(self) -> u32 {
        self as u32
    }

    pub const fn opposite(self) -> Self {
        match self {
            Face::Left => Face::Right,
            Face::Right => Face::Left,
            Face::Down => Face::Up,
            Face::Up => Face::Down,
            Face::Forward => Face::Back,
            Face::Back => Face::Forward,
        }
    }

    pub fn basis(self) -> &'static FaceBasis {
        &FACE_BASES[self as usize]
    }

    /// Offset to the cell this face looks into; used for culling and AO sampling.
    pub fn sample_dir(self) -> IVec3 {
        self.basis().normal
    }

    /// Component index of the face normal.
    pub fn axis(self) -> usize {
        self.basis().axis
    }

    pub fn is_positive(self) -> bool {
        self.basis().plane_offset == 1
    }
}

/// Orientation data for one face. `u_axis`/`v_axis`/`axis` are component indices
/// (0 = X, 1 = Y, 2 = Z).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceBasis {
    pub normal: IVec3,
    pub axis: usize,
    pub u_axis: usize,
    pub v_axis: usize,
    /// Distance of the face plane from the block's min corner along `axis`.
    pub plane_offset: i32,
    /// Set when U x V points inward, so corners must be visited in mirrored order.
    pub reverse_winding: bool,
}

impl FaceBasis {
    pub fn normal_f32(&self) -> Vec3 {
        self.normal.as_vec3()
    }

    pub fn u_dir(&self) -> IVec3 {
        unit_axis(self.u_axis)
    }

    pub fn v_dir(&self) -> IVec3 {
        unit_axis(self.v_axis)
    }

    /// Maps a canonical corner onto the corner visited at the same step of a
    /// counter-clockwise (seen from outside) walk around this face.
    pub fn wind(&self, corner: UVec2) -> UVec2 {
        if self.reverse_winding {
            UVec2::new(corner.y, corner.x)
        } else {
            corner
        }
    }
}

fn unit_axis(axis: usize) -> IVec3 {
    let mut dir = IVec3::ZERO;
    dir[axis] = 1;
    dir
}

pub static FACE_BASES: [FaceBasis; 6] = [
    // Left (-X)
    FaceBasis {
        normal: IVec3::NEG_X,
        axis: 0,
        u_axis: 2,
        v_axis: 1,
        plane_offset: 0,
        reverse_winding: false,
    },
    // Right (+X)
    FaceBasis {
        normal: IVec3::X,
        axis: 0,
        u_axis: 2,
        v_axis: 1,
        plane_offset: 1,
        reverse_winding: true,
    },
    // Down (-Y)
    FaceBasis {
        normal: IVec3::NEG_Y,
        axis: 1,
        u_axis: 0,
        v_axis: 2,
        plane_offset: 0,
        reverse_winding: false,
    },
    // Up (+Y)
    FaceBasis {
        normal: IVec3::Y,
        axis: 1,
        u_axis: 0,
        v_axis: 2,
        plane_offset: 1,
        reverse_winding: true,
    },
    // Forward (-Z)
    FaceBasis {
        normal: IVec3::NEG_Z,
        axis: 2,
        u_axis: 0,
        v_axis: 1,
        plane_offset: 0,
        reverse_winding: true,
    },
    // Back (+Z)
    FaceBasis {
        normal: IVec3::Z,
        axis: 2,
        u_axis: 0,
        v_axis: 1,
        plane_offset: 1,
        reverse_winding: false,
    },
];
