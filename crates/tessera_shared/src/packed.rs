//! 32-bit packed quad records as produced by the mesher and read by the
//! vertex stage.
//!
//! Canonical (`Stretched`) layout, low bit first:
//!
//! | bits  | field                |
//! |-------|----------------------|
//! | 0-4   | local x              |
//! | 5-9   | local y              |
//! | 10-14 | local z              |
//! | 15-17 | face selector        |
//! | 18-19 | AO bucket            |
//! | 20-24 | stretch along U - 1  |
//! | 25-29 | stretch along V - 1  |
//!
//! The `Plain` layout stores unmerged single-block faces with 6-bit positions
//! and a 3-bit AO bucket; it has no stretch fields and always decodes as 1x1.
//! The WGSL chunk shader reads the same offsets, so both sides change together.

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, UVec3};

use crate::face::Face;

/// A fixed `width`-bit unsigned field starting at bit `offset`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    pub offset: u32,
    pub width: u32,
}

impl BitField {
    pub const fn new(offset: u32, width: u32) -> Self {
        assert!(width > 0 && offset + width <= 32, "bit field exceeds 32 bits");
        Self { offset, width }
    }

    pub const fn mask(self) -> u32 {
        if self.width == 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Largest value the field can hold.
    pub const fn max_value(self) -> u32 {
        self.mask()
    }

    #[inline]
    pub const fn extract(self, packed: u32) -> u32 {
        (packed >> self.offset) & self.mask()
    }

    /// Writes `value` into the field, truncating it to `width` bits.
    #[inline]
    pub const fn insert(self, packed: u32, value: u32) -> u32 {
        let mask = self.mask();
        (packed & !(mask << self.offset)) | ((value & mask) << self.offset)
    }

    const fn end(self) -> u32 {
        self.offset + self.width
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FormatLayout {
    pub x: BitField,
    pub y: BitField,
    pub z: BitField,
    pub face: BitField,
    pub ao: BitField,
    pub stretch_u: Option<BitField>,
    pub stretch_v: Option<BitField>,
}

impl FormatLayout {
    /// Number of low bits the layout occupies.
    pub const fn used_bits(&self) -> u32 {
        let mut end = self.x.end();
        let fields = [self.y, self.z, self.face, self.ao];
        let mut i = 0;
        while i < fields.len() {
            if fields[i].end() > end {
                end = fields[i].end();
            }
            i += 1;
        }
        if let Some(field) = self.stretch_u {
            if field.end() > end {
                end = field.end();
            }
        }
        if let Some(field) = self.stretch_v {
            if field.end() > end {
                end = field.end();
            }
        }
        end
    }
}

pub const STRETCHED_LAYOUT: FormatLayout = FormatLayout {
    x: BitField::new(0, 5),
    y: BitField::new(5, 5),
    z: BitField::new(10, 5),
    face: BitField::new(15, 3),
    ao: BitField::new(18, 2),
    stretch_u: Some(BitField::new(20, 5)),
    stretch_v: Some(BitField::new(25, 5)),
};

pub const PLAIN_LAYOUT: FormatLayout = FormatLayout {
    x: BitField::new(0, 6),
    y: BitField::new(6, 6),
    z: BitField::new(12, 6),
    ao: BitField::new(18, 3),
    face: BitField::new(21, 3),
    stretch_u: None,
    stretch_v: None,
};

const _: () = assert!(STRETCHED_LAYOUT.used_bits() == 30);
const _: () = assert!(PLAIN_LAYOUT.used_bits() == 24);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PackedFormat {
    Plain,
    #[default]
    Stretched,
}

impl PackedFormat {
    pub const fn layout(self) -> &'static FormatLayout {
        match self {
            PackedFormat::Plain => &PLAIN_LAYOUT,
            PackedFormat::Stretched => &STRETCHED_LAYOUT,
        }
    }

    pub const fn has_stretch(self) -> bool {
        matches!(self, PackedFormat::Stretched)
    }
}

/// Unpacked view of one record. `stretch` holds real extents (1..=32), not the
/// stored minus-one values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedQuad {
    pub local: UVec3,
    pub face: Face,
    pub ao: u32,
    pub stretch: UVec2,
}

impl DecodedQuad {
    pub fn unit(local: UVec3, face: Face, ao: u32) -> Self {
        Self {
            local,
            face,
            ao,
            stretch: UVec2::ONE,
        }
    }
}

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedQuadVertex(pub u32);

impl PackedQuadVertex {
    /// Canonical-format record for one quad.
    pub fn new(local: UVec3, face: Face, ao: u32, stretch: UVec2) -> Self {
        Self::encode(
            PackedFormat::Stretched,
            &DecodedQuad {
                local,
                face,
                ao,
                stretch,
            },
        )
    }

    /// Fields are truncated to their widths; stretch is ignored by `Plain`.
    pub fn encode(format: PackedFormat, quad: &DecodedQuad) -> Self {
        let layout = format.layout();
        let mut packed = 0u32;
        packed = layout.x.insert(packed, quad.local.x);
        packed = layout.y.insert(packed, quad.local.y);
        packed = layout.z.insert(packed, quad.local.z);
        packed = layout.face.insert(packed, quad.face.index());
        packed = layout.ao.insert(packed, quad.ao);
        if let Some(field) = layout.stretch_u {
            packed = field.insert(packed, quad.stretch.x.saturating_sub(1));
        }
        if let Some(field) = layout.stretch_v {
            packed = field.insert(packed, quad.stretch.y.saturating_sub(1));
        }
        Self(packed)
    }

    #[inline]
    pub fn local(self, format: PackedFormat) -> UVec3 {
        let layout = format.layout();
        UVec3::new(
            layout.x.extract(self.0),
            layout.y.extract(self.0),
            layout.z.extract(self.0),
        )
    }

    #[inline]
    pub fn face(self, format: PackedFormat) -> Face {
        Face::from_index(format.layout().face.extract(self.0))
    }

    #[inline]
    pub fn ao(self, format: PackedFormat) -> u32 {
        format.layout().ao.extract(self.0)
    }

    #[inline]
    pub fn stretch(self, format: PackedFormat) -> UVec2 {
        let layout = format.layout();
        let extent = |field: Option<BitField>| field.map_or(1, |f| f.extract(self.0) + 1);
        UVec2::new(extent(layout.stretch_u), extent(layout.stretch_v))
    }

    pub fn decode(self, format: PackedFormat) -> DecodedQuad {
        DecodedQuad {
            local: self.local(format),
            face: self.face(format),
            ao: self.ao(format),
            stretch: self.stretch(format),
        }
    }
}

impl From<u32> for PackedQuadVertex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
