use core::fmt::Display;

/// Ceiling division: the minimum number of `divisor` sized chunks covering `value`.
///
/// # Panics
///
/// If `divisor` is zero.
#[inline]
pub const fn cdiv(value: u32, divisor: u32) -> u32 {
    value.div_ceil(divisor)
}

/// A three dimensional extent, used both for workgroup shapes and workgroup grids.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape3 {
    /// Extent along x.
    pub x: u32,
    /// Extent along y.
    pub y: u32,
    /// Extent along z.
    pub z: u32,
}

impl Shape3 {
    /// Create a one dimensional shape `(x, 1, 1)`.
    pub const fn new_1d(x: u32) -> Self {
        Self { x, y: 1, z: 1 }
    }

    /// Create a two dimensional shape `(x, y, 1)`.
    pub const fn new_2d(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Total number of elements covered by the shape.
    pub const fn num_elems(&self) -> u32 {
        self.x * self.y * self.z
    }

    /// Element-wise ceiling division, giving the grid needed to cover `self` with `tile`.
    pub const fn cdiv(&self, tile: &Shape3) -> Shape3 {
        Shape3 {
            x: cdiv(self.x, tile.x),
            y: cdiv(self.y, tile.y),
            z: cdiv(self.z, tile.z),
        }
    }

    /// Whether every extent is strictly positive.
    pub const fn is_valid(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// The shape as an array `[x, y, z]`.
    pub const fn to_array(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[u32; 3]> for Shape3 {
    fn from([x, y, z]: [u32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Written as `x, y, z`, which is the syntax expected by WGSL `@workgroup_size`.
impl Display for Shape3 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}
