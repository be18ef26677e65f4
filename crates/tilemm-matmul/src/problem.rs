use tilemm_common::Shape3;
use tilemm_runtime::ElemType;

/// Dimensions and precision of `C (M x N) = A (M x K) · Bᵗ`, with `Bᵗ` stored as `N x K`.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatmulProblem {
    /// Rows of `A` and `C`.
    pub m: usize,
    /// Shared dimension.
    pub k: usize,
    /// Columns of `C`.
    pub n: usize,
    /// Element type of every operand.
    pub precision: ElemType,
}

impl MatmulProblem {
    /// A problem of a preset size.
    pub fn from_size(size: MatmulSize, precision: ElemType) -> Self {
        let (m, k, n) = size.dims();
        Self::new(m, k, n, precision)
    }

    /// Shape of `A`.
    pub fn lhs_shape(&self) -> [usize; 2] {
        [self.m, self.k]
    }

    /// Shape of `Bᵗ`.
    pub fn rhs_shape(&self) -> [usize; 2] {
        [self.n, self.k]
    }

    /// Shape of `C`.
    pub fn out_shape(&self) -> [usize; 2] {
        [self.m, self.n]
    }

    /// `M·K·N`, the number of multiply-adds.
    pub fn volume(&self) -> u64 {
        self.m as u64 * self.k as u64 * self.n as u64
    }

    /// `(M, N, 1)`, the extent the workgroup grid has to cover.
    pub fn output_extent(&self) -> Shape3 {
        Shape3::new_2d(self.m as u32, self.n as u32)
    }
}

/// Preset problem sizes.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum MatmulSize {
    /// `M = 16, K = 4, N = 8`.
    #[display("tiny")]
    #[serde(rename = "tiny")]
    Tiny,
    /// `M = 256, K = 128, N = 512`.
    #[default]
    #[display("small")]
    #[serde(rename = "small")]
    Small,
    /// `M = 4096, K = 4096, N = 8192`.
    #[display("large")]
    #[serde(rename = "large")]
    Large,
}

impl MatmulSize {
    /// `(M, K, N)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        match self {
            MatmulSize::Tiny => (16, 4, 8),
            MatmulSize::Small => (256, 128, 512),
            MatmulSize::Large => (4096, 4096, 2 * 4096),
        }
    }
}
