use tilemm_runtime::{ElemType, server::ServerError};

use crate::template::TemplateError;

/// Errors that prevent a matmul from being launched or completed.
#[derive(Debug, thiserror::Error)]
pub enum MatmulLaunchError {
    /// The problem doesn't fit the strategy.
    #[error("Unable to launch matmul because the problem isn't correctly defined: {0}")]
    InvalidProblem(#[from] MatmulInvalidProblem),

    /// The kernel template couldn't be instantiated.
    #[error("Unable to launch matmul because the kernel couldn't be generated: {0}")]
    Template(#[from] TemplateError),

    /// The runtime failed.
    #[error("Unable to launch matmul because the runtime failed: {0}")]
    Server(#[from] ServerError),

    /// The host element type doesn't match the problem precision.
    #[error(
        "Unable to launch matmul because the problem is in {expected} but the operands are {actual}"
    )]
    PrecisionMismatch {
        /// Precision of the problem.
        expected: ElemType,
        /// Element type of the operands.
        actual: ElemType,
    },
}

/// A dimension of a matmul problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MatmulDim {
    /// Rows of the output.
    M,
    /// Shared dimension.
    K,
    /// Columns of the output.
    N,
}

/// A problem that a strategy can't compute correctly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatmulInvalidProblem {
    /// Every dimension must be at least one.
    #[error("Problem has {dim}=0")]
    EmptyDimension {
        /// The empty dimension.
        dim: MatmulDim,
    },

    /// The kernel loads unmasked tiles, so the tile must divide the dimension.
    #[error("Problem has {dim}={extent}, which isn't divisible by the tile extent {tile}")]
    TileNotDivisible {
        /// The dimension.
        dim: MatmulDim,
        /// Its extent.
        extent: usize,
        /// Tile extent along the dimension.
        tile: u32,
    },

    /// The workgroup shape doesn't fit the kernel.
    #[error("Workgroup ({workgroup}) is invalid: {reason}")]
    InvalidWorkgroup {
        /// The workgroup shape.
        workgroup: tilemm_common::Shape3,
        /// Why it can't be used.
        reason: &'static str,
    },

    /// The block tiling parameters are inconsistent.
    #[error("Block tiling BM={bm}, BK={bk}, BN={bn}, TM={tm} is invalid: {reason}")]
    InvalidTiling {
        /// Rows of an output block.
        bm: u32,
        /// Depth of the staged tiles.
        bk: u32,
        /// Columns of an output block.
        bn: u32,
        /// Output rows per worker.
        tm: u32,
        /// Why it can't be used.
        reason: &'static str,
    },

    /// An operand doesn't hold the number of elements its shape requires.
    #[error("Operand {operand} holds {actual} elements, expected {expected}")]
    OperandSize {
        /// The operand name.
        operand: &'static str,
        /// Expected number of elements.
        expected: usize,
        /// Actual number of elements.
        actual: usize,
    },
}
