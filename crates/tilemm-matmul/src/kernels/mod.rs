//! The three matmul kernels. Each one instantiates its WGSL template for a problem and computes
//! the grid of workgroups covering the output.

/// One worker per output element, reading straight from global memory.
pub mod naive;

/// Square tiles staged in workgroup memory.
pub mod tiled;

/// Block tiles with several output rows per worker.
pub mod block_tiled;
