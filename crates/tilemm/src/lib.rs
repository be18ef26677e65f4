//! Benchmark harness for templated WGSL matrix multiplication kernels.
//!
//! The kernels and the benchmark loop live in [matmul], the runtime interface in [runtime].
//! Enable the `wgpu` feature for the [wgpu] runtime.

pub use tilemm_common as common;
pub use tilemm_matmul as matmul;
pub use tilemm_runtime as runtime;

pub use tilemm_common::future;
pub use tilemm_runtime::{ElemType, Element, Runtime, client::ComputeClient};

#[cfg(feature = "wgpu")]
pub use tilemm_wgpu as wgpu;
