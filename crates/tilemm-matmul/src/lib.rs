#![warn(missing_docs)]

//! Matrix multiplication `C = A·Bᵗ` on the GPU at three levels of optimization.
//!
//! Each [kernel](kernels) is a WGSL [template](template) instantiated for one problem size. The
//! [launch](launch) module drives the benchmark loop through a
//! [compute client](tilemm_runtime::client::ComputeClient), and the result can be checked
//! against the [CPU reference](reference) with the [validator](validation).

#[macro_use]
extern crate derive_new;

/// WGSL template engine.
pub mod template;
/// The kernel variants.
pub mod kernels;
/// Benchmark loop.
pub mod launch;
/// CPU reference implementation.
pub mod reference;
/// Comparison of device results with the reference.
pub mod validation;

mod error;
mod problem;
mod strategy;

pub use error::*;
pub use problem::*;
pub use strategy::*;
