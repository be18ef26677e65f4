#![warn(missing_docs)]

//! Runtime crate that abstracts the GPU services needed by the tilemm benchmark harness.
//!
//! A [runtime](Runtime) creates a [server](server::ComputeServer), which is wrapped by a
//! [client](client::ComputeClient). The client owns the per kernel state machine that makes
//! dispatches strictly sequential: a kernel is dispatched, waited on, then reset before being
//! dispatched again.

extern crate alloc;

#[macro_use]
extern crate derive_new;

mod id;

/// Compute client module.
pub mod client;
/// Compute server module.
pub mod server;
/// Kernel description and lifecycle.
pub mod kernel;
/// One-shot completion tokens.
pub mod sync;
/// Benchmark timing and results.
pub mod benchmark;
/// Global configuration.
pub mod config;

mod element;
mod runtime;

pub use element::*;
pub use id::*;
pub use runtime::*;
