#![warn(missing_docs)]

//! Common crate for tilemm.

#[macro_use]
extern crate derive_new;

/// Future utils with a compatible API for native and wasm environments.
pub mod future;

/// Random number generation used to fill operands.
pub mod rand;

/// Format utilities.
pub mod format;

mod shape;

pub use shape::*;
