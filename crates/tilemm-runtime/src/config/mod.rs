/// Benchmark config module.
pub mod benchmark;
/// Compilation config module.
pub mod compilation;
/// Device selection config module.
pub mod device;
/// Validation config module.
pub mod validation;

mod base;
mod logger;

pub use base::*;
pub use logger::*;
