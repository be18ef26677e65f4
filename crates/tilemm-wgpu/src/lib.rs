//! [wgpu] implementation of the tilemm runtime.

extern crate alloc;

mod compute;
mod device;
mod runtime;

pub use compute::*;
pub use device::*;
pub use runtime::*;
