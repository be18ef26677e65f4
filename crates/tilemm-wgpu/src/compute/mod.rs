mod errors;
mod kernel;
mod server;

pub use kernel::*;
pub use server::*;
