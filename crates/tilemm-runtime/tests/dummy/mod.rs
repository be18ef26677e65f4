mod compute;
mod server;

pub use compute::*;
pub use server::*;
