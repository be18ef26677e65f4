use core::fmt::Debug;

use crate::{
    client::ComputeClient,
    server::{ComputeServer, ServerError},
};

/// A GPU runtime: a device type and the server driving it.
pub trait Runtime: Sized + Send + Sync + 'static + Debug {
    /// The compute server used to allocate buffers and dispatch kernels.
    type Server: ComputeServer;
    /// The device used to create the compute client.
    type Device: Default + Clone + Debug + Send + Sync;

    /// Create an execution context on the given device.
    ///
    /// Failing to find or open the device is fatal for a benchmark run.
    fn create_client(device: &Self::Device) -> Result<ComputeClient<Self::Server>, ServerError>;

    /// The runtime name.
    fn name() -> &'static str;
}
