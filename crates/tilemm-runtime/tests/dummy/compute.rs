use std::sync::Arc;

use tilemm_runtime::client::ComputeClient;

use super::DummyServer;

pub type DummyClient = ComputeClient<DummyServer>;

/// CPU computation standing in for a shader. Gets the bound buffers as bytes.
pub trait DummyKernel: Send + Sync {
    fn compute(&self, resources: &mut [&mut Vec<u8>]);
}

/// Adds the first two `u32` buffers into the third one.
#[derive(Debug)]
pub struct DummyElementwiseAddition;

impl DummyKernel for DummyElementwiseAddition {
    fn compute(&self, inputs: &mut [&mut Vec<u8>]) {
        let lhs: Vec<u32> = bytemuck::pod_collect_to_vec(inputs[0].as_slice());
        let rhs: Vec<u32> = bytemuck::pod_collect_to_vec(inputs[1].as_slice());

        let out: Vec<u32> = lhs.iter().zip(rhs.iter()).map(|(a, b)| a + b).collect();
        inputs[2].copy_from_slice(bytemuck::cast_slice(&out));
    }
}

/// Increments every element of a single `u32` buffer, to observe how many times it ran.
#[derive(Debug)]
pub struct DummyIncrement;

impl DummyKernel for DummyIncrement {
    fn compute(&self, inputs: &mut [&mut Vec<u8>]) {
        let mut values: Vec<u32> = bytemuck::pod_collect_to_vec(inputs[0].as_slice());
        values.iter_mut().for_each(|v| *v += 1);
        inputs[0].copy_from_slice(bytemuck::cast_slice(&values));
    }
}

pub fn test_client() -> DummyClient {
    let mut server = DummyServer::default();
    server.register("addition", Arc::new(DummyElementwiseAddition));
    server.register("increment", Arc::new(DummyIncrement));
    ComputeClient::new(server)
}
