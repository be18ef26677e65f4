use std::collections::HashMap;
use std::sync::Arc;

use tilemm_common::Shape3;
use tilemm_runtime::{
    ElemType, HandleId, KernelId,
    kernel::ShaderCode,
    server::{Bindings, ComputeServer, Handle, ServerError},
    sync::{CompletionToken, completion_channel},
};

use super::DummyKernel;

/// The dummy server is used to test the tilemm-runtime infrastructure.
/// Buffers are plain byte vectors and kernels run synchronously on dispatch.
#[derive(Default)]
pub struct DummyServer {
    buffers: HashMap<HandleId, Vec<u8>>,
    kernels: HashMap<String, Arc<dyn DummyKernel>>,
}

impl core::fmt::Debug for DummyServer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DummyServer")
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

/// A compiled dummy kernel: the computation, its bound buffers and whether its command buffer
/// is recorded.
pub struct DummyKernelObject {
    pub id: KernelId,
    pub compute: Arc<dyn DummyKernel>,
    pub bindings: Vec<HandleId>,
    pub recorded: bool,
    pub dispatched: usize,
    pub resets: usize,
}

impl core::fmt::Debug for DummyKernelObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DummyKernelObject")
            .field("id", &self.id)
            .field("recorded", &self.recorded)
            .finish()
    }
}

impl DummyServer {
    /// Make a computation available under the given shader name.
    pub fn register(&mut self, name: &str, kernel: Arc<dyn DummyKernel>) {
        self.kernels.insert(name.to_string(), kernel);
    }
}

impl ComputeServer for DummyServer {
    type Kernel = DummyKernelObject;

    fn supports_elem(&self, elem: ElemType) -> bool {
        elem == ElemType::F32
    }

    fn create(&mut self, handle: &Handle, data: Option<&[u8]>) -> Result<(), ServerError> {
        let bytes = match data {
            Some(data) => data.to_vec(),
            None => vec![0; handle.size() as usize],
        };
        self.buffers.insert(handle.id, bytes);
        Ok(())
    }

    fn create_kernel(
        &mut self,
        id: KernelId,
        shader: &ShaderCode,
        bindings: &Bindings,
        _count: Shape3,
    ) -> Result<Self::Kernel, ServerError> {
        let compute = self
            .kernels
            .get(&shader.name)
            .cloned()
            .ok_or_else(|| ServerError::Compilation {
                name: shader.name.clone(),
                reason: "no dummy kernel registered".to_string(),
            })?;

        let bindings = bindings.buffers.iter().map(|handle| handle.id).collect();

        Ok(DummyKernelObject {
            id,
            compute,
            bindings,
            recorded: true,
            dispatched: 0,
            resets: 0,
        })
    }

    fn dispatch(&mut self, kernel: &mut Self::Kernel) -> Result<CompletionToken, ServerError> {
        if !kernel.recorded {
            return Err(ServerError::CommandBufferConsumed(kernel.id));
        }
        kernel.recorded = false;

        let mut taken = Vec::with_capacity(kernel.bindings.len());
        for id in kernel.bindings.iter() {
            let bytes = self
                .buffers
                .remove(id)
                .ok_or(ServerError::UnknownHandle(*id))?;
            taken.push((*id, bytes));
        }

        {
            let mut resources = taken.iter_mut().map(|(_, bytes)| bytes).collect::<Vec<_>>();
            kernel.compute.compute(&mut resources);
        }

        for (id, bytes) in taken {
            self.buffers.insert(id, bytes);
        }

        kernel.dispatched += 1;
        let (signal, token) = completion_channel();
        signal.complete();
        Ok(token)
    }

    fn wait(&mut self, token: CompletionToken) -> Result<(), ServerError> {
        token.wait()?;
        Ok(())
    }

    fn reset(&mut self, kernel: &mut Self::Kernel) -> Result<(), ServerError> {
        kernel.recorded = true;
        kernel.resets += 1;
        Ok(())
    }

    fn read(&mut self, handle: &Handle, size: u64) -> Result<Vec<u8>, ServerError> {
        let bytes = self
            .buffers
            .get(&handle.id)
            .ok_or(ServerError::UnknownHandle(handle.id))?;
        Ok(bytes[..size as usize].to_vec())
    }
}
