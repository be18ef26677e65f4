use std::{collections::HashMap, path::PathBuf, sync::Arc};

use tilemm_common::Shape3;
use tilemm_matmul::{MatmulProblem, reference::matmul_reference};
use tilemm_runtime::{
    ElemType, Element, HandleId, KernelId,
    client::ComputeClient,
    config::{GlobalConfig, Logger},
    kernel::ShaderCode,
    server::{Bindings, ComputeServer, Handle, ServerError},
    sync::{CompletionToken, completion_channel},
};

/// A server operation, as seen by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Create { shape: Vec<usize>, initialized: bool },
    CreateKernel { name: String, count: Shape3 },
    Dispatch,
    Wait,
    Reset,
    Read,
}

/// Records every operation and runs the matmul on the host when a kernel is dispatched.
#[derive(Debug, Default)]
pub struct RecordingServer {
    pub events: Vec<Event>,
    /// Lines found in `log_file` each time a dispatch was waited on.
    pub log_lines_at_wait: Vec<usize>,
    log_file: Option<PathBuf>,
    buffers: HashMap<HandleId, Vec<u8>>,
}

#[derive(Debug)]
pub struct RecordedKernel {
    id: KernelId,
    operands: Vec<Handle>,
    recorded: bool,
}

pub fn recording_client() -> ComputeClient<RecordingServer> {
    ComputeClient::new(RecordingServer::default())
}

/// A client reporting benchmarks to `config`, whose server watches the benchmark log file.
pub fn recording_client_with_config(config: GlobalConfig) -> ComputeClient<RecordingServer> {
    let server = RecordingServer {
        log_file: config.benchmark.logger.file.clone(),
        ..Default::default()
    };
    ComputeClient::with_logger(server, Logger::from_config(Arc::new(config)))
}

impl RecordingServer {
    fn buffer(&self, handle: &Handle) -> Result<Vec<f32>, ServerError> {
        self.buffers
            .get(&handle.id)
            .map(|bytes| f32::from_bytes(bytes))
            .ok_or(ServerError::UnknownHandle(handle.id))
    }
}

impl ComputeServer for RecordingServer {
    type Kernel = RecordedKernel;

    fn supports_elem(&self, elem: ElemType) -> bool {
        elem == ElemType::F32
    }

    fn create(&mut self, handle: &Handle, data: Option<&[u8]>) -> Result<(), ServerError> {
        self.events.push(Event::Create {
            shape: handle.shape.clone(),
            initialized: data.is_some(),
        });
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
        count: Shape3,
    ) -> Result<Self::Kernel, ServerError> {
        self.events.push(Event::CreateKernel {
            name: shader.name.clone(),
            count,
        });

        Ok(RecordedKernel {
            id,
            operands: bindings.buffers.clone(),
            recorded: true,
        })
    }

    fn dispatch(&mut self, kernel: &mut Self::Kernel) -> Result<CompletionToken, ServerError> {
        self.events.push(Event::Dispatch);
        if !kernel.recorded {
            return Err(ServerError::CommandBufferConsumed(kernel.id));
        }
        kernel.recorded = false;

        let [lhs, rhs, out] = kernel.operands.as_slice() else {
            return Err(ServerError::Compilation {
                name: kernel.id.to_string(),
                reason: "expected three bindings".to_string(),
            });
        };
        let problem = MatmulProblem::new(lhs.shape[0], lhs.shape[1], rhs.shape[0], ElemType::F32);
        let result = matmul_reference(&problem, &self.buffer(lhs)?, &self.buffer(rhs)?);
        self.buffers
            .insert(out.id, f32::as_bytes(&result).to_vec());

        let (signal, token) = completion_channel();
        signal.complete();
        Ok(token)
    }

    fn wait(&mut self, token: CompletionToken) -> Result<(), ServerError> {
        self.events.push(Event::Wait);
        if let Some(path) = &self.log_file {
            let lines = std::fs::read_to_string(path)
                .map(|content| content.lines().count())
                .unwrap_or(0);
            self.log_lines_at_wait.push(lines);
        }
        token.wait()?;
        Ok(())
    }

    fn reset(&mut self, kernel: &mut Self::Kernel) -> Result<(), ServerError> {
        self.events.push(Event::Reset);
        kernel.recorded = true;
        Ok(())
    }

    fn read(&mut self, handle: &Handle, size: u64) -> Result<Vec<u8>, ServerError> {
        self.events.push(Event::Read);
        let bytes = self
            .buffers
            .get(&handle.id)
            .ok_or(ServerError::UnknownHandle(handle.id))?;
        Ok(bytes[..size as usize].to_vec())
    }
}
