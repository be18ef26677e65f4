use alloc::{format, vec::Vec};
use tilemm_common::Shape3;

use crate::{
    ElemType, Element, KernelId,
    config::{Logger, compilation::CompilationLogLevel},
    kernel::{Kernel, KernelState, KernelTransition, ShaderCode},
    server::{Bindings, ComputeServer, Handle, ServerError},
    sync::CompletionToken,
};

/// An in-flight dispatch: the kernel it belongs to and the token firing on completion.
#[derive(Debug)]
#[must_use = "a dispatch must be waited on before the kernel can be reused"]
pub struct DispatchSession {
    kernel: KernelId,
    token: CompletionToken,
}

impl DispatchSession {
    /// The dispatched kernel.
    pub fn kernel(&self) -> KernelId {
        self.kernel
    }

    /// Whether the device already signaled completion.
    pub fn is_complete(&self) -> bool {
        self.token.is_complete()
    }
}

/// The compute client is the entry point to a [compute server](ComputeServer).
///
/// It enforces the dispatch protocol of every [kernel](Kernel) it creates.
#[derive(Debug)]
pub struct ComputeClient<Server: ComputeServer> {
    server: Server,
    logger: Logger,
}

impl<Server: ComputeServer> ComputeClient<Server> {
    /// Create a new client with the given server.
    pub fn new(server: Server) -> Self {
        Self {
            server,
            logger: Logger::new(),
        }
    }

    /// Create a new client with the given server, reporting through the given logger.
    pub fn with_logger(server: Server, logger: Logger) -> Self {
        Self { server, logger }
    }

    /// The logger configured from the global configuration.
    pub fn logger(&mut self) -> &mut Logger {
        &mut self.logger
    }

    /// The underlying server.
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Whether the device supports the element type.
    pub fn supports_elem(&self, elem: ElemType) -> bool {
        self.server.supports_elem(elem)
    }

    fn check_elem(&self, elem: ElemType) -> Result<(), ServerError> {
        match self.server.supports_elem(elem) {
            true => Ok(()),
            false => Err(ServerError::UnsupportedElem(elem)),
        }
    }

    /// Create a device buffer initialized with the given bytes.
    pub fn create(
        &mut self,
        shape: &[usize],
        elem: ElemType,
        data: &[u8],
    ) -> Result<Handle, ServerError> {
        self.check_elem(elem)?;
        let handle = Handle::new(shape, elem);
        if handle.size() != data.len() as u64 {
            return Err(ServerError::SizeMismatch {
                handle: handle.id,
                expected: handle.size(),
                actual: data.len() as u64,
            });
        }

        self.server.create(&handle, Some(data))?;
        log::debug!("Created {} with shape {:?} ({elem})", handle.id, shape);
        Ok(handle)
    }

    /// Create a device buffer initialized with the given elements.
    pub fn create_from_slice<E: Element>(
        &mut self,
        shape: &[usize],
        data: &[E],
    ) -> Result<Handle, ServerError> {
        self.create(shape, E::ELEM, E::as_bytes(data))
    }

    /// Create an uninitialized device buffer.
    pub fn empty(&mut self, shape: &[usize], elem: ElemType) -> Result<Handle, ServerError> {
        self.check_elem(elem)?;
        let handle = Handle::new(shape, elem);
        self.server.create(&handle, None)?;
        log::debug!("Created empty {} with shape {:?} ({elem})", handle.id, shape);
        Ok(handle)
    }

    /// Create a kernel object, ready to be dispatched.
    pub fn create_kernel(
        &mut self,
        shader: ShaderCode,
        bindings: Bindings,
        count: Shape3,
    ) -> Result<Kernel<Server::Kernel>, ServerError> {
        let id = KernelId::new();
        let inner = self.server.create_kernel(id, &shader, &bindings, count)?;
        let kernel = Kernel::new(id, inner, &shader, count);

        match self.logger.log_level_compilation() {
            CompilationLogLevel::Disabled => {}
            CompilationLogLevel::Basic => self.logger.log_compilation(&format!(
                "[Compiled] {id} `{}` workgroup ({}) grid ({})",
                shader.name, shader.workgroup_size, count
            )),
            CompilationLogLevel::Full => self.logger.log_compilation(&format!(
                "[Compiled] {id} `{}` workgroup ({}) grid ({})\n{}",
                shader.name, shader.workgroup_size, count, shader.source
            )),
        }

        Ok(kernel)
    }

    /// Dispatch an idle kernel.
    pub fn dispatch(
        &mut self,
        kernel: &mut Kernel<Server::Kernel>,
    ) -> Result<DispatchSession, ServerError> {
        if kernel.state != KernelState::Idle {
            return Err(ServerError::InvalidKernelState {
                kernel: kernel.id,
                state: kernel.state,
                transition: KernelTransition::Dispatch,
            });
        }

        let token = self.server.dispatch(&mut kernel.inner)?;
        kernel.apply(KernelTransition::Dispatch)?;
        kernel.dispatch_count += 1;

        Ok(DispatchSession {
            kernel: kernel.id,
            token,
        })
    }

    /// Block until the dispatch completes. There is no timeout.
    pub fn wait(
        &mut self,
        kernel: &mut Kernel<Server::Kernel>,
        session: DispatchSession,
    ) -> Result<(), ServerError> {
        if session.kernel != kernel.id {
            return Err(ServerError::ForeignToken {
                kernel: kernel.id,
                session,
            });
        }
        if kernel.state != KernelState::InFlight {
            return Err(ServerError::InvalidKernelState {
                kernel: kernel.id,
                state: kernel.state,
                transition: KernelTransition::Wait,
            });
        }

        self.server.wait(session.token)?;
        kernel.apply(KernelTransition::Wait)
    }

    /// Reset the command buffer of a completed kernel so that it can be dispatched again.
    pub fn reset(&mut self, kernel: &mut Kernel<Server::Kernel>) -> Result<(), ServerError> {
        if kernel.state != KernelState::Completed {
            return Err(ServerError::InvalidKernelState {
                kernel: kernel.id,
                state: kernel.state,
                transition: KernelTransition::Reset,
            });
        }

        self.server.reset(&mut kernel.inner)?;
        kernel.apply(KernelTransition::Reset)
    }

    /// Copy `size` bytes of the buffer back to the host.
    pub fn read(&mut self, handle: &Handle, size: u64) -> Result<Vec<u8>, ServerError> {
        if size > handle.size() {
            return Err(ServerError::SizeMismatch {
                handle: handle.id,
                expected: handle.size(),
                actual: size,
            });
        }

        self.server.read(handle, size)
    }

    /// Copy the whole buffer back to the host as elements.
    pub fn read_one<E: Element>(&mut self, handle: &Handle) -> Result<Vec<E>, ServerError> {
        if handle.elem != E::ELEM {
            return Err(ServerError::ElemMismatch {
                handle: handle.id,
                expected: handle.elem,
                actual: E::ELEM,
            });
        }

        let bytes = self.read(handle, handle.size())?;
        Ok(E::from_bytes(&bytes))
    }
}
