use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use tilemm_common::Shape3;

use crate::{
    ElemType, HandleId, KernelId,
    client::DispatchSession,
    kernel::{KernelState, KernelTransition, ShaderCode},
    sync::{CompletionToken, SignalDropped},
};

/// Errors reported by a [compute server](ComputeServer) or the client driving it.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No device matching the request was found.
    #[error("No suitable GPU adapter found ({0})")]
    NoAdapter(String),

    /// The device could not be created or was lost.
    #[error("Unable to use the device\nCaused by:\n  {0}")]
    Device(String),

    /// A buffer could not be allocated.
    #[error("Unable to allocate {size} bytes for {handle}\nCaused by:\n  {reason}")]
    Allocation {
        /// The buffer being created.
        handle: HandleId,
        /// Requested size in bytes.
        size: u64,
        /// Why the allocation failed.
        reason: String,
    },

    /// The shader was rejected by the device compiler.
    #[error("The shader `{name}` was rejected by the compiler\nCaused by:\n  {reason}")]
    Compilation {
        /// Name of the shader.
        name: String,
        /// Compiler message.
        reason: String,
    },

    /// The element type isn't supported by the device.
    #[error("The element type {0} isn't supported by the device")]
    UnsupportedElem(ElemType),

    /// The buffer was read back as a different element type than the one it holds.
    #[error("Buffer {handle} holds {expected} elements, can't read them as {actual}")]
    ElemMismatch {
        /// The buffer read.
        handle: HandleId,
        /// The element type stored in the buffer.
        expected: ElemType,
        /// The requested element type.
        actual: ElemType,
    },

    /// A handle that isn't known by the server was used.
    #[error("Unknown buffer {0}")]
    UnknownHandle(HandleId),

    /// The data provided to initialize a buffer doesn't match its size.
    #[error("Buffer {handle} holds {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        /// The buffer being initialized or read.
        handle: HandleId,
        /// Expected size in bytes.
        expected: u64,
        /// Provided size in bytes.
        actual: u64,
    },

    /// A kernel operation was issued in the wrong order.
    #[error("Can't {transition} {kernel} while it is {state}")]
    InvalidKernelState {
        /// The kernel.
        kernel: KernelId,
        /// Its state when the operation was issued.
        state: KernelState,
        /// The rejected operation.
        transition: KernelTransition,
    },

    /// The completion token doesn't belong to the kernel it was waited on with.
    ///
    /// The session is handed back untouched so that it can still be waited on.
    #[error("The completion token of {} was used to wait on {kernel}", .session.kernel())]
    ForeignToken {
        /// The kernel waited on.
        kernel: KernelId,
        /// The session of the kernel the token was created for.
        session: DispatchSession,
    },

    /// A kernel was dispatched without a recorded command buffer.
    #[error("The command buffer of {0} was already submitted and must be reset")]
    CommandBufferConsumed(KernelId),

    /// The completion signal was dropped by the device.
    #[error(transparent)]
    Signal(#[from] SignalDropped),

    /// Reading a buffer back to the host failed.
    #[error("Unable to read {handle} back to the host\nCaused by:\n  {reason}")]
    Read {
        /// The buffer read.
        handle: HandleId,
        /// Why the read failed.
        reason: String,
    },
}

/// A device buffer with its logical shape and element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    /// Unique id.
    pub id: HandleId,
    /// Logical shape of the buffer.
    pub shape: Vec<usize>,
    /// Element type stored in the buffer.
    pub elem: ElemType,
}

impl Handle {
    /// Create a handle for a new buffer.
    pub fn new(shape: &[usize], elem: ElemType) -> Self {
        Self {
            id: HandleId::new(),
            shape: shape.to_vec(),
            elem,
        }
    }

    /// The number of elements in the buffer.
    pub fn num_elems(&self) -> usize {
        self.shape.iter().product()
    }

    /// The size of the buffer in bytes.
    pub fn size(&self) -> u64 {
        (self.num_elems() * self.elem.size()) as u64
    }
}

/// Buffers bound to a kernel. The binding index of a buffer is its position.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    /// Bound buffers.
    pub buffers: Vec<Handle>,
}

impl Bindings {
    /// Create an empty list of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add buffers to the bindings.
    pub fn with_buffers(mut self, buffers: Vec<Handle>) -> Self {
        self.buffers.extend(buffers);
        self
    }

    /// Add a single buffer to the bindings.
    pub fn with_buffer(mut self, buffer: Handle) -> Self {
        self.buffers.push(buffer);
        self
    }
}

/// The compute server is responsible for handling resources and computations over them.
///
/// A server never orders dispatches itself: the [client](crate::client::ComputeClient)
/// guarantees that a kernel is only dispatched when idle, only waited on when in flight, and
/// only reset once its dispatch completed.
pub trait ComputeServer: Send + Debug + Sized {
    /// The kernel object type: a compiled shader with its bound buffers and grid.
    type Kernel: Send + Debug;

    /// Whether buffers and shaders of the given element type are supported by the device.
    fn supports_elem(&self, elem: ElemType) -> bool;

    /// Create a device buffer for the given handle, optionally initialized from host memory.
    fn create(&mut self, handle: &Handle, data: Option<&[u8]>) -> Result<(), ServerError>;

    /// Create a kernel object from shader code, bound buffers and the number of workgroups to
    /// launch. The command buffer of the returned kernel is recorded and ready to dispatch.
    fn create_kernel(
        &mut self,
        id: KernelId,
        shader: &ShaderCode,
        bindings: &Bindings,
        count: Shape3,
    ) -> Result<Self::Kernel, ServerError>;

    /// Submit the recorded command buffer of the kernel. The returned token fires when the
    /// device finished executing it.
    fn dispatch(&mut self, kernel: &mut Self::Kernel) -> Result<CompletionToken, ServerError>;

    /// Block until the token fires.
    fn wait(&mut self, token: CompletionToken) -> Result<(), ServerError>;

    /// Record the command buffer of the kernel again so it can be dispatched once more.
    fn reset(&mut self, kernel: &mut Self::Kernel) -> Result<(), ServerError>;

    /// Copy `size` bytes of the buffer into host memory.
    fn read(&mut self, handle: &Handle, size: u64) -> Result<Vec<u8>, ServerError>;
}
