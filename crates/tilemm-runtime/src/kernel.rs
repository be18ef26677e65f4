use alloc::string::String;
use tilemm_common::Shape3;

use crate::{KernelId, server::ServerError};

/// Shader source ready to be compiled, along with the workgroup shape it must be launched with.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct ShaderCode {
    /// Name used for labels and logs.
    pub name: String,
    /// Source code of the shader.
    pub source: String,
    /// The workgroup shape declared by the shader.
    pub workgroup_size: Shape3,
}

/// Lifecycle of a kernel object.
///
/// ```text
/// Idle --dispatch--> InFlight --wait--> Completed --reset--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum KernelState {
    /// The command buffer is recorded and the kernel can be dispatched.
    Idle,
    /// The device owns the bound buffers until the completion token fires.
    InFlight,
    /// The dispatch finished; the command buffer must be reset before reuse.
    Completed,
}

/// The operations driving the [kernel state](KernelState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum KernelTransition {
    /// Submit the kernel.
    Dispatch,
    /// Observe completion.
    Wait,
    /// Re-record the command buffer.
    Reset,
}

impl KernelState {
    /// Apply a transition, returning the new state.
    pub fn transition(self, transition: KernelTransition) -> Result<Self, (Self, KernelTransition)> {
        match (self, transition) {
            (KernelState::Idle, KernelTransition::Dispatch) => Ok(KernelState::InFlight),
            (KernelState::InFlight, KernelTransition::Wait) => Ok(KernelState::Completed),
            (KernelState::Completed, KernelTransition::Reset) => Ok(KernelState::Idle),
            (state, transition) => Err((state, transition)),
        }
    }
}

/// A kernel object created by a [client](crate::client::ComputeClient).
///
/// Wraps the server specific kernel with its lifecycle state.
#[derive(Debug)]
pub struct Kernel<K> {
    pub(crate) id: KernelId,
    pub(crate) name: String,
    pub(crate) state: KernelState,
    pub(crate) workgroup_size: Shape3,
    pub(crate) cube_count: Shape3,
    pub(crate) dispatch_count: usize,
    pub(crate) inner: K,
}

impl<K> Kernel<K> {
    pub(crate) fn new(
        id: KernelId,
        inner: K,
        shader: &ShaderCode,
        cube_count: Shape3,
    ) -> Self {
        Self {
            id,
            name: shader.name.clone(),
            state: KernelState::Idle,
            workgroup_size: shader.workgroup_size,
            cube_count,
            dispatch_count: 0,
            inner,
        }
    }

    pub(crate) fn apply(&mut self, transition: KernelTransition) -> Result<(), ServerError> {
        self.state = self
            .state
            .transition(transition)
            .map_err(|(state, transition)| ServerError::InvalidKernelState {
                kernel: self.id,
                state,
                transition,
            })?;
        Ok(())
    }

    /// The kernel id.
    pub fn id(&self) -> KernelId {
        self.id
    }

    /// The kernel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current lifecycle state.
    pub fn state(&self) -> KernelState {
        self.state
    }

    /// The workgroup shape the kernel was compiled with.
    pub fn workgroup_size(&self) -> Shape3 {
        self.workgroup_size
    }

    /// The number of workgroups launched per dispatch.
    pub fn cube_count(&self) -> Shape3 {
        self.cube_count
    }

    /// How many times the kernel was dispatched.
    pub fn dispatch_count(&self) -> usize {
        self.dispatch_count
    }

    /// The server specific kernel.
    pub fn inner(&self) -> &K {
        &self.inner
    }
}
