use super::{WgpuKernel, errors::scoped};
use alloc::borrow::Cow;
use std::collections::HashMap;
use tilemm_common::{Shape3, future};
use tilemm_runtime::{
    ElemType, HandleId, KernelId,
    kernel::ShaderCode,
    server::{Bindings, ComputeServer, Handle, ServerError},
    sync::{CompletionToken, completion_channel},
};

/// Wgpu compute server.
#[derive(Debug)]
pub struct WgpuServer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: HashMap<HandleId, wgpu::Buffer>,
}

impl WgpuServer {
    /// Create a server on an opened device.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
        }
    }

    /// The wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    fn buffer(&self, id: &HandleId) -> Result<&wgpu::Buffer, ServerError> {
        self.buffers.get(id).ok_or(ServerError::UnknownHandle(*id))
    }

    /// Block until every submitted command buffer finished executing.
    fn sync(&self) {
        cfg_if::cfg_if! {
            if #[cfg(not(target_family = "wasm"))] {
                if let Err(err) = self.device.poll(wgpu::PollType::Wait) {
                    log::warn!(
                        "wgpu: requested wait timed out before the submission was completed during sync. ({err})"
                    );
                }
            }
        }
    }
}

/// Buffer sizes must be a multiple of [wgpu::COPY_BUFFER_ALIGNMENT] to be copied or mapped.
fn aligned_size(size: u64) -> u64 {
    size.max(1).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

impl ComputeServer for WgpuServer {
    type Kernel = WgpuKernel;

    fn supports_elem(&self, elem: ElemType) -> bool {
        match elem {
            ElemType::F32 => true,
            ElemType::F16 => self.device.features().contains(wgpu::Features::SHADER_F16),
        }
    }

    fn create(&mut self, handle: &Handle, data: Option<&[u8]>) -> Result<(), ServerError> {
        let size = aligned_size(handle.size());
        let max_size = self.device.limits().max_buffer_size;
        if size > max_size {
            return Err(ServerError::Allocation {
                handle: handle.id,
                size,
                reason: format!("the device limits buffers to {max_size} bytes"),
            });
        }

        let label = handle.id.to_string();
        let (buffer, error) = scoped(&self.device, wgpu::ErrorFilter::OutOfMemory, || {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&label),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: data.is_some(),
            })
        });

        if let Some(err) = error {
            return Err(ServerError::Allocation {
                handle: handle.id,
                size,
                reason: err.to_string(),
            });
        }

        if let Some(data) = data {
            buffer.slice(..).get_mapped_range_mut()[..data.len()].copy_from_slice(data);
            buffer.unmap();
        }

        self.buffers.insert(handle.id, buffer);
        Ok(())
    }

    fn create_kernel(
        &mut self,
        id: KernelId,
        shader: &ShaderCode,
        bindings: &Bindings,
        count: Shape3,
    ) -> Result<Self::Kernel, ServerError> {
        let max_count = self.device.limits().max_compute_workgroups_per_dimension;
        if count.to_array().iter().any(|c| *c > max_count) {
            return Err(ServerError::Device(format!(
                "{id} launches ({count}) workgroups, the device supports at most {max_count} per dimension"
            )));
        }

        let buffers = bindings
            .buffers
            .iter()
            .map(|handle| self.buffer(&handle.id))
            .collect::<Result<Vec<_>, _>>()?;

        let (pipeline, error) = scoped(&self.device, wgpu::ErrorFilter::Validation, || {
            let module = self
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&shader.name),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shader.source.as_str())),
                });

            self.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(&shader.name),
                    layout: None,
                    module: &module,
                    entry_point: Some("main"),
                    compilation_options: Default::default(),
                    cache: None,
                })
        });

        if let Some(err) = error {
            return Err(ServerError::Compilation {
                name: shader.name.clone(),
                reason: err.to_string(),
            });
        }

        let (bind_group, error) = scoped(&self.device, wgpu::ErrorFilter::Validation, || {
            let entries = buffers
                .iter()
                .enumerate()
                .map(|(i, buffer)| wgpu::BindGroupEntry {
                    binding: i as u32,
                    resource: buffer.as_entire_binding(),
                })
                .collect::<Vec<_>>();

            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&shader.name),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            })
        });

        if let Some(err) = error {
            return Err(ServerError::Compilation {
                name: shader.name.clone(),
                reason: format!("the bindings don't match the shader: {err}"),
            });
        }

        let mut kernel = WgpuKernel {
            id,
            pipeline,
            bind_group,
            count,
            command_buffer: None,
        };
        kernel.record(&self.device);

        Ok(kernel)
    }

    fn dispatch(&mut self, kernel: &mut Self::Kernel) -> Result<CompletionToken, ServerError> {
        let command_buffer = kernel
            .command_buffer
            .take()
            .ok_or(ServerError::CommandBufferConsumed(kernel.id))?;

        self.queue.submit([command_buffer]);

        let (signal, token) = completion_channel();
        self.queue.on_submitted_work_done(move || signal.complete());

        Ok(token)
    }

    fn wait(&mut self, token: CompletionToken) -> Result<(), ServerError> {
        // Callbacks only run while the device is polled.
        self.sync();
        token.wait()?;
        Ok(())
    }

    fn reset(&mut self, kernel: &mut Self::Kernel) -> Result<(), ServerError> {
        kernel.record(&self.device);
        Ok(())
    }

    fn read(&mut self, handle: &Handle, size: u64) -> Result<Vec<u8>, ServerError> {
        let source = self.buffer(&handle.id)?;
        let aligned_len = aligned_size(size);

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: aligned_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_buffer_to_buffer(source, 0, &staging_buffer, 0, aligned_len);
        self.queue.submit([encoder.finish()]);

        let (sender, receiver) = async_channel::bounded(1);
        staging_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |v| {
                // This might fail if the channel is closed (eg. the future is dropped).
                // This is fine, just means results aren't needed anymore.
                let _ = sender.try_send(v);
            });

        self.sync();

        let mapped = future::block_on(receiver.recv())
            .map_err(|err| err.to_string())
            .and_then(|result| result.map_err(|err| err.to_string()));

        if let Err(reason) = mapped {
            return Err(ServerError::Read {
                handle: handle.id,
                reason,
            });
        }

        let data = {
            let view = staging_buffer.slice(..).get_mapped_range();
            view[..size as usize].to_vec()
        };
        staging_buffer.unmap();

        Ok(data)
    }
}
