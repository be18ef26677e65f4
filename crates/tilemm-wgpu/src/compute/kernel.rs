use tilemm_common::Shape3;
use tilemm_runtime::KernelId;

/// A compiled compute pipeline with its bound buffers and a reusable command buffer.
#[derive(Debug)]
pub struct WgpuKernel {
    pub(crate) id: KernelId,
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) count: Shape3,
    /// `None` once submitted, until the kernel is reset.
    pub(crate) command_buffer: Option<wgpu::CommandBuffer>,
}

impl WgpuKernel {
    pub(crate) fn record(&mut self, device: &wgpu::Device) {
        let label = self.id.to_string();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(&label),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(self.count.x, self.count.y, self.count.z);
        }

        self.command_buffer = Some(encoder.finish());
    }
}
