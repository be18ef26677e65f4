use tilemm_runtime::config::device::DeviceKind;

/// The device struct when using the `wgpu` backend.
///
/// Note that you need to provide the device index when using a GPU backend.
///
/// # Example
///
/// ```ignore
/// use tilemm_wgpu::WgpuDevice;
///
/// let device_gpu_1 = WgpuDevice::DiscreteGpu(0); // First discrete GPU found.
/// let device_gpu_2 = WgpuDevice::DiscreteGpu(1);  // Second discrete GPU found.
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, Default)]
pub enum WgpuDevice {
    /// Discrete GPU with the given index. The index is the index of the discrete GPU in the list
    /// of all discrete GPUs found on the system.
    DiscreteGpu(usize),

    /// Integrated GPU with the given index.
    IntegratedGpu(usize),

    /// Virtual GPU with the given index.
    VirtualGpu(usize),

    /// CPU.
    Cpu,

    /// The best available device, prioritizing GPUs wgpu recognizes as "high power".
    #[default]
    DefaultDevice,
}

impl WgpuDevice {
    /// The adapter type this device selects, if it filters on one.
    pub(crate) fn device_type(&self) -> Option<(wgpu::DeviceType, usize)> {
        match self {
            WgpuDevice::DiscreteGpu(index) => Some((wgpu::DeviceType::DiscreteGpu, *index)),
            WgpuDevice::IntegratedGpu(index) => Some((wgpu::DeviceType::IntegratedGpu, *index)),
            WgpuDevice::VirtualGpu(index) => Some((wgpu::DeviceType::VirtualGpu, *index)),
            WgpuDevice::Cpu => Some((wgpu::DeviceType::Cpu, 0)),
            WgpuDevice::DefaultDevice => None,
        }
    }
}

impl From<DeviceKind> for WgpuDevice {
    fn from(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Discrete => WgpuDevice::DiscreteGpu(0),
            DeviceKind::Integrated => WgpuDevice::IntegratedGpu(0),
            DeviceKind::Virtual => WgpuDevice::VirtualGpu(0),
            DeviceKind::Cpu => WgpuDevice::Cpu,
            DeviceKind::Default => WgpuDevice::DefaultDevice,
        }
    }
}
