use crate::{WgpuDevice, WgpuServer};
use tilemm_common::future;
use tilemm_runtime::{Runtime, client::ComputeClient, server::ServerError};

/// Runtime that uses the [wgpu] crate with the WGSL compiler.
#[derive(Debug)]
pub struct WgpuRuntime;

impl Runtime for WgpuRuntime {
    type Server = WgpuServer;
    type Device = WgpuDevice;

    fn create_client(device: &Self::Device) -> Result<ComputeClient<Self::Server>, ServerError> {
        let setup = future::block_on(create_setup(device))?;
        Ok(ComputeClient::new(WgpuServer::new(setup.device, setup.queue)))
    }

    fn name() -> &'static str {
        "wgpu<wgsl>"
    }
}

/// The resources created while opening a device.
#[derive(Debug)]
pub struct WgpuSetup {
    /// The underlying wgpu instance.
    pub instance: wgpu::Instance,
    /// The selected 'adapter'. This corresponds to a physical device.
    pub adapter: wgpu::Adapter,
    /// The wgpu device. This is the logical device the kernels run on.
    pub device: wgpu::Device,
    /// The queue kernels are submitted to.
    pub queue: wgpu::Queue,
}

/// Open the given device, requesting `shader-f16` when the adapter supports it.
pub async fn create_setup(device: &WgpuDevice) -> Result<WgpuSetup, ServerError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = select_adapter(&instance, device).await?;

    let info = adapter.get_info();
    log::info!(
        "Created wgpu adapter `{}` ({:?}, {:?})",
        info.name,
        info.backend,
        info.device_type
    );

    let required_features = adapter.features() & wgpu::Features::SHADER_F16;
    let required_limits = adapter.limits();

    let (wgpu_device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("tilemm"),
            required_features,
            required_limits,
            ..Default::default()
        })
        .await
        .map_err(|err| ServerError::Device(err.to_string()))?;

    wgpu_device.on_uncaptured_error(Box::new(|err| {
        log::error!("Uncaptured wgpu error: {err}");
    }));

    Ok(WgpuSetup {
        instance,
        adapter,
        device: wgpu_device,
        queue,
    })
}

async fn select_adapter(
    instance: &wgpu::Instance,
    device: &WgpuDevice,
) -> Result<wgpu::Adapter, ServerError> {
    let Some((device_type, index)) = device.device_type() else {
        return instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|err| ServerError::NoAdapter(err.to_string()));
    };

    cfg_if::cfg_if! {
        if #[cfg(target_family = "wasm")] {
            let _ = (device_type, index);
            Err(ServerError::NoAdapter(format!(
                "{device:?} can't be selected on the web, use the default device"
            )))
        } else {
            instance
                .enumerate_adapters(wgpu::Backends::all())
                .into_iter()
                .filter(|adapter| adapter.get_info().device_type == device_type)
                .nth(index)
                .ok_or_else(|| ServerError::NoAdapter(format!("{device:?}")))
        }
    }
}
