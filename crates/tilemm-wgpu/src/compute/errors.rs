use tilemm_common::future::{self, DynFut};

/// Tracks lazy errors on a device.
///
/// Every call must be matched by a call to [fetch_error].
pub(crate) fn track_error(device: &wgpu::Device, filter: wgpu::ErrorFilter) {
    device.push_error_scope(filter);
}

/// Fetches the lazy errors tracked since the matching [track_error].
pub(crate) fn fetch_error(device: &wgpu::Device) -> DynFut<Option<wgpu::Error>> {
    Box::pin(device.pop_error_scope())
}

/// Runs `func` inside an error scope and blocks until the scope is resolved.
pub(crate) fn scoped<T>(
    device: &wgpu::Device,
    filter: wgpu::ErrorFilter,
    func: impl FnOnce() -> T,
) -> (T, Option<wgpu::Error>) {
    track_error(device, filter);
    let output = func();
    let error = future::block_on(fetch_error(device));
    (output, error)
}
