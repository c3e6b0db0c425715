use candle_core::Device;

/// Metal when the feature is enabled and a GPU is present, otherwise CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => { tracing::info!(device = "metal", "embedding device selected"); return dev; }
            Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to CPU"),
        }
    }
    tracing::info!(device = "cpu", "embedding device selected");
    Device::Cpu
}
