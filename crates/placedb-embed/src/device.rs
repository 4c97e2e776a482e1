use candle_core::Device;
use tracing::info;

/// Metal when compiled in and available; `APP_EMBED_DEVICE=cpu` pins the CPU.
pub fn select_device() -> Device {
    let pinned_cpu = std::env::var("APP_EMBED_DEVICE").is_ok_and(|v| v.eq_ignore_ascii_case("cpu"));
    #[cfg(feature = "metal")]
    {
        if !pinned_cpu {
            if let Ok(dev) = Device::new_metal(0) { info!("embedding device: metal"); return dev; }
        }
    }
    info!(pinned_cpu, "embedding device: cpu");
    Device::Cpu
}
