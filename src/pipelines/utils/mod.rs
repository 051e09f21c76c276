use std::str::FromStr;

use candle_core::Device;

use crate::core::{Result, SentimentError};

/// Loads a device to be used for the model.
/// If `index` is `Some(i)` it will attempt to load the specified CUDA device.
/// When `None` it defaults to CUDA device 0 if available and otherwise falls back
/// to CPU.
pub fn load_device_with(index: Option<usize>) -> Result<Device> {
    if let Some(i) = index {
        return Device::new_cuda(i)
            .map_err(|e| SentimentError::Device(format!("CUDA device {i} unavailable: {e}")));
    }

    if candle_core::utils::cuda_is_available() {
        match Device::new_cuda(0) {
            Ok(device) => return Ok(device),
            Err(err) => tracing::warn!("CUDA reported available but failed to open: {err}"),
        }
    }
    tracing::info!("CUDA not available, using CPU");
    Ok(Device::Cpu)
}

/// Request for a specific device, used by pipeline builders.
#[derive(Debug, Clone, Default)]
pub enum DeviceRequest {
    /// Use CUDA if available, otherwise CPU (default behavior).
    #[default]
    Default,
    /// Force CPU even if CUDA is available.
    Cpu,
    /// Select a specific CUDA device by index.
    Cuda(usize),
    /// Provide an already constructed device.
    Explicit(Device),
}

impl DeviceRequest {
    /// Resolve the request into an actual [`Device`].
    pub fn resolve(self) -> Result<Device> {
        match self {
            DeviceRequest::Default => load_device_with(None),
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => load_device_with(Some(i)),
            DeviceRequest::Explicit(d) => Ok(d),
        }
    }
}

/// Accepts `auto`, `cpu`, `cuda` and `cuda:N`.
impl FromStr for DeviceRequest {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "" | "auto" | "default" => Ok(DeviceRequest::Default),
            "cpu" => Ok(DeviceRequest::Cpu),
            "cuda" | "gpu" => Ok(DeviceRequest::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|index| index.parse::<usize>().ok())
                .map(DeviceRequest::Cuda)
                .ok_or_else(|| {
                    SentimentError::Config(format!(
                        "Unknown device '{s}' (use auto, cpu, cuda or cuda:N)"
                    ))
                }),
        }
    }
}

/// Short name of a device for logs and health reports.
pub fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}
