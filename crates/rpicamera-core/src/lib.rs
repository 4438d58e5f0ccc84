//! Core types: device capabilities, camera settings, tracing

pub mod device;
pub mod simulated;
pub mod tracing;
pub mod trigger;
pub mod types;

pub use device::{Device, DeviceError, DeviceResult};
pub use simulated::{Journal, SimulatedCamera, SimulatedConfig};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
pub use trigger::{GpioTrigger, TriggerConfig, TriggeredDevice};
pub use types::{
    AwbGains, AwbMode, ExposureMode, PreviewOptions, Resolution, SyncMode, TriggerSettings,
    VideoFormat, ZoomRect,
};
