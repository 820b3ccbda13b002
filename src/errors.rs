use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    InitializationError(String),
    PermissionDenied(String),
    DeviceNotFound(String),
    DeviceBusy(String),
    StreamError(String),
    ConfigError(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::InitializationError(msg) => write!(f, "Camera initialization error: {}", msg),
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied error: {}", msg),
            CameraError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CameraError::DeviceBusy(msg) => write!(f, "Device busy: {}", msg),
            CameraError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            CameraError::ConfigError(msg) => write!(f, "Configuration file error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

/// Reasons a capture session could not be configured.
///
/// Every variant latches the setup result to `ConfigurationFailed`; none of
/// them is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("cannot add the selected device as session input")]
    CannotAddInput,
    #[error("cannot add the frame output to the session")]
    CannotAddOutput,
    #[error("no default capture device is available")]
    NoDefaultDeviceAvailable,
    #[error("driver refused to start streaming: {0}")]
    CannotStartStream(String),
}
