//! CrabCapture: camera capture-session setup and frame delivery
//!
//! This crate drives the one-shot lifecycle of a video capture session:
//! obtain camera authorization, pick a device from an ordered preference
//! list, wire it to a frame output inside a single configuration
//! transaction, and start streaming frames to a registered consumer.
//!
//! # Features
//! - Monotonic setup result: the first failure wins and nothing retries
//! - Exactly one begin/commit configuration pair per configuration attempt
//! - Frame delivery on its own thread, independent of setup
//! - Native driver over nokhwa, synthetic driver for tests
//!
//! # Usage
//! ```rust,no_run
//! use crabcapture::{CaptureController, CrabCaptureConfig, NativeDriver, SetupResult};
//! use std::time::Duration;
//!
//! crabcapture::init_logging();
//! let controller = CaptureController::new(NativeDriver::new(), CrabCaptureConfig::default())?;
//! controller.register_frame_consumer(|frame: crabcapture::CameraFrame| {
//!     println!("frame {} {}x{}", frame.sequence, frame.width, frame.height);
//! });
//! if controller.wait_for_setup(Duration::from_secs(30)) == Some(SetupResult::Success) {
//!     std::thread::sleep(Duration::from_secs(1));
//! }
//! controller.stop();
//! # Ok::<(), crabcapture::CameraError>(())
//! ```
pub mod config;
pub mod errors;
pub mod permissions;
pub mod platform;
pub mod session;
pub mod types;

// Testing utilities - synthetic driver and frames for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::CrabCaptureConfig;
pub use errors::{CameraError, ConfigurationError};
pub use permissions::{PermissionInfo, PermissionStatus};
pub use platform::{CaptureDriver, CaptureInput, NativeDriver};
pub use session::{CaptureController, FrameConsumer, FrameOutput, SetupResult};
pub use types::{
    CameraDeviceInfo, CameraFrame, DevicePosition, DeviceSelector, DeviceType, Platform,
    SessionPreset, VideoOrientation,
};

/// Detect the current platform using the Platform enum
pub fn current_platform() -> Platform {
    Platform::current()
}

/// Initialize logging; `RUST_LOG` overrides the default `crabcapture=info`
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("crabcapture=info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        platform: Platform::current(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub platform: Platform,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabcapture");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
        assert_eq!(info.platform, current_platform());
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
