//! Driver seam between the session controller and the capture hardware.
//!
//! A driver owns the actual capture session: it enumerates devices, binds one
//! as input, attaches the frame output and starts or stops streaming. The
//! controller only ever talks to hardware through [`CaptureDriver`].

pub mod native;

use crate::errors::CameraError;
use crate::permissions::{AuthorizationCallback, PermissionStatus};
use crate::session::FrameOutput;
use crate::types::{
    CameraDeviceInfo, DevicePosition, DeviceType, SessionPreset, VideoOrientation,
};

pub use native::NativeDriver;

/// A device opened for capture but not yet bound to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureInput {
    pub device: CameraDeviceInfo,
}

impl CaptureInput {
    pub fn new(device: CameraDeviceInfo) -> Self {
        Self { device }
    }
}

/// Operations the session controller needs from a capture backend.
///
/// Mutating calls (`set_preset`, `add_input`, `add_output`,
/// `set_video_orientation`) are only issued between `begin_configuration`
/// and `commit_configuration`, and `start_running` only after a commit.
pub trait CaptureDriver: Send {
    /// Current camera authorization for this process
    fn authorization_status(&self) -> PermissionStatus;

    /// Prompt for camera access; `on_complete` receives whether it was granted
    fn request_authorization(&mut self, on_complete: AuthorizationCallback);

    /// All devices the backend can see
    fn devices(&self) -> Result<Vec<CameraDeviceInfo>, CameraError>;

    /// The default device for a capability tag and position, if one exists
    fn default_device(
        &mut self,
        device_type: DeviceType,
        position: DevicePosition,
    ) -> Option<CameraDeviceInfo>;

    fn begin_configuration(&mut self);

    fn commit_configuration(&mut self);

    /// Request a preset; `false` when the current device cannot honour it
    fn set_preset(&mut self, preset: SessionPreset) -> bool;

    /// Open a device for capture; fails when the device is busy or gone
    fn open_input(&mut self, device: &CameraDeviceInfo) -> Result<CaptureInput, CameraError>;

    /// Bind an opened input to the session
    fn add_input(&mut self, input: CaptureInput) -> bool;

    /// Attach the frame output that receives every captured frame
    fn add_output(&mut self, output: FrameOutput) -> bool;

    /// Whether an input and an output are both attached and connected
    fn has_connection(&self) -> bool;

    fn set_video_orientation(&mut self, orientation: VideoOrientation);

    fn start_running(&mut self) -> Result<(), CameraError>;

    fn stop_running(&mut self);

    fn is_running(&self) -> bool;
}

impl<D: CaptureDriver + ?Sized> CaptureDriver for Box<D> {
    fn authorization_status(&self) -> PermissionStatus {
        (**self).authorization_status()
    }

    fn request_authorization(&mut self, on_complete: AuthorizationCallback) {
        (**self).request_authorization(on_complete)
    }

    fn devices(&self) -> Result<Vec<CameraDeviceInfo>, CameraError> {
        (**self).devices()
    }

    fn default_device(
        &mut self,
        device_type: DeviceType,
        position: DevicePosition,
    ) -> Option<CameraDeviceInfo> {
        (**self).default_device(device_type, position)
    }

    fn begin_configuration(&mut self) {
        (**self).begin_configuration()
    }

    fn commit_configuration(&mut self) {
        (**self).commit_configuration()
    }

    fn set_preset(&mut self, preset: SessionPreset) -> bool {
        (**self).set_preset(preset)
    }

    fn open_input(&mut self, device: &CameraDeviceInfo) -> Result<CaptureInput, CameraError> {
        (**self).open_input(device)
    }

    fn add_input(&mut self, input: CaptureInput) -> bool {
        (**self).add_input(input)
    }

    fn add_output(&mut self, output: FrameOutput) -> bool {
        (**self).add_output(output)
    }

    fn has_connection(&self) -> bool {
        (**self).has_connection()
    }

    fn set_video_orientation(&mut self, orientation: VideoOrientation) {
        (**self).set_video_orientation(orientation)
    }

    fn start_running(&mut self) -> Result<(), CameraError> {
        (**self).start_running()
    }

    fn stop_running(&mut self) {
        (**self).stop_running()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}
