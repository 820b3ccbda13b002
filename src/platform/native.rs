//! Hardware driver backed by nokhwa's native capture backends
//! (AVFoundation, Media Foundation, V4L2).

use crate::errors::CameraError;
use crate::permissions::{self, AuthorizationCallback, PermissionStatus};
use crate::platform::{CaptureDriver, CaptureInput};
use crate::session::FrameOutput;
use crate::types::{
    CameraDeviceInfo, CameraFrame, DevicePosition, DeviceType, SessionPreset, VideoOrientation,
};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    CallbackCamera,
};

/// Infer capability tag and position from the name a backend reports.
///
/// Desktop backends do not expose AVFoundation-style device types, so the
/// name is the only hint available.
pub fn classify_device(name: &str) -> (DeviceType, DevicePosition) {
    let lower = name.to_lowercase();
    if lower.contains("dual wide") {
        (DeviceType::BuiltInDualWideCamera, DevicePosition::Back)
    } else if lower.contains("dual") {
        (DeviceType::BuiltInDualCamera, DevicePosition::Back)
    } else if ["front", "facetime", "user"].iter().any(|hint| lower.contains(hint)) {
        (DeviceType::BuiltInWideAngleCamera, DevicePosition::Front)
    } else {
        (DeviceType::BuiltInWideAngleCamera, DevicePosition::Back)
    }
}

fn camera_index(id: &str) -> CameraIndex {
    match id.parse::<u32>() {
        Ok(index) => CameraIndex::Index(index),
        Err(_) => CameraIndex::String(id.to_string()),
    }
}

fn requested_format(preset: SessionPreset) -> RequestedFormat<'static> {
    match preset.resolution() {
        Some((width, height)) => RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            nokhwa::utils::CameraFormat::new(Resolution::new(width, height), FrameFormat::MJPEG, 30),
        )),
        None => RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    }
}

/// [`CaptureDriver`] over a single nokhwa `CallbackCamera`
pub struct NativeDriver {
    backend: ApiBackend,
    preset: SessionPreset,
    configuring: bool,
    pending: Option<(CameraDeviceInfo, CallbackCamera)>,
    camera: Option<CallbackCamera>,
    device: Option<CameraDeviceInfo>,
    output: Option<FrameOutput>,
    orientation: VideoOrientation,
    wired: bool,
}

impl NativeDriver {
    pub fn new() -> Self {
        Self::with_backend(ApiBackend::Auto)
    }

    pub fn with_backend(backend: ApiBackend) -> Self {
        Self {
            backend,
            preset: SessionPreset::default(),
            configuring: false,
            pending: None,
            camera: None,
            device: None,
            output: None,
            orientation: VideoOrientation::LandscapeRight,
            wired: false,
        }
    }

    /// Route camera buffers into the frame output
    fn wire_output(&mut self) -> Result<(), CameraError> {
        let (Some(camera), Some(output), Some(device)) =
            (self.camera.as_mut(), self.output.as_ref(), self.device.as_ref())
        else {
            return Ok(());
        };

        let output = output.clone();
        let device_id = device.id.clone();
        let orientation = self.orientation;
        camera
            .set_callback(move |buffer: nokhwa::Buffer| {
                let frame = CameraFrame::new(
                    buffer.buffer_bytes().to_vec(),
                    buffer.resolution().width_x,
                    buffer.resolution().height_y,
                    device_id.clone(),
                )
                .with_format(buffer.source_frame_format().to_string())
                .with_orientation(orientation);
                output.push(frame);
            })
            .map_err(|e| CameraError::StreamError(format!("Failed to set callback: {}", e)))?;

        self.wired = true;
        Ok(())
    }
}

impl Default for NativeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDriver for NativeDriver {
    fn authorization_status(&self) -> PermissionStatus {
        permissions::check_permission()
    }

    fn request_authorization(&mut self, on_complete: AuthorizationCallback) {
        permissions::request_permission(on_complete);
    }

    fn devices(&self) -> Result<Vec<CameraDeviceInfo>, CameraError> {
        let cameras = query(self.backend).map_err(|e| {
            CameraError::InitializationError(format!("Failed to query cameras: {}", e))
        })?;

        Ok(cameras
            .into_iter()
            .map(|info| {
                let name = info.human_name();
                let (device_type, position) = classify_device(&name);
                CameraDeviceInfo::new(info.index().to_string(), name)
                    .with_description(info.description().to_string())
                    .with_kind(device_type, position)
            })
            .collect())
    }

    fn default_device(
        &mut self,
        device_type: DeviceType,
        position: DevicePosition,
    ) -> Option<CameraDeviceInfo> {
        match self.devices() {
            Ok(devices) => devices
                .into_iter()
                .find(|d| d.device_type == device_type && d.position == position),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    fn begin_configuration(&mut self) {
        self.configuring = true;
    }

    fn commit_configuration(&mut self) {
        self.configuring = false;
        if !self.wired {
            if let Err(e) = self.wire_output() {
                log::error!("Commit could not connect camera to output: {}", e);
            }
        }
    }

    fn set_preset(&mut self, preset: SessionPreset) -> bool {
        // Closest-format negotiation means any preset can be honoured approximately
        self.preset = preset;
        true
    }

    fn open_input(&mut self, device: &CameraDeviceInfo) -> Result<CaptureInput, CameraError> {
        let camera = CallbackCamera::new(
            camera_index(&device.id),
            requested_format(self.preset),
            |_| {},
        )
        .map_err(|e| {
            CameraError::DeviceBusy(format!("Failed to open camera {}: {}", device.id, e))
        })?;

        self.pending = Some((device.clone(), camera));
        Ok(CaptureInput::new(device.clone()))
    }

    fn add_input(&mut self, input: CaptureInput) -> bool {
        if self.camera.is_some() {
            return false;
        }
        match self.pending.take() {
            Some((device, camera)) if device.id == input.device.id => {
                self.camera = Some(camera);
                self.device = Some(device);
                true
            }
            _ => false,
        }
    }

    fn add_output(&mut self, output: FrameOutput) -> bool {
        if self.output.is_some() {
            return false;
        }
        self.output = Some(output);
        true
    }

    fn has_connection(&self) -> bool {
        self.camera.is_some() && self.output.is_some()
    }

    fn set_video_orientation(&mut self, orientation: VideoOrientation) {
        self.orientation = orientation;
    }

    fn start_running(&mut self) -> Result<(), CameraError> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| CameraError::StreamError("No input bound to session".to_string()))?;

        camera
            .open_stream()
            .map_err(|e| CameraError::StreamError(format!("Failed to start stream: {}", e)))
    }

    fn stop_running(&mut self) {
        if let Some(camera) = self.camera.as_mut() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop stream: {}", e);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.camera
            .as_ref()
            .and_then(|c| c.is_stream_open().ok())
            .unwrap_or(false)
    }
}

impl Drop for NativeDriver {
    fn drop(&mut self) {
        self.stop_running();
    }
}

// SAFETY: the camera is only touched through `&mut self`, and the controller
// keeps the driver behind a mutex.
unsafe impl Send for NativeDriver {}
