//! Scriptable in-memory capture driver.
//!
//! Every call the controller makes is appended to a [`DriverCallLog`] that
//! outlives the driver, so tests can inspect the exact sequence of driver
//! operations after the driver has been moved into a controller.

use crate::errors::CameraError;
use crate::permissions::{AuthorizationCallback, PermissionStatus};
use crate::platform::{CaptureDriver, CaptureInput};
use crate::session::FrameOutput;
use crate::testing::synthetic_data::synthetic_video_frame;
use crate::types::{
    CameraDeviceInfo, DevicePosition, DeviceSelector, DeviceType, SessionPreset,
    VideoOrientation,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// One recorded driver operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    AuthorizationStatus,
    RequestAuthorization,
    DefaultDevice(DeviceSelector),
    BeginConfiguration,
    CommitConfiguration,
    SetPreset(SessionPreset),
    OpenInput(String),
    AddInput(String),
    AddOutput,
    SetVideoOrientation(VideoOrientation),
    StartRunning,
    StopRunning,
}

impl DriverCall {
    /// Calls that change session or hardware state
    pub fn is_device_mutation(&self) -> bool {
        !matches!(
            self,
            DriverCall::AuthorizationStatus
                | DriverCall::RequestAuthorization
                | DriverCall::DefaultDevice(_)
        )
    }
}

/// Shared, append-only record of driver calls
#[derive(Debug, Clone, Default)]
pub struct DriverCallLog {
    calls: Arc<Mutex<Vec<DriverCall>>>,
}

impl DriverCallLog {
    fn record(&self, call: DriverCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&DriverCall) -> bool,
    {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn device_mutations(&self) -> Vec<DriverCall> {
        self.calls()
            .into_iter()
            .filter(DriverCall::is_device_mutation)
            .collect()
    }
}

/// How the synthetic permission prompt answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Grant,
    Deny,
    /// Drop the completion handler without calling it
    Drop,
    /// Keep the completion handler forever without calling it
    Never,
}

struct FrameGenerator {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// In-memory [`CaptureDriver`] with scriptable failures and a frame generator
pub struct SyntheticDriver {
    status: PermissionStatus,
    prompt: PromptResponse,
    prompt_delay: Duration,
    devices: Vec<CameraDeviceInfo>,
    unsupported_presets: Vec<SessionPreset>,
    busy_input: bool,
    reject_input: bool,
    reject_output: bool,
    connection: bool,
    start_failure: Option<String>,
    frame_limit: Option<u64>,
    frame_interval: Duration,
    frame_size: (u32, u32),
    log: DriverCallLog,

    configuring: bool,
    preset: Option<SessionPreset>,
    input: Option<CaptureInput>,
    output: Option<FrameOutput>,
    orientation: VideoOrientation,
    pending_prompts: Vec<AuthorizationCallback>,
    generator: Option<FrameGenerator>,
}

impl SyntheticDriver {
    /// Authorized driver with a single wide-angle back camera
    pub fn new() -> Self {
        Self {
            status: PermissionStatus::Granted,
            prompt: PromptResponse::Grant,
            prompt_delay: Duration::from_millis(10),
            devices: vec![Self::device(
                "synthetic-0",
                DeviceSelector::new(DeviceType::BuiltInWideAngleCamera, DevicePosition::Back),
            )],
            unsupported_presets: Vec::new(),
            busy_input: false,
            reject_input: false,
            reject_output: false,
            connection: true,
            start_failure: None,
            frame_limit: None,
            frame_interval: Duration::from_millis(5),
            frame_size: (32, 24),
            log: DriverCallLog::default(),
            configuring: false,
            preset: None,
            input: None,
            output: None,
            orientation: VideoOrientation::LandscapeRight,
            pending_prompts: Vec::new(),
            generator: None,
        }
    }

    /// A synthetic device of the given kind
    pub fn device(id: &str, selector: DeviceSelector) -> CameraDeviceInfo {
        CameraDeviceInfo::new(id.to_string(), format!("Synthetic {} camera", selector))
            .with_kind(selector.device_type, selector.position)
    }

    pub fn with_authorization(mut self, status: PermissionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_prompt_response(mut self, response: PromptResponse) -> Self {
        self.prompt = response;
        self
    }

    pub fn with_prompt_delay(mut self, delay: Duration) -> Self {
        self.prompt_delay = delay;
        self
    }

    pub fn with_devices(mut self, devices: Vec<CameraDeviceInfo>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_unsupported_preset(mut self, preset: SessionPreset) -> Self {
        self.unsupported_presets.push(preset);
        self
    }

    /// `open_input` fails as if another process held the device
    pub fn with_busy_input(mut self) -> Self {
        self.busy_input = true;
        self
    }

    /// `add_input` refuses the opened device
    pub fn with_rejected_input(mut self) -> Self {
        self.reject_input = true;
        self
    }

    /// `add_output` refuses the frame output
    pub fn with_rejected_output(mut self) -> Self {
        self.reject_output = true;
        self
    }

    pub fn without_connection(mut self) -> Self {
        self.connection = false;
        self
    }

    pub fn with_start_failure(mut self, reason: &str) -> Self {
        self.start_failure = Some(reason.to_string());
        self
    }

    /// Stop generating after `limit` frames instead of running until stopped
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    /// Handle to the call log; stays valid after the driver is moved
    pub fn call_log(&self) -> DriverCallLog {
        self.log.clone()
    }

    fn stop_generator(&mut self) {
        if let Some(generator) = self.generator.take() {
            generator.stop.store(true, Ordering::Release);
            let _ = generator.handle.join();
        }
    }
}

impl Default for SyntheticDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDriver for SyntheticDriver {
    fn authorization_status(&self) -> PermissionStatus {
        self.log.record(DriverCall::AuthorizationStatus);
        self.status
    }

    fn request_authorization(&mut self, on_complete: AuthorizationCallback) {
        self.log.record(DriverCall::RequestAuthorization);
        let granted = match self.prompt {
            PromptResponse::Grant => true,
            PromptResponse::Deny => false,
            PromptResponse::Drop => return,
            PromptResponse::Never => {
                self.pending_prompts.push(on_complete);
                return;
            }
        };

        // Answer from another thread, like an OS permission dialog
        let delay = self.prompt_delay;
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            on_complete(granted);
        });
    }

    fn devices(&self) -> Result<Vec<CameraDeviceInfo>, CameraError> {
        Ok(self.devices.clone())
    }

    fn default_device(
        &mut self,
        device_type: DeviceType,
        position: DevicePosition,
    ) -> Option<CameraDeviceInfo> {
        let selector = DeviceSelector::new(device_type, position);
        self.log.record(DriverCall::DefaultDevice(selector));
        self.devices.iter().find(|d| d.matches(&selector)).cloned()
    }

    fn begin_configuration(&mut self) {
        self.log.record(DriverCall::BeginConfiguration);
        self.configuring = true;
    }

    fn commit_configuration(&mut self) {
        self.log.record(DriverCall::CommitConfiguration);
        self.configuring = false;
    }

    fn set_preset(&mut self, preset: SessionPreset) -> bool {
        self.log.record(DriverCall::SetPreset(preset));
        if self.unsupported_presets.contains(&preset) {
            return false;
        }
        self.preset = Some(preset);
        true
    }

    fn open_input(&mut self, device: &CameraDeviceInfo) -> Result<CaptureInput, CameraError> {
        self.log.record(DriverCall::OpenInput(device.id.clone()));
        if self.busy_input {
            return Err(CameraError::DeviceBusy(format!(
                "{} is in use by another session",
                device.id
            )));
        }
        Ok(CaptureInput::new(device.clone()))
    }

    fn add_input(&mut self, input: CaptureInput) -> bool {
        self.log.record(DriverCall::AddInput(input.device.id.clone()));
        if self.reject_input || self.input.is_some() {
            return false;
        }
        self.input = Some(input);
        true
    }

    fn add_output(&mut self, output: FrameOutput) -> bool {
        self.log.record(DriverCall::AddOutput);
        if self.reject_output || self.output.is_some() {
            return false;
        }
        self.output = Some(output);
        true
    }

    fn has_connection(&self) -> bool {
        self.connection && self.input.is_some() && self.output.is_some()
    }

    fn set_video_orientation(&mut self, orientation: VideoOrientation) {
        self.log.record(DriverCall::SetVideoOrientation(orientation));
        self.orientation = orientation;
    }

    fn start_running(&mut self) -> Result<(), CameraError> {
        self.log.record(DriverCall::StartRunning);
        if let Some(reason) = &self.start_failure {
            return Err(CameraError::StreamError(reason.clone()));
        }
        if self.generator.is_some() {
            return Ok(());
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let output = self.output.clone();
        let device_id = self
            .input
            .as_ref()
            .map(|i| i.device.id.clone())
            .unwrap_or_default();
        let orientation = self.orientation;
        let limit = self.frame_limit;
        let interval = self.frame_interval;
        let (width, height) = self.frame_size;

        let handle = std::thread::Builder::new()
            .name("synthetic-capture".to_string())
            .spawn(move || {
                let mut n = 0u64;
                while !thread_stop.load(Ordering::Acquire) && limit.map_or(true, |l| n < l) {
                    if let Some(output) = &output {
                        let mut frame = synthetic_video_frame(n, width, height)
                            .with_orientation(orientation);
                        frame.device_id = device_id.clone();
                        output.push(frame);
                    }
                    n += 1;
                    std::thread::sleep(interval);
                }
            })
            .map_err(|e| CameraError::StreamError(format!("Failed to spawn generator: {}", e)))?;

        self.generator = Some(FrameGenerator { stop, handle });
        Ok(())
    }

    fn stop_running(&mut self) {
        self.log.record(DriverCall::StopRunning);
        self.stop_generator();
    }

    fn is_running(&self) -> bool {
        self.generator.is_some()
    }
}

impl Drop for SyntheticDriver {
    fn drop(&mut self) {
        self.stop_generator();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_default_device_records_query() {
        let mut driver = SyntheticDriver::new();
        let log = driver.call_log();
        assert!(driver
            .default_device(DeviceType::BuiltInDualCamera, DevicePosition::Back)
            .is_none());
        assert!(driver
            .default_device(DeviceType::BuiltInWideAngleCamera, DevicePosition::Back)
            .is_some());
        assert_eq!(log.calls().len(), 2);
        assert!(log.device_mutations().is_empty());
    }

    #[test]
    fn test_prompt_answers_from_other_thread() {
        let mut driver = SyntheticDriver::new().with_prompt_response(PromptResponse::Deny);
        let (tx, rx) = mpsc::channel();
        driver.request_authorization(Box::new(move |granted| {
            let _ = tx.send(granted);
        }));
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(false));
    }

    #[test]
    fn test_only_one_output_accepted() {
        let mut driver = SyntheticDriver::new();
        let output = FrameOutput::new(2, Duration::from_millis(5)).unwrap();
        assert!(driver.add_output(output.clone()));
        assert!(!driver.add_output(output.clone()));
        output.shutdown();
    }

    #[test]
    fn test_busy_input_fails_to_open() {
        let mut driver = SyntheticDriver::new().with_busy_input();
        let device = driver.devices().unwrap().remove(0);
        assert!(matches!(
            driver.open_input(&device),
            Err(CameraError::DeviceBusy(_))
        ));
    }
}
