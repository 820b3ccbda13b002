use crate::config::CrabCaptureConfig;
use crate::errors::{CameraError, ConfigurationError};
use crate::permissions::PermissionStatus;
use crate::platform::CaptureDriver;
use crate::session::output::{FrameConsumer, FrameOutput};
use crate::session::result::{SetupResult, SetupResultCell};
use crate::types::CameraDeviceInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the owner and the setup thread.
struct SetupShared {
    session_id: Uuid,
    driver: Mutex<Box<dyn CaptureDriver>>,
    result: SetupResultCell,
    error: Mutex<Option<ConfigurationError>>,
    output: FrameOutput,
    config: CrabCaptureConfig,
    running: AtomicBool,
    stop_requested: AtomicBool,
    settled: Mutex<Option<SetupResult>>,
    settled_cv: Condvar,
    settled_tx: watch::Sender<Option<SetupResult>>,
}

impl SetupShared {
    fn driver(&self) -> MutexGuard<'_, Box<dyn CaptureDriver>> {
        lock(&self.driver)
    }

    /// Runs the three setup steps in order; the only await is inside `authorize`.
    async fn run(&self) {
        self.authorize().await;
        self.configure_session();
        self.start_if_ready();
        self.finish();
    }

    async fn authorize(&self) {
        let status = self.driver().authorization_status();
        if status.is_refused() {
            log::warn!("[{}] Camera access {}", self.session_id, status);
            self.result.latch(SetupResult::NotAuthorized);
            return;
        }

        match status {
            PermissionStatus::NotDetermined => {
                log::info!("[{}] Camera access not determined, prompting", self.session_id);
                let (tx, rx) = oneshot::channel();
                self.driver().request_authorization(Box::new(move |granted| {
                    let _ = tx.send(granted);
                }));

                match rx.await {
                    Ok(true) => log::info!("[{}] Camera access granted", self.session_id),
                    Ok(false) => {
                        log::warn!("[{}] Camera access denied by user", self.session_id);
                        self.result.latch(SetupResult::NotAuthorized);
                    }
                    Err(_) => {
                        log::warn!(
                            "[{}] Permission request dropped without an answer, treating as denied",
                            self.session_id
                        );
                        self.result.latch(SetupResult::NotAuthorized);
                    }
                }
            }
            _ => log::debug!("[{}] Camera access already authorized", self.session_id),
        }
    }

    fn configure_session(&self) {
        if !self.result.get().is_success() {
            return;
        }

        let mut driver = self.driver();
        driver.begin_configuration();

        // Failing steps commit before returning their error
        match self.configure_locked(&mut **driver) {
            Ok(device) => {
                driver.commit_configuration();
                log::info!(
                    "[{}] Capture session configured with {} ({})",
                    self.session_id,
                    device.name,
                    device.id
                );
            }
            Err(e) => {
                log::error!("[{}] Capture session configuration failed: {}", self.session_id, e);
                *lock(&self.error) = Some(e);
            }
        }
    }

    fn configure_locked(
        &self,
        driver: &mut dyn CaptureDriver,
    ) -> Result<CameraDeviceInfo, ConfigurationError> {
        let preset = self.config.session.preset;
        if !driver.set_preset(preset) {
            log::debug!(
                "[{}] Preset {:?} unsupported, keeping device default",
                self.session_id,
                preset
            );
        }

        let Some(device) = self.select_device(driver) else {
            return Err(self.fail(driver, ConfigurationError::NoDefaultDeviceAvailable));
        };

        let input = match driver.open_input(&device) {
            Ok(input) => input,
            Err(e) => {
                log::error!("[{}] Could not open {}: {}", self.session_id, device.id, e);
                return Err(self.fail(driver, ConfigurationError::CannotAddInput));
            }
        };
        if !driver.add_input(input) {
            return Err(self.fail(driver, ConfigurationError::CannotAddInput));
        }

        if !driver.add_output(self.output.clone()) {
            return Err(self.fail(driver, ConfigurationError::CannotAddOutput));
        }

        if driver.has_connection() {
            if let Some(orientation) = self.config.session.orientation {
                driver.set_video_orientation(orientation);
            }
        }

        Ok(device)
    }

    fn select_device(&self, driver: &mut dyn CaptureDriver) -> Option<CameraDeviceInfo> {
        for selector in &self.config.session.device_preference {
            if let Some(device) = driver.default_device(selector.device_type, selector.position) {
                log::debug!("[{}] Selected {} camera {}", self.session_id, selector, device.id);
                return Some(device);
            }
            log::debug!("[{}] No {} camera available", self.session_id, selector);
        }
        None
    }

    fn fail(&self, driver: &mut dyn CaptureDriver, error: ConfigurationError) -> ConfigurationError {
        self.result.latch(SetupResult::ConfigurationFailed);
        driver.commit_configuration();
        error
    }

    fn start_if_ready(&self) {
        match self.result.get() {
            SetupResult::Success => {
                let mut driver = self.driver();
                if self.stop_requested.load(Ordering::Acquire) {
                    log::info!("[{}] Stop requested before start, not streaming", self.session_id);
                    return;
                }

                self.output.set_streaming(true);
                match driver.start_running() {
                    Ok(()) => {
                        self.running.store(true, Ordering::Release);
                        log::info!("[{}] Capture session running", self.session_id);
                    }
                    Err(e) => {
                        self.output.set_streaming(false);
                        self.result.latch(SetupResult::ConfigurationFailed);
                        log::error!("[{}] Failed to start capture session: {}", self.session_id, e);
                        *lock(&self.error) = Some(ConfigurationError::CannotStartStream(e.to_string()));
                    }
                }
            }
            SetupResult::NotAuthorized => {
                log::error!(
                    "[{}] Camera access not authorized, capture session not started",
                    self.session_id
                );
            }
            SetupResult::ConfigurationFailed => {
                log::error!(
                    "[{}] Capture session configuration failed, not started",
                    self.session_id
                );
            }
        }
    }

    fn finish(&self) {
        let result = self.result.get();
        *lock(&self.settled) = Some(result);
        self.settled_cv.notify_all();
        let _ = self.settled_tx.send(Some(result));
    }

    fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        let was_running = {
            let mut driver = self.driver();
            let was_running = self.running.swap(false, Ordering::AcqRel);
            if was_running {
                driver.stop_running();
            }
            was_running
        };

        // Outside the driver lock: this waits for an in-flight consumer call
        if was_running {
            self.output.set_streaming(false);
            log::info!("[{}] Capture session stopped", self.session_id);
        }
    }
}

/// Owns a capture session and drives its one-shot setup.
///
/// Construction launches authorization, configuration and start on a
/// dedicated setup thread. Failures never surface as errors from here:
/// they latch [`SetupResult`] and are logged.
pub struct CaptureController {
    shared: Arc<SetupShared>,
    settled_rx: watch::Receiver<Option<SetupResult>>,
}

impl CaptureController {
    /// Validate `config` and launch setup. Fails only if the config is
    /// invalid or the setup or delivery thread cannot be created.
    pub fn new<D>(driver: D, config: CrabCaptureConfig) -> Result<Self, CameraError>
    where
        D: CaptureDriver + 'static,
    {
        config.validate().map_err(CameraError::ConfigError)?;

        let session_id = Uuid::new_v4();
        let output = FrameOutput::new(
            config.delivery.buffer_capacity,
            Duration::from_millis(config.delivery.poll_interval_ms),
        )?;

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                output.shutdown();
                return Err(CameraError::InitializationError(format!(
                    "Failed to build setup runtime: {}",
                    e
                )));
            }
        };

        let (settled_tx, settled_rx) = watch::channel(None);
        let shared = Arc::new(SetupShared {
            session_id,
            driver: Mutex::new(Box::new(driver) as Box<dyn CaptureDriver>),
            result: SetupResultCell::new(),
            error: Mutex::new(None),
            output,
            config,
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            settled: Mutex::new(None),
            settled_cv: Condvar::new(),
            settled_tx,
        });

        log::info!("[{}] Starting capture session setup", session_id);
        let setup = shared.clone();
        let spawned = std::thread::Builder::new()
            .name("crabcapture-setup".to_string())
            .spawn(move || runtime.block_on(setup.run()));
        if let Err(e) = spawned {
            shared.output.shutdown();
            return Err(CameraError::InitializationError(format!(
                "Failed to spawn setup thread: {}",
                e
            )));
        }

        Ok(Self { shared, settled_rx })
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    /// Current value of the failure latch; `Success` while setup is in flight
    pub fn setup_result(&self) -> SetupResult {
        self.shared.result.get()
    }

    /// The configuration failure that latched `ConfigurationFailed`, if any
    pub fn configuration_error(&self) -> Option<ConfigurationError> {
        lock(&self.shared.error).clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Whether all three setup steps have completed
    pub fn is_settled(&self) -> bool {
        lock(&self.shared.settled).is_some()
    }

    /// Block until setup completes. `None` if it is still pending after
    /// `timeout`, e.g. while a permission prompt is unanswered. A timeout
    /// too large to represent as a deadline waits without one.
    pub fn wait_for_setup(&self, timeout: Duration) -> Option<SetupResult> {
        let deadline = Instant::now().checked_add(timeout);
        let cv = &self.shared.settled_cv;
        let mut settled = lock(&self.shared.settled);
        loop {
            if let Some(result) = *settled {
                return Some(result);
            }
            settled = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    cv.wait_timeout(settled, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => cv.wait(settled).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Await setup completion from async code
    pub async fn settled(&self) -> SetupResult {
        let mut rx = self.settled_rx.clone();
        let result = match rx.wait_for(|value| value.is_some()).await {
            Ok(value) => (*value).unwrap_or_default(),
            // Sender lives in the shared state, which we hold
            Err(_) => self.setup_result(),
        };
        result
    }

    /// Register the frame consumer. Frames reach it only once streaming has
    /// started; a session that never starts never invokes it.
    pub fn register_frame_consumer<C>(&self, consumer: C)
    where
        C: FrameConsumer + 'static,
    {
        if self.shared.output.set_consumer(Arc::new(consumer)) {
            log::warn!("[{}] Replaced previously registered frame consumer", self.session_id());
        } else {
            log::debug!("[{}] Frame consumer registered", self.session_id());
        }
    }

    pub fn frame_output(&self) -> &FrameOutput {
        &self.shared.output
    }

    /// Stop streaming. Idempotent; also prevents a pending setup from starting.
    pub fn stop(&self) {
        self.shared.stop();
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.shared.stop();
        self.shared.output.shutdown();
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("session_id", &self.session_id())
            .field("setup_result", &self.setup_result())
            .field("running", &self.is_running())
            .finish()
    }
}
