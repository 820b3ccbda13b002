use crate::errors::CameraError;
use crate::types::CameraFrame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Receives every captured frame while the session is streaming.
///
/// Invoked on the frame-delivery thread, never on the setup thread.
pub trait FrameConsumer: Send + Sync {
    fn on_frame(&self, frame: CameraFrame);
}

impl<F> FrameConsumer for F
where
    F: Fn(CameraFrame) + Send + Sync,
{
    fn on_frame(&self, frame: CameraFrame) {
        self(frame)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Queue<T> {
    inner: Mutex<QueueInner<T>>,
    cv: Condvar,
}

struct QueueInner<T> {
    items: VecDeque<T>,
    capacity: usize,
    dropped: u64,
    closed: bool,
}

impl<T> Queue<T> {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::with_capacity(capacity.min(1024)),
                capacity: capacity.max(1),
                dropped: 0,
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    fn push_drop_oldest(&self, item: T) -> bool {
        let mut g = lock(&self.inner);
        if g.closed {
            return false;
        }

        if g.items.len() >= g.capacity {
            g.items.pop_front();
            g.dropped = g.dropped.saturating_add(1);
        }
        g.items.push_back(item);
        self.cv.notify_one();
        true
    }

    /// `Ok(None)` on timeout, `Err(())` once closed and drained
    fn pop_timeout(&self, timeout: Duration) -> Result<Option<T>, ()> {
        let mut g = lock(&self.inner);
        // No deadline when the timeout does not fit in an Instant
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if let Some(item) = g.items.pop_front() {
                return Ok(Some(item));
            }
            if g.closed {
                return Err(());
            }

            g = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    self.cv
                        .wait_timeout(g, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.cv.wait(g).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    /// Discard pending items without closing; they count as dropped
    fn clear(&self) -> usize {
        let mut g = lock(&self.inner);
        let cleared = g.items.len();
        g.items.clear();
        g.dropped = g.dropped.saturating_add(cleared as u64);
        cleared
    }

    fn count_dropped(&self, n: u64) {
        let mut g = lock(&self.inner);
        g.dropped = g.dropped.saturating_add(n);
    }

    fn dropped(&self) -> u64 {
        lock(&self.inner).dropped
    }

    fn close(&self) {
        let mut g = lock(&self.inner);
        g.closed = true;
        g.items.clear();
        self.cv.notify_all();
    }
}

struct OutputInner {
    queue: Queue<CameraFrame>,
    consumer: Mutex<Option<Arc<dyn FrameConsumer>>>,
    streaming: AtomicBool,
    next_sequence: AtomicU64,
    delivered: AtomicU64,
    // Held by the delivery thread while it hands a frame to the consumer
    delivering: Mutex<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Frame-output sink attached to a capture session.
///
/// Drivers push frames from their capture thread; a dedicated delivery
/// thread hands them to the registered [`FrameConsumer`]. Frames pushed
/// while the streaming gate is closed are dropped, so nothing reaches the
/// consumer before the session has actually started.
#[derive(Clone)]
pub struct FrameOutput {
    inner: Arc<OutputInner>,
}

impl FrameOutput {
    /// Create the output and spawn its delivery thread
    pub fn new(capacity: usize, poll_interval: Duration) -> Result<Self, CameraError> {
        let inner = Arc::new(OutputInner {
            queue: Queue::new(capacity),
            consumer: Mutex::new(None),
            streaming: AtomicBool::new(false),
            next_sequence: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            delivering: Mutex::new(()),
            worker: Mutex::new(None),
        });

        let worker_inner = inner.clone();
        let handle = std::thread::Builder::new()
            .name("crabcapture-frames".to_string())
            .spawn(move || delivery_loop(worker_inner, poll_interval))
            .map_err(|e| {
                CameraError::InitializationError(format!(
                    "Failed to spawn frame delivery thread: {}",
                    e
                ))
            })?;
        *lock(&inner.worker) = Some(handle);

        Ok(Self { inner })
    }

    /// Hand a captured frame to the delivery thread.
    ///
    /// Returns `false` if the frame was dropped because the gate is closed.
    pub fn push(&self, mut frame: CameraFrame) -> bool {
        if !self.is_streaming() {
            self.inner.queue.count_dropped(1);
            return false;
        }
        frame.sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.inner.queue.push_drop_oldest(frame)
    }

    /// Install the consumer, replacing any previous one
    pub fn set_consumer(&self, consumer: Arc<dyn FrameConsumer>) -> bool {
        lock(&self.inner.consumer).replace(consumer).is_some()
    }

    pub fn has_consumer(&self) -> bool {
        lock(&self.inner.consumer).is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.streaming.load(Ordering::Acquire)
    }

    /// Open or close the gate. Closing discards queued frames and waits for
    /// an in-flight delivery, so the consumer sees nothing once this returns.
    pub(crate) fn set_streaming(&self, streaming: bool) {
        self.inner.streaming.store(streaming, Ordering::Release);
        if streaming {
            return;
        }

        let cleared = self.inner.queue.clear();
        if cleared > 0 {
            log::debug!("Discarded {} queued frames on stop", cleared);
        }
        // A consumer stopping the session runs on the worker and holds the lock
        if !self.on_worker_thread() {
            drop(lock(&self.inner.delivering));
        }
    }

    fn on_worker_thread(&self) -> bool {
        lock(&self.inner.worker)
            .as_ref()
            .map_or(false, |h| h.thread().id() == std::thread::current().id())
    }

    /// Frames handed to the consumer so far
    pub fn delivered_frames(&self) -> u64 {
        self.inner.delivered.load(Ordering::Relaxed)
    }

    /// Frames discarded by the gate or by buffer overflow
    pub fn dropped_frames(&self) -> u64 {
        self.inner.queue.dropped()
    }

    /// Close the gate, discard pending frames and join the delivery thread
    pub(crate) fn shutdown(&self) {
        self.set_streaming(false);
        self.inner.queue.close();

        let handle = lock(&self.inner.worker).take();
        if let Some(handle) = handle {
            // A consumer dropping the controller runs on the worker itself
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl std::fmt::Debug for FrameOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameOutput")
            .field("streaming", &self.is_streaming())
            .field("has_consumer", &self.has_consumer())
            .field("delivered", &self.delivered_frames())
            .field("dropped", &self.dropped_frames())
            .finish()
    }
}

fn delivery_loop(inner: Arc<OutputInner>, poll_interval: Duration) {
    loop {
        match inner.queue.pop_timeout(poll_interval) {
            Ok(Some(frame)) => {
                let _delivering = lock(&inner.delivering);
                if !inner.streaming.load(Ordering::Acquire) {
                    inner.queue.count_dropped(1);
                    continue;
                }
                let consumer = lock(&inner.consumer).clone();
                match consumer {
                    Some(consumer) => {
                        consumer.on_frame(frame);
                        inner.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    None => inner.queue.count_dropped(1),
                }
            }
            Ok(None) => continue,
            Err(()) => break,
        }
    }
    log::debug!("Frame delivery thread exiting");
}
