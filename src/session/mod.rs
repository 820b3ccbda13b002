//! Capture-session controller: authorization, configuration, start/stop and
//! frame delivery.
//!
//! Setup runs once per [`CaptureController`] on its own thread:
//!
//! 1. authorize, waiting on the permission prompt when status is undetermined
//! 2. configure inside a single begin/commit transaction
//! 3. start streaming if the [`SetupResult`] latch is still `Success`
//!
//! Frames travel from the driver into a [`FrameOutput`], whose own thread
//! invokes the registered [`FrameConsumer`].

pub mod controller;
pub mod output;
pub mod result;

pub use controller::CaptureController;
pub use output::{FrameConsumer, FrameOutput};
pub use result::{SetupResult, SetupResultCell};
