//! Testing utilities for CrabCapture
//!
//! Synthetic frames and a scriptable driver for exercising the session
//! controller without camera hardware or OS permission prompts.

pub mod synthetic_data;
pub mod synthetic_driver;

pub use synthetic_data::synthetic_video_frame;
pub use synthetic_driver::{DriverCall, DriverCallLog, PromptResponse, SyntheticDriver};
