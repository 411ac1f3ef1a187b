//! Conversion job orchestration.
//!
//! Drives a single playlist-to-MP4 conversion through validation, binary
//! resolution, probing and transcoding, delivering progress/status/terminal
//! events to the caller over a channel.

pub mod config;
pub mod error;
pub mod job;
pub mod logging;

pub use config::WorkerConfig;
pub use error::{JobError, JobResult};
pub use job::{ConversionJob, JobHandle};
