//! FFmpeg CLI wrapper for playlist-to-MP4 remuxing.
//!
//! This crate provides:
//! - Binary resolution/provisioning for `ffmpeg` and `ffprobe`
//! - FFprobe metadata probing
//! - Incremental progress parsing from FFmpeg's stderr stats
//! - The stream-copy conversion engine with cancellation support

pub mod binaries;
pub mod engine;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;

mod process;

pub use binaries::{BinaryLocation, BinaryResolver, ResolveMode};
pub use engine::{ConversionEngine, RemuxCommand};
pub use error::{EngineError, ProbeError, ResolveError};
pub use probe::{probe, MediaMetadata, VideoStream};
pub use progress::{parse_timestamp, ProgressParser, ProgressSample};
