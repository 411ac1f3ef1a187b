//! Shared data models for hlsmux.
//!
//! This crate provides Serde-serializable types for:
//! - Source references (playlist URLs and local manifest files)
//! - Conversion requests and results
//! - Job identifiers and lifecycle states
//! - Job event message schemas

pub mod event;
pub mod job;
pub mod request;
pub mod source;

// Re-export common types
pub use event::JobEvent;
pub use job::{JobId, JobState};
pub use request::{ConversionRequest, ConversionResult};
pub use source::SourceReference;
