//! Source reference classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// A playlist source: either a remote URL or a local manifest file.
///
/// Classification happens once, before a job starts; the reference is
/// immutable for the lifetime of the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SourceReference {
    /// Remote `http`/`https` URL, passed through to FFmpeg untouched.
    Url(String),
    /// Local filesystem path. Must exist at validation time.
    Path(PathBuf),
}

impl SourceReference {
    /// Classify a raw input string.
    ///
    /// Anything that parses as a URL with an `http` or `https` scheme is
    /// remote; everything else is treated as a local path (drive-letter
    /// prefixes like `C:` parse as URL schemes but are not remote).
    pub fn parse(input: &str) -> Self {
        match Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Self::Url(input.to_string())
            }
            _ => Self::Path(PathBuf::from(input)),
        }
    }

    /// Whether this source is fetched over the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// The local path, if this is a filesystem source.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Url(_) => None,
            Self::Path(p) => Some(p.as_path()),
        }
    }

    /// The string handed to FFmpeg/FFprobe as the input argument.
    pub fn as_input_arg(&self) -> String {
        match self {
            Self::Url(u) => u.clone(),
            Self::Path(p) => p.to_string_lossy().to_string(),
        }
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(u) => write!(f, "{}", u),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}
