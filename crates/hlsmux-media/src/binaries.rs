//! FFmpeg/FFprobe binary resolution.
//!
//! Two deployment modes are supported. Packaged builds ship the executables
//! as bundled resources and extract them into a scratch directory on first
//! use; development builds keep them in a local working directory, falling
//! back to the system PATH when they are absent. Provisioning runs at most
//! once per resolve mode per process.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ResolveError;

/// Absolute paths to the two required executables. Plain value; computed
/// once per job and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLocation {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// Where binaries come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// Bundled resources extracted into a private scratch directory.
    Packaged {
        resource_dir: PathBuf,
        scratch_dir: PathBuf,
    },
    /// Local `<work_dir>/ffmpeg/` directory, populated from PATH on demand.
    Development { work_dir: PathBuf },
}

impl ResolveMode {
    /// Packaged mode with the default scratch directory.
    pub fn packaged(resource_dir: impl Into<PathBuf>) -> Self {
        Self::Packaged {
            resource_dir: resource_dir.into(),
            scratch_dir: std::env::temp_dir().join("hlsmux-bin"),
        }
    }

    /// Development mode rooted at `work_dir`.
    pub fn development(work_dir: impl Into<PathBuf>) -> Self {
        Self::Development {
            work_dir: work_dir.into(),
        }
    }
}

fn exe_name(base: &str) -> String {
    format!("{}{}", base, std::env::consts::EXE_SUFFIX)
}

/// Provisioning barrier: entries live for the process lifetime, one per
/// resolve mode. Guarded by a mutex so concurrent first calls cannot both
/// extract.
static RESOLVED: OnceLock<Mutex<Vec<(ResolveMode, BinaryLocation)>>> = OnceLock::new();

/// Locates or provisions the transcoder and prober executables.
pub struct BinaryResolver {
    mode: ResolveMode,
}

impl BinaryResolver {
    pub fn new(mode: ResolveMode) -> Self {
        Self { mode }
    }

    /// Resolve both executables.
    ///
    /// The first call per mode provisions files on disk; subsequent calls
    /// are pure lookups returning identical paths.
    pub async fn resolve(&self) -> Result<BinaryLocation, ResolveError> {
        let cache = RESOLVED.get_or_init(|| Mutex::new(Vec::new()));
        let mut entries = cache.lock().await;

        if let Some((_, location)) = entries.iter().find(|(mode, _)| *mode == self.mode) {
            return Ok(location.clone());
        }

        let location = self.provision().await?;
        entries.push((self.mode.clone(), location.clone()));
        Ok(location)
    }

    async fn provision(&self) -> Result<BinaryLocation, ResolveError> {
        match &self.mode {
            ResolveMode::Packaged {
                resource_dir,
                scratch_dir,
            } => extract_bundled(resource_dir, scratch_dir).await,
            ResolveMode::Development { work_dir } => provision_development(work_dir).await,
        }
    }
}

async fn extract_bundled(
    resource_dir: &Path,
    scratch_dir: &Path,
) -> Result<BinaryLocation, ResolveError> {
    fs::create_dir_all(scratch_dir).await?;
    let ffmpeg = extract_one(resource_dir, scratch_dir, "ffmpeg").await?;
    let ffprobe = extract_one(resource_dir, scratch_dir, "ffprobe").await?;
    Ok(BinaryLocation { ffmpeg, ffprobe })
}

/// Copy one bundled executable into the scratch directory, skipping the
/// copy when the target path already exists.
async fn extract_one(
    resource_dir: &Path,
    scratch_dir: &Path,
    base: &str,
) -> Result<PathBuf, ResolveError> {
    let name = exe_name(base);
    let target = scratch_dir.join(&name);

    if target.exists() {
        debug!("{} already extracted at {}", name, target.display());
        return Ok(target);
    }

    let resource = resource_dir.join(&name);
    if !resource.exists() {
        return Err(ResolveError::ResourceMissing(resource));
    }

    fs::copy(&resource, &target).await?;
    info!("extracted {} to {}", name, target.display());
    Ok(target)
}

async fn provision_development(work_dir: &Path) -> Result<BinaryLocation, ResolveError> {
    let bin_dir = work_dir.join("ffmpeg");
    fs::create_dir_all(&bin_dir).await?;

    let ffmpeg = bin_dir.join(exe_name("ffmpeg"));
    let ffprobe = bin_dir.join(exe_name("ffprobe"));

    if !ffmpeg.exists() || !ffprobe.exists() {
        let system_ffmpeg = which::which("ffmpeg").map_err(|_| ResolveError::FfmpegNotFound)?;
        let system_ffprobe = which::which("ffprobe").map_err(|_| ResolveError::FfprobeNotFound)?;

        fs::copy(&system_ffmpeg, &ffmpeg).await?;
        fs::copy(&system_ffprobe, &ffprobe).await?;
        info!(
            "copied system binaries into {} ({}, {})",
            bin_dir.display(),
            system_ffmpeg.display(),
            system_ffprobe.display()
        );
    }

    Ok(BinaryLocation { ffmpeg, ffprobe })
}
