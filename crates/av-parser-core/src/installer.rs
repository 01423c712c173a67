//! Locate yt-dlp, installing a managed copy on first use

use crate::config::PathsConfig;
use crate::error::InstallError;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const RELEASE_BASE: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest/download";

fn binary_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    }
}

/// Release asset for the current platform
pub fn release_url() -> String {
    let asset = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else if cfg!(target_os = "macos") {
        "yt-dlp_macos"
    } else if cfg!(target_arch = "aarch64") {
        "yt-dlp_linux_aarch64"
    } else {
        "yt-dlp_linux"
    };
    format!("{}/{}", RELEASE_BASE, asset)
}

/// Where a managed yt-dlp lives: `<cache_dir>/av-parser/bin/yt-dlp`
pub fn managed_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("av-parser").join("bin").join(binary_name()))
}

/// Configured path, then `PATH`, then the managed copy.
pub fn find_yt_dlp(paths: &PathsConfig) -> Option<PathBuf> {
    if let Some(ref path) = paths.yt_dlp {
        return Some(path.clone());
    }

    if let Ok(path) = which::which("yt-dlp") {
        debug!("Found yt-dlp in PATH: {}", path.display());
        return Some(path);
    }

    managed_path().filter(|p| p.exists())
}

/// Download the release binary to `target` and mark it executable.
pub async fn install(target: &Path, cancel: &CancellationToken) -> Result<PathBuf, InstallError> {
    let url = release_url();
    info!("Installing yt-dlp from {}", url);

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let fetch = async {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()?;

        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(InstallError::BadStatus(response.status().as_u16()));
        }

        Ok::<_, InstallError>(response.bytes().await?)
    };

    let bytes = tokio::select! {
        bytes = fetch => bytes?,
        _ = cancel.cancelled() => return Err(InstallError::Cancelled),
    };

    // Write beside the target and rename so a partial binary is never picked up.
    let partial = target.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o755);
        tokio::fs::set_permissions(&partial, perms).await?;
    }

    tokio::fs::rename(&partial, target).await?;
    info!("Installed yt-dlp to {}", target.display());

    Ok(target.to_path_buf())
}

/// Resolve yt-dlp, installing the managed copy when allowed.
pub async fn ensure_yt_dlp(
    paths: &PathsConfig,
    auto_install: bool,
    cancel: &CancellationToken,
) -> Result<Option<PathBuf>, InstallError> {
    if let Some(path) = find_yt_dlp(paths) {
        return Ok(Some(path));
    }

    if !auto_install {
        return Ok(None);
    }

    let target = managed_path().ok_or(InstallError::NoCacheDir)?;
    install(&target, cancel).await.map(Some)
}
