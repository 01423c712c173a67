//! Byte-for-byte transfer of finished files into the archive directories

use crate::error::TransferError;
use crate::workdir::list_entries;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Persistent destinations, validated before a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDirs {
    pub video: PathBuf,
    pub audio: PathBuf,
}

/// Copy every regular file in `src_dir` into `dst_dir`, keeping file names.
///
/// Returns the archived paths in name order.
pub async fn copy_dir_files(
    src_dir: &Path,
    dst_dir: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>, TransferError> {
    let entries = list_entries(src_dir)
        .await
        .map_err(|source| TransferError::ReadDir {
            path: src_dir.to_path_buf(),
            source,
        })?;

    let mut copied = Vec::with_capacity(entries.len());
    for src in entries {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let Some(name) = src.file_name() else {
            continue;
        };
        let metadata = tokio::fs::metadata(&src)
            .await
            .map_err(|source| TransferError::Open {
                path: src.clone(),
                source,
            })?;
        if !metadata.is_file() {
            debug!("Skipping non-file entry {}", src.display());
            continue;
        }

        let dst = dst_dir.join(name);
        copy_file(&src, &dst, cancel).await?;
        copied.push(dst);
    }

    Ok(copied)
}

async fn copy_file(src: &Path, dst: &Path, cancel: &CancellationToken) -> Result<u64, TransferError> {
    let mut reader = File::open(src).await.map_err(|source| TransferError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let mut writer = File::create(dst).await.map_err(|source| TransferError::Create {
        path: dst.to_path_buf(),
        source,
    })?;

    let copied = tokio::select! {
        res = tokio::io::copy(&mut reader, &mut writer) => Some(res),
        _ = cancel.cancelled() => None,
    };

    let Some(res) = copied else {
        // drop the partial copy
        drop(writer);
        let _ = tokio::fs::remove_file(dst).await;
        return Err(TransferError::Cancelled);
    };
    let bytes = res.map_err(|source| TransferError::Copy {
        path: src.to_path_buf(),
        source,
    })?;

    // flush buffered writes before reporting success
    writer.sync_all().await.map_err(|source| TransferError::Copy {
        path: dst.to_path_buf(),
        source,
    })?;

    info!("Archived {} ({} bytes)", dst.display(), bytes);
    Ok(bytes)
}
