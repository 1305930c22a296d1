//! Atomic persistence of extracted payloads.
//!
//! The payload is written to a hidden temporary file (`.wado.<uuid>.part`)
//! next to the target, flushed and synced, then renamed over the final name.
//! Readers of the folder therefore see either no file or the complete file.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::error::WadoError;
use super::filename::sanitize_filename;
use super::response::DicomPayload;

/// Writes `payload` to `folder/filename` and returns the absolute path.
///
/// The folder is created when missing. `filename` is sanitized so the file
/// always lands directly inside `folder`. An existing file of the same name
/// is replaced.
///
/// # Errors
///
/// Returns [`WadoError::Persistence`] when the folder cannot be created or
/// the file cannot be written, synced or renamed. The temporary file is
/// removed in every failure case.
#[instrument(level = "debug", skip(payload), fields(bytes = payload.len(), folder = %folder.display()))]
pub async fn save(
    payload: &DicomPayload,
    folder: &Path,
    filename: &str,
) -> Result<PathBuf, WadoError> {
    tokio::fs::create_dir_all(folder)
        .await
        .map_err(|e| WadoError::persistence(folder, e))?;

    let filename = sanitize_filename(filename);
    let target = folder.join(&filename);
    // Fixed length, whatever the length of the target name.
    let temp_path = folder.join(format!(".wado.{}.part", uuid::Uuid::new_v4()));
    debug!(temp = %temp_path.display(), target = %target.display(), "writing payload");

    if let Err(error) = write_synced(&temp_path, payload.as_bytes()).await {
        debug!(path = %temp_path.display(), "cleaning up temporary file after error");
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, &target).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(WadoError::persistence(&target, e));
    }

    let path = tokio::fs::canonicalize(&target)
        .await
        .map_err(|e| WadoError::persistence(&target, e))?;
    debug!(path = %path.display(), "payload persisted");
    Ok(path)
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), WadoError> {
    let file = File::create(path)
        .await
        .map_err(|e| WadoError::persistence(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .await
        .map_err(|e| WadoError::persistence(path, e))?;
    writer
        .flush()
        .await
        .map_err(|e| WadoError::persistence(path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| WadoError::persistence(path, e))
}
