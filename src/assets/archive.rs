use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::{EngineError, Result};

/// Extract a bundled ZIP archive beneath `dest_root`.
///
/// The archive's first entry names the asset subdirectory (e.g. `ir/`); it is
/// created under `dest_root` before the remaining entries are written verbatim.
/// Used only as a one-time fallback when the expected asset directory is
/// missing; the caller checks existence first. Any failure aborts the whole
/// extraction, nothing is retried.
///
/// Returns the number of files written.
pub async fn extract_archive(src: &Path, dest_root: &Path) -> Result<usize> {
    let bytes = tokio::fs::read(src).await?;
    let dest = dest_root.to_path_buf();

    tokio::task::spawn_blocking(move || extract_bytes(bytes, &dest))
        .await
        .map_err(|e| EngineError::Archive(format!("extraction task failed: {e}")))?
}

fn extract_bytes(bytes: Vec<u8>, dest_root: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| EngineError::Archive(format!("unreadable archive: {e}")))?;
    if archive.is_empty() {
        return Err(EngineError::Archive("archive has no entries".into()));
    }

    // First entry names the asset subdirectory to recreate.
    let subdir = entry_path(&mut archive, 0, dest_root)?;
    std::fs::create_dir_all(&subdir)?;

    let mut written = 0;
    for i in 1..archive.len() {
        let path = entry_path(&mut archive, i, dest_root)?;
        let mut entry = archive
            .by_index(i)
            .map_err(|e| EngineError::Archive(format!("entry {i}: {e}")))?;

        if entry.is_dir() {
            std::fs::create_dir_all(&path)?;
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| EngineError::Archive(format!("entry {i}: corrupt data: {e}")))?;
        std::fs::write(&path, data)?;
        written += 1;
    }

    tracing::info!(files = written, root = %dest_root.display(), "archive extracted");
    Ok(written)
}

fn entry_path(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    index: usize,
    dest_root: &Path,
) -> Result<PathBuf> {
    let entry = archive
        .by_index(index)
        .map_err(|e| EngineError::Archive(format!("entry {index}: {e}")))?;
    let relative = entry
        .enclosed_name()
        .ok_or_else(|| EngineError::Archive(format!("entry {index}: unsafe path")))?;
    Ok(dest_root.join(relative))
}
