use std::path::Path;

use serde::Serialize;

use crate::error::{EngineError, Result};

/// Serialize a value back to the manifest dialect. Records written here parse
/// back through the loader field-for-field.
pub async fn write_config<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = json5::to_string(value)
        .map_err(|e| EngineError::manifest(format!("serialize failed: {e}")))?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

/// Dump analysis values, one base-10 number per line.
pub async fn write_analysis(path: &Path, data: &[f32]) -> Result<()> {
    let mut text = String::with_capacity(data.len() * 12);
    for v in data {
        text.push_str(&v.to_string());
        text.push('\n');
    }
    tokio::fs::write(path, text).await?;
    Ok(())
}

/// Dump raw bytes, e.g. a captured buffer.
pub async fn write_binary(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data).await?;
    Ok(())
}
