use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::assets::RawAsset;
use crate::config::records::{ImpulseResponse, KeyBinding, SourceSample};
use crate::error::{EngineError, Result};

/// Load and validate the key-bind manifest. `None` path means the manifest is
/// not configured and the stage is skipped.
pub async fn load_key_binds(path: Option<&Path>) -> Result<Option<Vec<KeyBinding>>> {
    let Some(path) = path else { return Ok(None) };
    let root = read_manifest(path).await?;

    let records = parse_records::<KeyBinding>(&root, "keyBinds", false)?;
    for (i, record) in records.iter().enumerate() {
        record.validate(i)?;
    }
    tracing::debug!(path = %path.display(), count = records.len(), "key binds loaded");
    Ok(Some(records))
}

/// Load the source-sample manifest and pull in every referenced file's bytes.
/// A single unreadable sample file fails the whole manifest.
pub async fn load_sources(
    path: Option<&Path>,
    fallback_common: &Path,
) -> Result<Option<Vec<RawAsset<SourceSample>>>> {
    let Some(path) = path else { return Ok(None) };
    let root = read_manifest(path).await?;

    let common = common_path(&root, fallback_common)?;
    let mut records = parse_records::<SourceSample>(&root, "sourceFiles", true)?;
    for (i, record) in records.iter_mut().enumerate() {
        record.resolve(i, Path::new(&common))?;
    }
    let raw = read_referenced_files(records).await?;
    tracing::debug!(path = %path.display(), count = raw.len(), "sources loaded");
    Ok(Some(raw))
}

/// Same pipeline for the impulse-response manifest.
pub async fn load_impulse_responses(
    path: Option<&Path>,
    fallback_common: &Path,
) -> Result<Option<Vec<RawAsset<ImpulseResponse>>>> {
    let Some(path) = path else { return Ok(None) };
    let root = read_manifest(path).await?;

    let common = common_path(&root, fallback_common)?;
    let mut records = parse_records::<ImpulseResponse>(&root, "impulseResponses", true)?;
    for (i, record) in records.iter_mut().enumerate() {
        record.resolve(i, Path::new(&common))?;
    }
    let raw = read_referenced_files(records).await?;
    tracing::debug!(path = %path.display(), count = raw.len(), "impulse responses loaded");
    Ok(Some(raw))
}

async fn read_manifest(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path).await?;
    json5::from_str(&normalize_unicode_escapes(&text))
        .map_err(|e| EngineError::manifest(format!("parse failed: {e}")))
}

async fn read_referenced_files<R: crate::assets::AssetRecord>(
    records: Vec<R>,
) -> Result<Vec<RawAsset<R>>> {
    let mut raw = Vec::with_capacity(records.len());
    for record in records {
        let bytes = tokio::fs::read(record.file_name()).await?;
        raw.push(RawAsset { record, bytes });
    }
    Ok(raw)
}

/// Convert each element of the manifest's named records array.
///
/// The top level must be an object carrying the array (and `commonPath` when
/// the caller requires it). Element *i* failing to convert aborts with that
/// index and a dump of the raw record.
fn parse_records<R: DeserializeOwned>(
    root: &Value,
    array_key: &str,
    require_common: bool,
) -> Result<Vec<R>> {
    if require_common && !root.get("commonPath").map(Value::is_string).unwrap_or(false) {
        return Err(EngineError::manifest("missing commonPath"));
    }
    let items = root
        .get(array_key)
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::manifest(format!("missing {array_key} array")))?;

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let record: R = serde_json::from_value(item.clone())
            .map_err(|e| EngineError::record(i, format!("{e}: {item}")))?;
        records.push(record);
    }
    Ok(records)
}

fn common_path(root: &Value, fallback: &Path) -> Result<String> {
    let common = root
        .get("commonPath")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::manifest("missing commonPath"))?;
    if common.is_empty() {
        Ok(fallback.display().to_string())
    } else {
        Ok(common.to_string())
    }
}

/// Replace `\uXXXX` escape sequences in the raw manifest text with their
/// characters before parsing, so hand-escaped names compare equal to typed
/// ones.
fn normalize_unicode_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && text[i + 1..].starts_with('u') {
            let hex = &text[i + 2..];
            if let Some(digits) = hex.get(..4) {
                if let Ok(code) = u32::from_str_radix(digits, 16) {
                    if let Some(ch) = char::from_u32(code) {
                        out.push(ch);
                        // skip 'u' and the four hex digits
                        for _ in 0..5 {
                            chars.next();
                        }
                        continue;
                    }
                }
            }
        }
        out.push(c);
    }
    out
}
