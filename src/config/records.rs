use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::{AssetRecord, AudioBuffer};
use crate::error::{EngineError, Result};

/// One key-to-sound binding.
///
/// `key_code == -1` marks an inert binding that is kept in the record list (so
/// round-trips preserve it) but excluded from the live lookup index. `name`
/// doubles as the cross-link key into the sample list and, failing that, as a
/// note name for the synthesis fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBinding {
    #[serde(default = "inert_key_code")]
    pub key_code: i32,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub name: String,
    #[serde(skip)]
    pub buffer: Option<Arc<AudioBuffer>>,
}

fn inert_key_code() -> i32 {
    -1
}

/// A sample file entry from the source manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSample {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file_name: PathBuf,
    #[serde(skip)]
    pub buffer: Option<Arc<AudioBuffer>>,
}

/// An impulse response entry from the reverb manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpulseResponse {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_name: PathBuf,
    #[serde(skip)]
    pub buffer: Option<Arc<AudioBuffer>>,
}

impl KeyBinding {
    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        if self.name.is_empty() {
            return Err(EngineError::record(index, format!("empty name: {self:?}")));
        }
        if self.key_code < -1 {
            return Err(EngineError::record(
                index,
                format!("key code out of range: {self:?}"),
            ));
        }
        Ok(())
    }
}

impl SourceSample {
    /// Validate and resolve one record in place: empty `name` falls back to the
    /// file base name, `file_name` is rewritten under `common_path`.
    pub(crate) fn resolve(&mut self, index: usize, common_path: &Path) -> Result<()> {
        if self.file_name.as_os_str().is_empty() {
            return Err(EngineError::record(
                index,
                format!("empty file name: {self:?}"),
            ));
        }
        if self.name.is_empty() {
            self.name = self.file_name.display().to_string();
        }
        self.file_name = common_path.join(&self.file_name);
        Ok(())
    }
}

impl ImpulseResponse {
    pub(crate) fn resolve(&mut self, index: usize, common_path: &Path) -> Result<()> {
        if self.file_name.as_os_str().is_empty() {
            return Err(EngineError::record(
                index,
                format!("empty file name: {self:?}"),
            ));
        }
        self.file_name = common_path.join(&self.file_name);
        Ok(())
    }
}

impl AssetRecord for KeyBinding {
    fn file_name(&self) -> &Path {
        Path::new(&self.name)
    }
    fn attach_buffer(&mut self, buffer: Arc<AudioBuffer>) {
        self.buffer = Some(buffer);
    }
}

impl AssetRecord for SourceSample {
    fn file_name(&self) -> &Path {
        &self.file_name
    }
    fn attach_buffer(&mut self, buffer: Arc<AudioBuffer>) {
        self.buffer = Some(buffer);
    }
}

impl AssetRecord for ImpulseResponse {
    fn file_name(&self) -> &Path {
        &self.file_name
    }
    fn attach_buffer(&mut self, buffer: Arc<AudioBuffer>) {
        self.buffer = Some(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_binding_requires_name() {
        let binding = KeyBinding {
            key_code: 65,
            shift_key: false,
            ctrl_key: false,
            alt_key: false,
            name: String::new(),
            buffer: None,
        };
        let err = binding.validate(3).unwrap_err();
        assert!(matches!(err, EngineError::Config { index: Some(3), .. }));
    }

    #[test]
    fn sample_name_defaults_to_file_name() {
        let mut sample = SourceSample {
            name: String::new(),
            file_name: PathBuf::from("piano_c4.wav"),
            buffer: None,
        };
        sample.resolve(0, Path::new("/assets/source")).unwrap();
        assert_eq!(sample.name, "piano_c4.wav");
        assert_eq!(sample.file_name, PathBuf::from("/assets/source/piano_c4.wav"));
    }

    #[test]
    fn sample_empty_file_name_is_rejected() {
        let mut sample = SourceSample {
            name: "ghost".into(),
            file_name: PathBuf::new(),
            buffer: None,
        };
        let err = sample.resolve(1, Path::new("/assets")).unwrap_err();
        assert!(matches!(err, EngineError::Config { index: Some(1), .. }));
    }
}
