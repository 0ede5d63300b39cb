use thiserror::Error;

/// Engine-wide error taxonomy.
///
/// Loader, decoder and extractor failures are reported once through the
/// engine's notification sink and never halt the running engine; the affected
/// manifest or asset set simply stays empty or partially populated.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema or type violation in a manifest. `index` is the offending record
    /// when the failure is per-record; `detail` carries a dump of the record as
    /// far as it was copied.
    #[error("config error{}: {detail}", index.map(|i| format!(" at record {i}")).unwrap_or_default())]
    Config { index: Option<usize>, detail: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("audio device error: {0}")]
    Device(String),
}

impl EngineError {
    pub(crate) fn manifest(detail: impl Into<String>) -> Self {
        EngineError::Config {
            index: None,
            detail: detail.into(),
        }
    }

    pub(crate) fn record(index: usize, detail: impl Into<String>) -> Self {
        EngineError::Config {
            index: Some(index),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
