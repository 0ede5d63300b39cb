//! Asset plumbing: one-shot archive extraction for the bundled data directory
//! and the raw-bytes → playable-buffer decode stage.

pub mod archive;
pub mod decode;

pub use archive::extract_archive;
pub use decode::{apply_decoded, decode, decode_batch, AssetRecord, AudioBuffer, RawAsset};
