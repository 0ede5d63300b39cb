//! Manifest layer: typed records, the relaxed-dialect loader pipeline and the
//! write-back helpers.
//!
//! Manifests are JSON5 (comments, unquoted keys, trailing commas) so hand-edited
//! files stay pleasant to maintain. Records validate individually; the first bad
//! record aborts its whole manifest with the record index and a dump of the
//! fields copied so far.

pub mod loader;
pub mod records;
pub mod writer;

pub use loader::{load_impulse_responses, load_key_binds, load_sources};
pub use records::{ImpulseResponse, KeyBinding, SourceSample};
pub use writer::{write_analysis, write_binary, write_config};
