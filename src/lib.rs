pub mod analysis;
pub mod assets;
pub mod autoplay;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io;
pub mod keybind;
pub mod synth; // Voice building and dispatch

pub use engine::{EngineConfig, EngineContext, Notification};
pub use error::{EngineError, Result};

/// Smallest amplitude the envelope scheduler will target. Exact zero is not a
/// legal exponential-ramp endpoint, so every schedule is pinned to this floor.
pub const AMPLITUDE_FLOOR: f32 = 1.0e-30;
