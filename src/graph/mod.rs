//! Block-rendering audio primitives.
//!
//! Everything here works on mono `&mut [f32]` blocks; the signal stays mono
//! until the panner projects it to interleaved stereo at the edge of the
//! dispatcher. Nodes hold their own state (phase, delay lines) and get a
//! [`node::RenderCtx`] describing the block being rendered.

pub mod convolver;
pub mod envelope;
pub mod lfo;
pub mod node;
pub mod oscillator;
pub mod panner;

pub use convolver::Convolver;
pub use envelope::{EnvelopeSchedule, EnvelopeStage, RampKind};
pub use lfo::{Effector, EffectorSettings, Lfo};
pub use node::RenderCtx;
pub use oscillator::{cents_to_ratio, Oscillator, Waveform};
pub use panner::{PanTargets, Panner};
