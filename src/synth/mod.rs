//! Voice construction and dispatch.
//!
//! A trigger builds one voice per matched binding: either a one-shot sample
//! playback (`sampler`) or an additive oscillator bank (`voice`) when no
//! sample applies. Voices are independently owned by the [`Dispatcher`], which
//! mixes them block by block, applies the modulation effectors and projects
//! the result to stereo.

pub mod dispatcher;
pub mod message;
pub mod note;
pub mod sampler;
pub mod voice;

pub use dispatcher::{Dispatcher, PlayedVoice};
#[cfg(feature = "rtrb")]
pub use message::{voice_lane, VoiceLane, VoiceMessage};
pub use note::parse_note;
pub use sampler::SampleVoice;
pub use voice::{Voice, VoiceParams};
