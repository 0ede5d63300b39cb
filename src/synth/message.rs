#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

#[cfg(feature = "rtrb")]
use crate::synth::dispatcher::PlayedVoice;

/// Control-thread messages for an audio-thread-owned dispatcher.
#[cfg(feature = "rtrb")]
pub enum VoiceMessage {
    Spawn(Box<PlayedVoice>),
}

/// Producer half of the voice queue. Lossy by design: when the queue is full
/// the trigger is dropped rather than blocking the control thread.
#[cfg(feature = "rtrb")]
pub struct VoiceLane {
    tx: Producer<VoiceMessage>,
}

#[cfg(feature = "rtrb")]
impl VoiceLane {
    pub fn spawn(&mut self, voice: PlayedVoice) -> bool {
        self.tx.push(VoiceMessage::Spawn(Box::new(voice))).is_ok()
    }
}

/// Build a voice queue of the given capacity. The consumer half goes to the
/// dispatcher via [`Dispatcher::attach_lane`](crate::synth::Dispatcher::attach_lane).
#[cfg(feature = "rtrb")]
pub fn voice_lane(capacity: usize) -> (VoiceLane, Consumer<VoiceMessage>) {
    let (tx, rx) = RingBuffer::new(capacity);
    (VoiceLane { tx }, rx)
}
