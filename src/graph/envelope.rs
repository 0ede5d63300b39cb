use serde::{Deserialize, Serialize};

use crate::AMPLITUDE_FLOOR;

/*
Scheduled envelope
==================

Four gain ramps (attack, decay, sustain, release) scheduled over the fixed
note length. Each stage carries a time FRACTION of the note length and a
target amplitude; the stage boundaries are the cumulative sums of the
fractions times the length, so fractions summing to 1 fill the note exactly.

The gain starts pinned at AMPLITUDE_FLOOR rather than zero: an exponential
ramp toward or away from exact zero is undefined, so every target amplitude
is clamped to the same floor before interpolation. The exponential shape is
v0 * (v1 / v0)^u for u in [0, 1]; the linear shape is the obvious lerp.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampKind {
    Linear,
    Exponential,
}

impl Default for RampKind {
    fn default() -> Self {
        RampKind::Linear
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvelopeStage {
    /// Fraction of the note length this stage occupies.
    pub time_fraction: f32,
    /// Gain at the end of the stage.
    pub target_amplitude: f32,
}

impl EnvelopeStage {
    pub fn new(time_fraction: f32, target_amplitude: f32) -> Self {
        Self {
            time_fraction,
            target_amplitude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeSchedule {
    pub stages: [EnvelopeStage; 4],
    pub ramp: RampKind,
}

impl Default for EnvelopeSchedule {
    fn default() -> Self {
        Self {
            stages: [
                EnvelopeStage::new(0.2, 1.0),
                EnvelopeStage::new(0.3, 0.5),
                EnvelopeStage::new(0.3, 0.5),
                EnvelopeStage::new(0.2, 0.0),
            ],
            ramp: RampKind::Linear,
        }
    }
}

impl EnvelopeSchedule {
    /// Cumulative stage end times in seconds for a note of `note_length`
    /// seconds. Strictly increasing when every fraction is positive.
    pub fn stage_times(&self, note_length: f32) -> [f32; 4] {
        let mut times = [0.0; 4];
        let mut acc = 0.0;
        for (t, stage) in times.iter_mut().zip(&self.stages) {
            acc += note_length * stage.time_fraction;
            *t = acc;
        }
        times
    }

    /// Gain at `elapsed` seconds into a note of `note_length` seconds.
    pub fn amplitude_at(&self, elapsed: f32, note_length: f32) -> f32 {
        if elapsed <= 0.0 {
            return AMPLITUDE_FLOOR;
        }
        let times = self.stage_times(note_length);

        let mut start_time = 0.0;
        let mut start_amp = AMPLITUDE_FLOOR;
        for (end_time, stage) in times.iter().zip(&self.stages) {
            let end_amp = stage.target_amplitude.max(AMPLITUDE_FLOOR);
            if elapsed < *end_time {
                let u = (elapsed - start_time) / (end_time - start_time);
                return match self.ramp {
                    RampKind::Linear => start_amp + (end_amp - start_amp) * u,
                    RampKind::Exponential => start_amp * (end_amp / start_amp).powf(u),
                };
            }
            start_time = *end_time;
            start_amp = end_amp;
        }
        start_amp
    }
}
