use serde::{Deserialize, Serialize};

/*
Oscillator
==========

The raw tone source. A phase accumulator in [0, 1) advances by
frequency / sample_rate per sample and the waveform shapes it:

Sine: fundamental only, smooth and hollow.
Square: odd harmonics falling off as 1/n, hollow but punchy.
Sawtooth: all harmonics falling off as 1/n, bright and buzzy.
Triangle: odd harmonics falling off as 1/n², soft and mellow.

Voices stack several of these as overtone partials (see synth::voice), so the
oscillator itself stays dumb: one waveform, one frequency, its own phase.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Default for Waveform {
    fn default() -> Self {
        Waveform::Sine
    }
}

impl Waveform {
    /// Sample the waveform at a phase in [0, 1).
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (std::f32::consts::TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }
}

/// Pitch offset in cents to a frequency ratio. 1200 cents = one octave.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f32,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    /// Produce the next sample at an effective frequency of
    /// `self.frequency * ratio` (detune and vibrato arrive as a ratio).
    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32, ratio: f32) -> f32 {
        let value = self.waveform.sample(self.phase);
        self.phase += self.frequency * ratio / sample_rate;
        self.phase -= self.phase.floor();
        value
    }
}
