use serde::{Deserialize, Serialize};

use crate::graph::oscillator::{Oscillator, Waveform};

/// Free-running low-frequency oscillator. Phase persists across blocks so the
/// modulation is continuous regardless of when voices come and go.
#[derive(Debug, Clone)]
pub struct Lfo {
    osc: Oscillator,
}

impl Lfo {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            osc: Oscillator::new(waveform, frequency),
        }
    }

    /// Advance one block and return the value at the block midpoint. For a
    /// render block much shorter than the LFO period this is the block
    /// average to first order.
    pub fn block_value(&mut self, sample_rate: f32, block_len: usize) -> f32 {
        let half = (block_len / 2).max(1);
        let mut value = 0.0;
        for i in 0..block_len {
            let v = self.osc.next_sample(sample_rate, 1.0);
            if i == half {
                value = v;
            }
        }
        value
    }
}

/// Settings shared by the three modulation effectors (vibrato, tremolo,
/// pan-mover). `gain == 0.0` disables the effector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectorSettings {
    pub frequency: f32,
    pub gain: f32,
    #[serde(default)]
    pub waveform: Waveform,
}

impl Default for EffectorSettings {
    fn default() -> Self {
        Self {
            frequency: 20.0,
            gain: 0.0,
            waveform: Waveform::Sine,
        }
    }
}

/// An LFO feeding a gain stage: one control value per render block. What the
/// value modulates (detune cents, master gain offset, pan offsets) is up to
/// the dispatcher.
#[derive(Debug, Clone)]
pub struct Effector {
    lfo: Lfo,
    gain: f32,
}

impl Effector {
    pub fn new(settings: &EffectorSettings) -> Self {
        Self {
            lfo: Lfo::new(settings.waveform, settings.frequency),
            gain: settings.gain,
        }
    }

    pub fn is_active(&self) -> bool {
        self.gain != 0.0
    }

    pub fn control_value(&mut self, sample_rate: f32, block_len: usize) -> f32 {
        if !self.is_active() {
            return 0.0;
        }
        self.lfo.block_value(sample_rate, block_len) * self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_gain_effector_is_inert() {
        let mut effector = Effector::new(&EffectorSettings::default());
        assert!(!effector.is_active());
        assert_eq!(effector.control_value(48_000.0, 128), 0.0);
    }

    #[test]
    fn control_value_stays_within_gain_bounds() {
        let settings = EffectorSettings {
            frequency: 5.0,
            gain: 30.0,
            waveform: Waveform::Sine,
        };
        let mut effector = Effector::new(&settings);
        for _ in 0..100 {
            let v = effector.control_value(48_000.0, 128);
            assert!(v.abs() <= 30.0 + 1e-6);
        }
    }

    #[test]
    fn lfo_phase_persists_across_blocks() {
        let mut lfo = Lfo::new(Waveform::Sawtooth, 1.0);
        let first = lfo.block_value(1_000.0, 100);
        let later = lfo.block_value(1_000.0, 100);
        // a 1 Hz saw over 1000 Hz blocks of 100 samples keeps climbing
        assert!(later > first);
    }
}
