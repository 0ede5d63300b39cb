use crate::graph::envelope::EnvelopeSchedule;
use crate::graph::node::RenderCtx;
use crate::graph::oscillator::{cents_to_ratio, Oscillator, Waveform};

/*
Additive voice
==============

One triggered note, built as a bank of oscillator partials sharing a single
scheduled envelope. Partial i sits 1200 * log2(i + 1) cents above the note,
i.e. at integer multiples of the note frequency, which is additive synthesis
phrased in cents. Every partial gets the flat weight 1/N.

The voice is strictly windowed: it sounds exactly on
[trigger_time, trigger_time + note_length) and the end of that window is the
only teardown path. There is no note-off.
*/

#[derive(Debug, Clone)]
pub struct VoiceParams {
    pub waveform: Waveform,
    pub base_frequency: f32,
    pub overtone_count: usize,
    /// Note pitch plus the configured detune, in cents.
    pub cents: f32,
    pub note_length: f32,
    pub envelope: EnvelopeSchedule,
    pub trigger_time: f64,
}

pub struct Voice {
    partials: Vec<Partial>,
    weight: f32,
    envelope: EnvelopeSchedule,
    note_length: f32,
    trigger_time: f64,
}

struct Partial {
    osc: Oscillator,
    cents: f32,
}

impl Voice {
    pub fn new(params: VoiceParams) -> Self {
        let count = params.overtone_count.max(1);
        let partials = (0..count)
            .map(|i| Partial {
                osc: Oscillator::new(params.waveform, params.base_frequency),
                cents: params.cents + 1200.0 * ((i + 1) as f32).log2(),
            })
            .collect();

        Self {
            partials,
            weight: 1.0 / count as f32,
            envelope: params.envelope,
            note_length: params.note_length,
            trigger_time: params.trigger_time,
        }
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now >= self.trigger_time + self.note_length as f64
    }

    /// Add this voice's contribution to a mono block starting at `ctx.time`.
    /// Only the samples inside the note window are touched, so a trigger that
    /// lands mid-block starts exactly on its scheduled sample.
    pub fn render_add(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let dt = 1.0 / ctx.sample_rate as f64;
        let end_time = self.trigger_time + self.note_length as f64;

        let first = if self.trigger_time > ctx.time {
            ((self.trigger_time - ctx.time) * ctx.sample_rate as f64).ceil() as usize
        } else {
            0
        };
        let last = (((end_time - ctx.time) * ctx.sample_rate as f64).ceil() as usize).min(out.len());
        if first >= last {
            return;
        }

        // vibrato is folded in at block rate
        let ratios: Vec<f32> = self
            .partials
            .iter()
            .map(|p| cents_to_ratio(p.cents + ctx.vibrato_cents))
            .collect();

        for i in first..last {
            let elapsed = (ctx.time + i as f64 * dt - self.trigger_time) as f32;
            let env = self.envelope.amplitude_at(elapsed, self.note_length);

            let mut sum = 0.0;
            for (partial, ratio) in self.partials.iter_mut().zip(&ratios) {
                sum += partial.osc.next_sample(ctx.sample_rate, *ratio);
            }
            out[i] += sum * self.weight * env;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(trigger_time: f64) -> VoiceParams {
        VoiceParams {
            waveform: Waveform::Sine,
            base_frequency: 440.0,
            overtone_count: 4,
            cents: 0.0,
            note_length: 1.0,
            envelope: EnvelopeSchedule::default(),
            trigger_time,
        }
    }

    #[test]
    fn silent_before_the_trigger_sample() {
        let mut voice = Voice::new(params(0.5));
        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut block = vec![0.0; 256];
        voice.render_add(&mut block, &ctx);
        assert!(block.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn sounds_inside_the_window_only() {
        let mut voice = Voice::new(params(0.1));
        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut block = vec![0.0; 1_000];
        voice.render_add(&mut block, &ctx);

        assert!(block[..100].iter().all(|s| *s == 0.0));
        assert!(block[150..900].iter().any(|s| s.abs() > 1e-6));
    }

    #[test]
    fn finishes_at_the_window_end() {
        let voice = Voice::new(params(0.25));
        assert!(!voice.is_finished(0.0));
        assert!(!voice.is_finished(1.24));
        assert!(voice.is_finished(1.25));
        assert!(voice.is_finished(2.0));
    }

    #[test]
    fn peak_level_is_bounded_by_the_envelope() {
        let mut voice = Voice::new(params(0.0));
        let ctx = RenderCtx::new(48_000.0, 0.0);
        let mut block = vec![0.0; 2_048];
        voice.render_add(&mut block, &ctx);
        // 4 partials at 1/4 each under an envelope peaking at 1.0
        assert!(block.iter().all(|s| s.abs() <= 1.0 + 1e-6));
    }
}
