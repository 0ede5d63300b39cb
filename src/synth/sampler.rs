use std::sync::Arc;

use crate::assets::AudioBuffer;
use crate::graph::node::RenderCtx;
use crate::graph::oscillator::cents_to_ratio;

/// One-shot playback of a decoded buffer.
///
/// The read head advances by `playback_rate * detune_ratio` source frames per
/// output frame (resampling between the source and output rates as it goes)
/// and samples with linear interpolation. Vibrato modulates the detune at
/// block rate. The voice ends when the buffer is exhausted; there is no loop
/// mode.
pub struct SampleVoice {
    buffer: Arc<AudioBuffer>,
    trigger_time: f64,
    position: f64,
    playback_rate: f32,
    detune_cents: f32,
    started: bool,
}

impl SampleVoice {
    pub fn new(
        buffer: Arc<AudioBuffer>,
        playback_rate: f32,
        detune_cents: f32,
        trigger_time: f64,
    ) -> Self {
        Self {
            buffer,
            trigger_time,
            position: 0.0,
            playback_rate,
            detune_cents,
            started: false,
        }
    }

    pub fn is_finished(&self, _now: f64) -> bool {
        self.started && self.position >= (self.buffer.frames().saturating_sub(1)) as f64
    }

    pub fn render_add(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let frames = self.buffer.frames();
        if frames < 2 {
            self.started = true;
            self.position = frames as f64;
            return;
        }

        let first = if self.trigger_time > ctx.time {
            ((self.trigger_time - ctx.time) * ctx.sample_rate as f64).ceil() as usize
        } else {
            0
        };
        if first >= out.len() {
            return;
        }
        self.started = true;

        let step = self.playback_rate as f64
            * cents_to_ratio(self.detune_cents + ctx.vibrato_cents) as f64
            * self.buffer.sample_rate as f64
            / ctx.sample_rate as f64;

        let data = &self.buffer.data;
        for sample in out[first..].iter_mut() {
            let idx = self.position as usize;
            if idx + 1 >= frames {
                self.position = frames as f64;
                break;
            }
            let frac = (self.position - idx as f64) as f32;
            *sample += data[idx] * (1.0 - frac) + data[idx + 1] * frac;
            self.position += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(data: Vec<f32>, sample_rate: u32) -> Arc<AudioBuffer> {
        Arc::new(AudioBuffer {
            name: "clip".into(),
            data,
            sample_rate,
            source_channels: 1,
        })
    }

    #[test]
    fn unity_rate_plays_back_verbatim() {
        let mut voice = SampleVoice::new(buffer(vec![0.1, 0.2, 0.3, 0.4, 0.5], 1_000), 1.0, 0.0, 0.0);
        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut block = vec![0.0; 8];
        voice.render_add(&mut block, &ctx);

        assert_eq!(&block[..4], &[0.1, 0.2, 0.3, 0.4]);
        assert!(voice.is_finished(0.0));
    }

    #[test]
    fn double_rate_interpolates_every_other_frame() {
        let mut voice = SampleVoice::new(buffer(vec![0.0, 1.0, 2.0, 3.0, 4.0], 1_000), 2.0, 0.0, 0.0);
        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut block = vec![0.0; 4];
        voice.render_add(&mut block, &ctx);

        assert_eq!(&block[..2], &[0.0, 2.0]);
    }

    #[test]
    fn waits_for_its_trigger_sample() {
        let mut voice = SampleVoice::new(buffer(vec![1.0; 16], 1_000), 1.0, 0.0, 0.004);
        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut block = vec![0.0; 8];
        voice.render_add(&mut block, &ctx);

        assert!(block[..4].iter().all(|s| *s == 0.0));
        assert!(block[4..].iter().all(|s| *s == 1.0));
        assert!(!voice.is_finished(0.0));
    }

    #[test]
    fn detune_up_shortens_playback() {
        let data = vec![1.0; 1_200];
        let mut flat = SampleVoice::new(buffer(data.clone(), 1_000), 1.0, 0.0, 0.0);
        let mut sharp = SampleVoice::new(buffer(data, 1_000), 1.0, 1_200.0, 0.0);
        let ctx = RenderCtx::new(1_000.0, 0.0);

        let mut block = vec![0.0; 1_000];
        flat.render_add(&mut block, &ctx);
        assert!(!flat.is_finished(0.0));

        block.fill(0.0);
        sharp.render_add(&mut block, &ctx);
        // an octave up reads twice as fast and runs out within the block
        assert!(sharp.is_finished(0.0));
    }
}
