use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::assets::AudioBuffer;
use crate::graph::convolver::Convolver;
use crate::graph::lfo::{Effector, EffectorSettings};
use crate::graph::node::RenderCtx;
use crate::graph::panner::{PanTargets, Panner};
use crate::synth::sampler::SampleVoice;
use crate::synth::voice::Voice;

#[cfg(feature = "rtrb")]
use crate::synth::message::VoiceMessage;

/// Frames per internal render pass. The convolver partitions its impulse
/// response at this size, so the output callback can ask for any buffer
/// length while the convolution state stays consistent.
pub const RENDER_QUANTUM: usize = 128;

/// A triggered sound owned by the dispatcher until it ends on its own.
pub enum PlayedVoice {
    Synth(Voice),
    Sample(SampleVoice),
}

impl PlayedVoice {
    fn render_add(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self {
            PlayedVoice::Synth(v) => v.render_add(out, ctx),
            PlayedVoice::Sample(v) => v.render_add(out, ctx),
        }
    }

    fn is_finished(&self, now: f64) -> bool {
        match self {
            PlayedVoice::Synth(v) => v.is_finished(now),
            PlayedVoice::Sample(v) => v.is_finished(now),
        }
    }
}

struct Routed {
    voice: PlayedVoice,
    reverb: bool,
}

/*
Dispatcher
==========

Owns everything that sounds: the active voices, the master gain, the three
modulation effectors, the convolution reverb and the panner. Each render pass:

  voices ──> dry bus ─────────────────┐
  voices ──> reverb bus ─> convolver ─┴─> gain (+ tremolo) ─> panner ─> stereo

A voice is routed to the reverb bus at spawn time when an impulse response is
installed, mirroring the connect-to-convolver-or-gain decision at source
creation. Voices retire themselves; the dispatcher just drops the finished
ones after each pass.
*/

pub struct Dispatcher {
    sample_rate: f32,
    frames_rendered: u64,
    voices: Vec<Routed>,
    master_gain: f32,
    vibrato: Effector,
    tremolo: Effector,
    pan_mover: Effector,
    pan_targets: PanTargets,
    panner: Panner,
    convolver: Convolver,
    dry_bus: Vec<f32>,
    reverb_bus: Vec<f32>,
    reverb_out: Vec<f32>,
    mono: Vec<f32>,
    pending: VecDeque<f32>,
    #[cfg(feature = "rtrb")]
    rx: Option<Consumer<VoiceMessage>>,
}

impl Dispatcher {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames_rendered: 0,
            voices: Vec::new(),
            master_gain: 1.0,
            vibrato: Effector::new(&EffectorSettings::default()),
            tremolo: Effector::new(&EffectorSettings::default()),
            pan_mover: Effector::new(&EffectorSettings::default()),
            pan_targets: PanTargets::default(),
            panner: Panner::default(),
            convolver: Convolver::new(RENDER_QUANTUM),
            dry_bus: vec![0.0; RENDER_QUANTUM],
            reverb_bus: vec![0.0; RENDER_QUANTUM],
            reverb_out: vec![0.0; RENDER_QUANTUM],
            mono: vec![0.0; RENDER_QUANTUM],
            pending: VecDeque::new(),
            #[cfg(feature = "rtrb")]
            rx: None,
        }
    }

    /// Seconds of audio rendered so far. Triggers schedule against this clock.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain;
    }

    pub fn set_vibrato(&mut self, settings: &EffectorSettings) {
        self.vibrato = Effector::new(settings);
    }

    pub fn set_tremolo(&mut self, settings: &EffectorSettings) {
        self.tremolo = Effector::new(settings);
    }

    pub fn set_pan_mover(&mut self, settings: &EffectorSettings, targets: PanTargets) {
        self.pan_mover = Effector::new(settings);
        self.pan_targets = targets;
    }

    pub fn set_panner_position(&mut self, position: [f32; 3]) {
        self.panner.set_base_position(position);
    }

    pub fn set_impulse_response(&mut self, ir: Option<&AudioBuffer>, normalize: bool) {
        self.convolver.set_impulse_response(ir, normalize);
    }

    #[cfg(feature = "rtrb")]
    pub fn attach_lane(&mut self, rx: Consumer<VoiceMessage>) {
        self.rx = Some(rx);
    }

    /// Take ownership of a voice. Routed through the reverb when an impulse
    /// response is installed at this moment, dry otherwise.
    pub fn spawn(&mut self, voice: PlayedVoice) {
        let reverb = self.convolver.has_impulse_response();
        self.voices.push(Routed { voice, reverb });
    }

    /// Render interleaved stereo. Any length is fine; internally the mix is
    /// produced in [`RENDER_QUANTUM`] chunks and carried over.
    pub fn render_block(&mut self, out: &mut [f32]) {
        #[cfg(feature = "rtrb")]
        self.drain_messages();

        for sample in out.iter_mut() {
            if self.pending.is_empty() {
                self.render_quantum();
            }
            *sample = self.pending.pop_front().unwrap_or(0.0);
        }
    }

    #[cfg(feature = "rtrb")]
    fn drain_messages(&mut self) {
        let Some(rx) = self.rx.as_mut() else { return };
        let mut spawned = Vec::new();
        while let Ok(msg) = rx.pop() {
            match msg {
                VoiceMessage::Spawn(voice) => spawned.push(*voice),
            }
        }
        for voice in spawned {
            self.spawn(voice);
        }
    }

    fn render_quantum(&mut self) {
        let time = self.current_time();
        let vibrato_cents = self.vibrato.control_value(self.sample_rate, RENDER_QUANTUM);
        let ctx = RenderCtx::new(self.sample_rate, time).with_vibrato(vibrato_cents);

        self.dry_bus.fill(0.0);
        self.reverb_bus.fill(0.0);
        for routed in &mut self.voices {
            let bus = if routed.reverb {
                &mut self.reverb_bus
            } else {
                &mut self.dry_bus
            };
            routed.voice.render_add(bus, &ctx);
        }
        self.convolver
            .process_block(&self.reverb_bus, &mut self.reverb_out);

        let gain = self.master_gain + self.tremolo.control_value(self.sample_rate, RENDER_QUANTUM);
        for ((m, d), r) in self.mono.iter_mut().zip(&self.dry_bus).zip(&self.reverb_out) {
            *m = (d + r) * gain;
        }

        if self.pan_mover.is_active() {
            let offset = self.pan_mover.control_value(self.sample_rate, RENDER_QUANTUM);
            self.panner.set_offsets(offset, self.pan_targets);
        }
        let (left, right) = self.panner.stereo_gains();
        for m in &self.mono {
            self.pending.push_back(m * left);
            self.pending.push_back(m * right);
        }

        self.frames_rendered += RENDER_QUANTUM as u64;
        let end = self.current_time();
        self.voices.retain(|r| !r.voice.is_finished(end));
    }
}
