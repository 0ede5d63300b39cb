use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::assets::{apply_decoded, decode_batch, extract_archive};
use crate::autoplay::{AutoPlaySummary, AutoPlayer, Score};
use crate::config::loader::{load_impulse_responses, load_key_binds, load_sources};
use crate::config::records::{ImpulseResponse, KeyBinding, SourceSample};
use crate::error::EngineError;
use crate::graph::envelope::EnvelopeSchedule;
use crate::graph::lfo::EffectorSettings;
use crate::graph::oscillator::Waveform;
use crate::graph::panner::PanTargets;
use crate::keybind::{KeyBindIndex, KeyEvent};
use crate::synth::dispatcher::{Dispatcher, PlayedVoice};
use crate::synth::note::parse_note;
use crate::synth::sampler::SampleVoice;
use crate::synth::voice::{Voice, VoiceParams};

/// Seconds added to every trigger so the voice's first sample lands after the
/// control-side work is done.
pub const TRIGGER_LATENCY: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OscillatorConfig {
    pub waveform: Waveform,
    pub base_frequency: f32,
    pub note_length: f32,
    pub overtone_count: usize,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            base_frequency: 440.0,
            note_length: 1.0,
            overtone_count: 1,
        }
    }
}

/// Everything the host can tune. Empty path strings mean "use the bundled
/// default under `base_path/data/`".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub key_bind_config_file_path: String,
    pub source_config_file_path: String,
    pub impulse_response_config_file_path: String,
    pub use_source_file: bool,
    /// `-1` or out of range selects no reverb at all.
    pub impulse_response_index: i32,
    pub impulse_response_normalize: bool,
    pub detune_cents: f32,
    pub gain: f32,
    pub playback_rate: f32,
    pub oscillator: OscillatorConfig,
    pub envelope: EnvelopeSchedule,
    pub auto_play_interval_ms: u32,
    pub vibrato: EffectorSettings,
    pub tremolo: EffectorSettings,
    pub pan_mover: EffectorSettings,
    pub pan_targets: PanTargets,
    pub panner_position: [f32; 3],
    pub japanese_keyboard: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_bind_config_file_path: String::new(),
            source_config_file_path: String::new(),
            impulse_response_config_file_path: String::new(),
            use_source_file: true,
            impulse_response_index: -1,
            impulse_response_normalize: true,
            detune_cents: 0.0,
            gain: 1.0,
            playback_rate: 1.0,
            oscillator: OscillatorConfig::default(),
            envelope: EnvelopeSchedule::default(),
            auto_play_interval_ms: 150,
            vibrato: EffectorSettings::default(),
            tremolo: EffectorSettings::default(),
            pan_mover: EffectorSettings::default(),
            pan_targets: PanTargets::default(),
            panner_position: [0.0, 0.0, -1.0],
            japanese_keyboard: false,
        }
    }
}

/// Host-facing notifications, drained by the embedding UI. Mirrors what the
/// loaders and decoders report; errors land here too, once each.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    KeyBindDone { bindings: usize, samples: usize },
    DecodeDone { buffers: usize },
    ExtractDone { files: usize },
    AutoPlayStarted { playable: usize, seconds: f64 },
    Failure(String),
}

/*
Engine context
==============

The single owner of all engine state: configuration, the key-bind index, the
decoded sample and impulse-response sets, the dispatcher and the auto-player.
Nothing here is global; hosts construct one context per output stream.

Loading is async and stage-isolated. A manifest that fails to load or decode
is reported once and leaves its asset set as it was; the engine keeps running
with whatever loaded.
*/

pub struct EngineContext {
    config: EngineConfig,
    base_path: PathBuf,
    index: KeyBindIndex,
    samples: Vec<SourceSample>,
    impulse_responses: Vec<ImpulseResponse>,
    dispatcher: Dispatcher,
    auto_player: AutoPlayer,
    notifications: Vec<Notification>,
}

impl EngineContext {
    pub fn new(config: EngineConfig, base_path: impl Into<PathBuf>, sample_rate: f32) -> Self {
        let mut ctx = Self {
            config,
            base_path: base_path.into(),
            index: KeyBindIndex::default(),
            samples: Vec::new(),
            impulse_responses: Vec::new(),
            dispatcher: Dispatcher::new(sample_rate),
            auto_player: AutoPlayer::default(),
            notifications: Vec::new(),
        };
        ctx.apply_audio_config();
        ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap the configuration and push the audio-side settings through.
    /// Manifests are not reloaded; call the reload ops if paths changed.
    pub fn update_config(&mut self, config: EngineConfig) {
        self.config = config;
        self.apply_audio_config();
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn current_time(&self) -> f64 {
        self.dispatcher.current_time()
    }

    pub fn samples(&self) -> &[SourceSample] {
        &self.samples
    }

    pub fn impulse_responses(&self) -> &[ImpulseResponse] {
        &self.impulse_responses
    }

    pub fn key_bind_count(&self) -> usize {
        self.index.len()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Bring the whole context up: run the archive fallback for missing asset
    /// directories, then load all three manifests. Stage failures are
    /// reported and skipped.
    pub async fn activate(&mut self) {
        for (dir, archive) in [("ir", "ir.zip"), ("source", "source.zip")] {
            let target = self.data_path(dir);
            if target.is_dir() {
                continue;
            }
            match extract_archive(&self.data_path(archive), &self.data_path("")).await {
                Ok(files) => self.notifications.push(Notification::ExtractDone { files }),
                Err(e) => self.report(e),
            }
        }

        self.reload_impulse_responses().await;
        self.reload_sources().await;
        self.reload_key_binds().await;
    }

    pub async fn reload_key_binds(&mut self) {
        let path = self.key_bind_path();
        match load_key_binds(Some(&path)).await {
            Ok(Some(bindings)) => {
                self.index.rebuild(bindings);
                self.index.cross_link(&self.samples);
                self.notifications.push(Notification::KeyBindDone {
                    bindings: self.index.len(),
                    samples: self.samples.len(),
                });
            }
            Ok(None) => {}
            Err(e) => self.report(e),
        }
    }

    pub async fn reload_sources(&mut self) {
        let path = self.source_path();
        let raw = match load_sources(Some(&path), &self.data_path("source")).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => return self.report(e),
        };

        let decoded = decode_batch(&raw);
        let count = decoded.len();
        let mut records: Vec<SourceSample> = raw.into_iter().map(|r| r.record).collect();
        match apply_decoded(&mut records, decoded) {
            Ok(()) => self
                .notifications
                .push(Notification::DecodeDone { buffers: count }),
            Err(e) => self.report(e),
        }
        // records stay installed even without buffers; their names still
        // resolve as synthesis bindings
        self.samples = records;
        self.index.cross_link(&self.samples);
    }

    pub async fn reload_impulse_responses(&mut self) {
        let path = self.impulse_response_path();
        let raw = match load_impulse_responses(Some(&path), &self.data_path("ir")).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => return self.report(e),
        };

        let decoded = decode_batch(&raw);
        let count = decoded.len();
        let mut records: Vec<ImpulseResponse> = raw.into_iter().map(|r| r.record).collect();
        match apply_decoded(&mut records, decoded) {
            Ok(()) => self
                .notifications
                .push(Notification::DecodeDone { buffers: count }),
            Err(e) => self.report(e),
        }
        self.impulse_responses = records;
        self.apply_impulse_response();
    }

    /// Sound every binding matching the event, each as its own voice.
    pub fn trigger(&mut self, event: &KeyEvent) {
        let time = self.dispatcher.current_time() + TRIGGER_LATENCY;
        let chord: Vec<KeyBinding> = self.index.lookup(event).to_vec();
        for binding in &chord {
            self.play(binding, time);
        }
    }

    /// Scan the text and schedule it against the dispatcher clock.
    pub fn start_auto_play(&mut self, text: &str) -> AutoPlaySummary {
        let score = Score::scan(text);
        let interval = self.config.auto_play_interval_ms as f64 / 1000.0;
        let now = self.dispatcher.current_time();

        let index = &self.index;
        let summary = self.auto_player.start(
            &score,
            interval,
            now,
            self.config.japanese_keyboard,
            |code, shift| {
                index
                    .bindings()
                    .iter()
                    .find(|b| b.key_code == code && b.shift_key == shift)
                    .cloned()
            },
        );
        self.notifications.push(Notification::AutoPlayStarted {
            playable: summary.playable,
            seconds: summary.total_seconds,
        });
        summary
    }

    pub fn stop_auto_play(&mut self) {
        self.auto_player.cancel();
    }

    pub fn auto_play_idle(&self) -> bool {
        self.auto_player.is_idle()
    }

    /// Dispatch every auto-play chord that has come due. Call this from the
    /// control loop; the cadence only needs to beat the auto-play interval.
    pub fn tick(&mut self) {
        let now = self.dispatcher.current_time();
        let due = self.auto_player.poll(now);
        for chord in due {
            for binding in &chord {
                self.play(binding, now + TRIGGER_LATENCY);
            }
        }
    }

    fn play(&mut self, binding: &KeyBinding, time: f64) {
        if self.config.use_source_file {
            if let Some(buffer) = &binding.buffer {
                self.dispatcher.spawn(PlayedVoice::Sample(SampleVoice::new(
                    buffer.clone(),
                    self.config.playback_rate,
                    self.config.detune_cents,
                    time,
                )));
                return;
            }
        }
        let Some(cents) = parse_note(&binding.name) else {
            return;
        };
        let osc = &self.config.oscillator;
        self.dispatcher.spawn(PlayedVoice::Synth(Voice::new(VoiceParams {
            waveform: osc.waveform,
            base_frequency: osc.base_frequency,
            overtone_count: osc.overtone_count,
            cents: cents as f32 + self.config.detune_cents,
            note_length: osc.note_length,
            envelope: self.config.envelope.clone(),
            trigger_time: time,
        })));
    }

    fn apply_audio_config(&mut self) {
        self.dispatcher.set_master_gain(self.config.gain);
        self.dispatcher.set_vibrato(&self.config.vibrato);
        self.dispatcher.set_tremolo(&self.config.tremolo);
        self.dispatcher
            .set_pan_mover(&self.config.pan_mover, self.config.pan_targets);
        self.dispatcher
            .set_panner_position(self.config.panner_position);
        self.apply_impulse_response();
    }

    fn apply_impulse_response(&mut self) {
        let selected = usize::try_from(self.config.impulse_response_index)
            .ok()
            .and_then(|i| self.impulse_responses.get(i))
            .and_then(|record| record.buffer.as_deref());
        self.dispatcher
            .set_impulse_response(selected, self.config.impulse_response_normalize);
    }

    fn report(&mut self, err: EngineError) {
        tracing::error!(error = %err, "engine stage failed");
        self.notifications.push(Notification::Failure(err.to_string()));
    }

    fn data_path(&self, leaf: &str) -> PathBuf {
        let data = self.base_path.join("data");
        if leaf.is_empty() {
            data
        } else {
            data.join(leaf)
        }
    }

    fn key_bind_path(&self) -> PathBuf {
        if !self.config.key_bind_config_file_path.is_empty() {
            return PathBuf::from(&self.config.key_bind_config_file_path);
        }
        if self.config.japanese_keyboard {
            self.data_path("keybind-japanese01.json5")
        } else {
            self.data_path("keybind01.json5")
        }
    }

    fn source_path(&self) -> PathBuf {
        if self.config.source_config_file_path.is_empty() {
            self.data_path("sources.json5")
        } else {
            PathBuf::from(&self.config.source_config_file_path)
        }
    }

    fn impulse_response_path(&self) -> PathBuf {
        if self.config.impulse_response_config_file_path.is_empty() {
            self.data_path("impulse-response.json5")
        } else {
            PathBuf::from(&self.config.impulse_response_config_file_path)
        }
    }
}
