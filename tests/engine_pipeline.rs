//! End-to-end pipeline: manifests + audio files on disk, archive fallback,
//! decode, key binding, triggering and auto-play against a rendering
//! dispatcher.

use std::io::{Cursor, Write};
use std::path::Path;

use keytone::config::{load_sources, write_config};
use keytone::keybind::KeyEvent;
use keytone::{EngineConfig, EngineContext, Notification};

fn write_wav(path: &Path, frames: usize, frequency: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let v = (std::f32::consts::TAU * frequency * i as f32 / 48_000.0).sin();
        writer.write_sample((v * i16::MAX as f32 * 0.5) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn wav_bytes(frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let v = if i == 0 { 0.8 } else { 0.4 / (i as f32) };
            writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Lay out a complete data directory: sample files, manifests, and the
/// impulse responses packed as an archive so activation has to extract it.
fn setup_base() -> tempfile::TempDir {
    let base = tempfile::tempdir().unwrap();
    let data = base.path().join("data");
    let source_dir = data.join("source");
    std::fs::create_dir_all(&source_dir).unwrap();

    write_wav(&source_dir.join("low.wav"), 4_800, 220.0);
    write_wav(&source_dir.join("high.wav"), 4_800, 880.0);

    let mut zip_cursor = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut zip_cursor);
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory("ir", options).unwrap();
        zip.start_file("ir/room.wav", options).unwrap();
        zip.write_all(&wav_bytes(512)).unwrap();
        zip.finish().unwrap();
    }
    std::fs::write(data.join("ir.zip"), zip_cursor.into_inner()).unwrap();

    std::fs::write(
        data.join("keybind01.json5"),
        r#"{
            keyBinds: [
                // bound to a sample by name
                { keyCode: 65, shiftKey: false, ctrlKey: false, altKey: false, name: "low" },
                { keyCode: 65, shiftKey: false, ctrlKey: false, altKey: false, name: "high" },
                // no sample: falls back to additive synthesis
                { keyCode: 66, shiftKey: false, ctrlKey: false, altKey: false, name: "C4" },
                { keyCode: -1, shiftKey: false, ctrlKey: false, altKey: false, name: "parked" },
            ],
        }"#,
    )
    .unwrap();
    std::fs::write(
        data.join("sources.json5"),
        r#"{
            commonPath: "",
            sourceFiles: [
                { name: "low", fileName: "low.wav" },
                { name: "high", fileName: "high.wav" },
            ],
        }"#,
    )
    .unwrap();
    std::fs::write(
        data.join("impulse-response.json5"),
        r#"{
            commonPath: "",
            impulseResponses: [
                { description: "small room", fileName: "room.wav" },
            ],
        }"#,
    )
    .unwrap();

    base
}

fn event(key_code: i32) -> KeyEvent {
    KeyEvent {
        key_code,
        alt_key: false,
        ctrl_key: false,
        shift_key: false,
    }
}

fn render_seconds(ctx: &mut EngineContext, seconds: f64) -> Vec<f32> {
    let frames = (seconds * 48_000.0) as usize;
    let mut out = vec![0.0f32; frames * 2];
    ctx.dispatcher_mut().render_block(&mut out);
    out
}

#[tokio::test]
async fn activation_extracts_loads_and_links() {
    let base = setup_base();
    let mut ctx = EngineContext::new(EngineConfig::default(), base.path(), 48_000.0);
    ctx.activate().await;

    let notes = ctx.take_notifications();
    assert!(
        notes.iter().all(|n| !matches!(n, Notification::Failure(_))),
        "unexpected failures: {notes:?}"
    );
    assert!(notes
        .iter()
        .any(|n| matches!(n, Notification::ExtractDone { files: 1 })));
    assert!(notes
        .iter()
        .any(|n| matches!(n, Notification::KeyBindDone { bindings: 3, samples: 2 })));

    assert!(base.path().join("data/ir/room.wav").is_file());
    assert_eq!(ctx.samples().len(), 2);
    assert_eq!(ctx.impulse_responses().len(), 1);
    assert!(ctx.samples().iter().all(|s| s.buffer.is_some()));
}

#[tokio::test]
async fn chord_trigger_renders_both_samples() {
    let base = setup_base();
    let mut ctx = EngineContext::new(EngineConfig::default(), base.path(), 48_000.0);
    ctx.activate().await;

    ctx.trigger(&event(65));
    assert_eq!(ctx.dispatcher_mut().active_voices(), 2);

    let out = render_seconds(&mut ctx, 0.2);
    assert!(out.iter().any(|s| s.abs() > 1e-4));
}

#[tokio::test]
async fn synthesis_fallback_when_no_sample_matches() {
    let base = setup_base();
    let mut ctx = EngineContext::new(EngineConfig::default(), base.path(), 48_000.0);
    ctx.activate().await;

    ctx.trigger(&event(66));
    assert_eq!(ctx.dispatcher_mut().active_voices(), 1);
    let out = render_seconds(&mut ctx, 0.2);
    assert!(out.iter().any(|s| s.abs() > 1e-4));

    // the synth voice retires at the end of its 1s window
    render_seconds(&mut ctx, 1.0);
    assert_eq!(ctx.dispatcher_mut().active_voices(), 0);
}

#[tokio::test]
async fn reverb_selection_survives_reconfiguration() {
    let base = setup_base();
    let mut ctx = EngineContext::new(EngineConfig::default(), base.path(), 48_000.0);
    ctx.activate().await;

    let mut config = ctx.config().clone();
    config.impulse_response_index = 0;
    ctx.update_config(config);

    ctx.trigger(&event(65));
    let wet = render_seconds(&mut ctx, 0.3);
    assert!(wet.iter().any(|s| s.abs() > 1e-4));

    // out-of-range index goes back to dry without erroring
    let mut config = ctx.config().clone();
    config.impulse_response_index = 99;
    ctx.update_config(config);
    ctx.trigger(&event(65));
    let dry = render_seconds(&mut ctx, 0.3);
    assert!(dry.iter().any(|s| s.abs() > 1e-4));
}

#[tokio::test]
async fn auto_play_dispatches_over_the_sample_clock() {
    let base = setup_base();
    let mut ctx = EngineContext::new(EngineConfig::default(), base.path(), 48_000.0);
    ctx.activate().await;

    // "a" twice with a blank-line rest between them
    let summary = ctx.start_auto_play("a\n\na");
    assert_eq!(summary.playable, 2);
    assert!((summary.total_seconds - 0.45).abs() < 1e-9);

    let mut sounded = 0;
    while !ctx.auto_play_idle() {
        ctx.tick();
        sounded = sounded.max(ctx.dispatcher_mut().active_voices());
        render_seconds(&mut ctx, 0.05);
    }
    ctx.tick();
    assert!(sounded >= 1);

    ctx.stop_auto_play();
    assert!(ctx.auto_play_idle());
}

#[tokio::test]
async fn written_manifest_round_trips_through_the_loader() {
    let base = setup_base();
    let data = base.path().join("data");
    let manifest_path = data.join("sources-rewritten.json5");

    let original = load_sources(Some(&data.join("sources.json5")), &data.join("source"))
        .await
        .unwrap()
        .unwrap();
    let records: Vec<_> = original.into_iter().map(|r| r.record).collect();

    let manifest = serde_json::json!({
        "commonPath": "",
        "sourceFiles": records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "fileName": r.file_name.file_name().unwrap().to_str().unwrap(),
                })
            })
            .collect::<Vec<_>>(),
    });
    write_config(&manifest_path, &manifest).await.unwrap();

    let reloaded = load_sources(Some(&manifest_path), &data.join("source"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.len(), records.len());
    for (a, b) in reloaded.iter().zip(&records) {
        assert_eq!(a.record.name, b.name);
        assert_eq!(a.record.file_name, b.file_name);
    }
}
