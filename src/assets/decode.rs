use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{EngineError, Result};

/// A fully decoded, playable audio buffer.
///
/// Samples are mono f32 in [-1.0, 1.0]; multi-channel sources are downmixed at
/// decode time (the synthesis graph is mono until the panner). The source
/// channel count is kept for diagnostics.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub name: String,
    pub data: Vec<f32>,
    pub sample_rate: u32,
    pub source_channels: u16,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        self.data.len()
    }

    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }
}

/// A validated record with its raw file bytes attached, waiting for decode.
#[derive(Debug)]
pub struct RawAsset<R> {
    pub record: R,
    pub bytes: Vec<u8>,
}

/// Manifest records that carry a decoded buffer once the batch is applied.
pub trait AssetRecord {
    fn file_name(&self) -> &Path;
    fn attach_buffer(&mut self, buffer: Arc<AudioBuffer>);
}

/// Decode one blob of audio bytes with symphonia.
pub fn decode(bytes: &[u8], name: &str) -> Result<AudioBuffer> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| EngineError::Decode(format!("{name}: probe failed: {e}")))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::Decode(format!("{name}: no audio track")))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| EngineError::Decode(format!("{name}: no decoder: {e}")))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1) as u16;

    let mut mono: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(EngineError::Decode(format!("{name}: format error: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| EngineError::Decode(format!("{name}: bad packet: {e}")))?;

        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        buf.copy_interleaved_ref(decoded);

        // Downmix interleaved frames to mono.
        let step = channels.max(1) as usize;
        for frame in buf.samples().chunks(step) {
            let sum: f32 = frame.iter().copied().sum();
            mono.push(sum / step as f32);
        }
    }

    Ok(AudioBuffer {
        name: name.to_string(),
        data: mono,
        sample_rate,
        source_channels: channels,
    })
}

/// Decode every raw asset in the batch. Items the codec rejects are logged and
/// skipped, which the application step below turns into a batch failure.
pub fn decode_batch<R: AssetRecord>(raw: &[RawAsset<R>]) -> Vec<AudioBuffer> {
    let mut decoded = Vec::with_capacity(raw.len());
    for asset in raw {
        let name = asset.record.file_name().display().to_string();
        match decode(&asset.bytes, &name) {
            Ok(buffer) => decoded.push(buffer),
            Err(e) => tracing::warn!(file = %name, error = %e, "decode failed"),
        }
    }
    decoded
}

/// Re-attach decoded buffers to their originating records, in original order.
///
/// A count mismatch is the only mismatch signal: the whole batch is rejected
/// and no record is touched.
pub fn apply_decoded<R: AssetRecord>(records: &mut [R], decoded: Vec<AudioBuffer>) -> Result<()> {
    if records.len() != decoded.len() {
        return Err(EngineError::Decode(format!(
            "decoded count mismatch: {} records, {} buffers",
            records.len(),
            decoded.len()
        )));
    }
    for (record, buffer) in records.iter_mut().zip(decoded) {
        record.attach_buffer(Arc::new(buffer));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Probe {
        file_name: PathBuf,
        buffer: Option<Arc<AudioBuffer>>,
    }

    impl Probe {
        fn new(name: &str) -> Self {
            Self {
                file_name: PathBuf::from(name),
                buffer: None,
            }
        }
    }

    impl AssetRecord for Probe {
        fn file_name(&self) -> &Path {
            &self.file_name
        }
        fn attach_buffer(&mut self, buffer: Arc<AudioBuffer>) {
            self.buffer = Some(buffer);
        }
    }

    fn buffer(name: &str) -> AudioBuffer {
        AudioBuffer {
            name: name.to_string(),
            data: vec![0.0; 8],
            sample_rate: 48_000,
            source_channels: 1,
        }
    }

    /// Generate a small in-memory WAV file for the symphonia path.
    fn test_wav(frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..frames {
                let v = ((i as f32 * 0.05).sin() * i16::MAX as f32 * 0.5) as i16;
                writer.write_sample(v).unwrap();
                writer.write_sample(v).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_wav_to_mono() {
        let bytes = test_wav(256);
        let buffer = decode(&bytes, "test.wav").unwrap();
        assert_eq!(buffer.sample_rate, 44_100);
        assert_eq!(buffer.source_channels, 2);
        assert_eq!(buffer.frames(), 256);
        assert!(buffer.data.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = decode(&[0u8; 64], "noise.wav").unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
    }

    #[test]
    fn count_mismatch_rejects_batch_untouched() {
        let mut records = vec![Probe::new("a.wav"), Probe::new("b.wav"), Probe::new("c.wav")];
        let decoded = vec![buffer("a.wav"), buffer("b.wav")];

        let err = apply_decoded(&mut records, decoded).unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));
        assert!(records.iter().all(|r| r.buffer.is_none()));
    }

    #[test]
    fn matching_counts_attach_in_order() {
        let mut records = vec![Probe::new("a.wav"), Probe::new("b.wav")];
        let decoded = vec![buffer("a.wav"), buffer("b.wav")];

        apply_decoded(&mut records, decoded).unwrap();
        assert_eq!(records[0].buffer.as_ref().unwrap().name, "a.wav");
        assert_eq!(records[1].buffer.as_ref().unwrap().name, "b.wav");
    }
}
