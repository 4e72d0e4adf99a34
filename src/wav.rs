// The audio codec used for persisted samples: 16-bit PCM WAV (canonical
// 44-byte header via hound), plus a base64 text form for embedding in the
// kit document. Decode is the exact inverse of encode for anything this
// codec produced; see the quantization law below.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::CoreError;

// Decoded audio: per-channel float samples in [-1, 1], all channels the
// same length.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl AudioClip {
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }
}

// Quantization: clamp to [-1, 1], scale negatives by 32768 and
// non-negatives by 32767, truncate. The decode side divides by the same
// factor, so a round trip is exact to within 1/32767 per sample.
fn quantize(s: f32) -> i16 {
    let s = s.clamp(-1.0, 1.0);
    if s < 0.0 { (s * 32768.0) as i16 } else { (s * 32767.0) as i16 }
}

fn dequantize(q: i16) -> f32 {
    if q < 0 { q as f32 / 32768.0 } else { q as f32 / 32767.0 }
}

pub fn encode(clip: &AudioClip) -> Result<Vec<u8>, CoreError> {
    if clip.channels.is_empty() {
        return Err(CoreError::Decode("clip has no channels".into()));
    }
    let spec = hound::WavSpec {
        channels: clip.channels.len() as u16,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| CoreError::Decode(e.to_string()))?;
        for i in 0..clip.frames() {
            for ch in &clip.channels {
                let s = ch.get(i).copied().unwrap_or(0.0);
                writer
                    .write_sample(quantize(s))
                    .map_err(|e| CoreError::Decode(e.to_string()))?;
            }
        }
        writer.finalize().map_err(|e| CoreError::Decode(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

pub fn decode(bytes: &[u8]) -> Result<AudioClip, CoreError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| CoreError::Decode(e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(CoreError::Decode(format!(
            "expected 16-bit pcm, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    let n_channels = spec.channels as usize;
    if n_channels == 0 {
        return Err(CoreError::Decode("zero channels".into()));
    }
    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CoreError::Decode(e.to_string()))?;

    let mut channels = vec![Vec::with_capacity(samples.len() / n_channels); n_channels];
    for (i, q) in samples.into_iter().enumerate() {
        channels[i % n_channels].push(dequantize(q));
    }
    Ok(AudioClip { sample_rate: spec.sample_rate, channels })
}

pub fn encode_text(clip: &AudioClip) -> Result<String, CoreError> {
    Ok(B64.encode(encode(clip)?))
}

pub fn decode_text(text: &str) -> Result<AudioClip, CoreError> {
    let bytes = B64
        .decode(text.trim())
        .map_err(|e| CoreError::Decode(e.to_string()))?;
    decode(&bytes)
}

// Accepts either raw WAV bytes or the base64 text form.
pub fn decode_any(bytes: &[u8]) -> Result<AudioClip, CoreError> {
    if bytes.starts_with(b"RIFF") {
        return decode(bytes);
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::Decode(e.to_string()))?;
    decode_text(text)
}
