// Test doubles for the capability boundaries, shared by unit and
// integration tests. Not compiled into the binary path in any way that
// matters; kept as a normal module so tests/ can use it too.

use std::time::{Duration, Instant};

use crate::capture::{CaptureCapability, CaptureHandle};
use crate::error::CoreError;
use crate::kit::Pad;
use crate::speech::SpeechCapability;
use crate::wav::{self, AudioClip};

pub fn tone_clip(frames: usize, sample_rate: u32) -> AudioClip {
    let chan: Vec<f32> = (0..frames).map(|i| (i as f32 * 0.07).sin() * 0.8).collect();
    AudioClip { sample_rate, channels: vec![chan.clone(), chan] }
}

pub fn pad_with_audio(seconds: f32, sample_rate: u32) -> Pad {
    let mut pad = Pad::default();
    pad.assign_clip(&tone_clip((seconds * sample_rate as f32) as usize, sample_rate));
    pad
}

// Speech fake with a fixed utterance length; records what was spoken.
pub struct FakeSpeech {
    pub available: bool,
    pub utterance: Duration,
    pub spoken: Vec<String>,
    pub cancelled: u32,
    busy_until: Option<Instant>,
}

impl FakeSpeech {
    pub fn new(utterance: Duration) -> Self {
        Self {
            available: true,
            utterance,
            spoken: Vec::new(),
            cancelled: 0,
            busy_until: None,
        }
    }

    pub fn unavailable() -> Self {
        let mut s = Self::new(Duration::ZERO);
        s.available = false;
        s
    }
}

impl SpeechCapability for FakeSpeech {
    fn available(&self) -> bool {
        self.available
    }

    fn speak(&mut self, text: &str, gap_ms: u64, now: Instant) {
        self.spoken.push(text.to_string());
        self.busy_until = Some(now + self.utterance + Duration::from_millis(gap_ms));
    }

    fn is_speaking(&mut self, now: Instant) -> bool {
        match self.busy_until {
            Some(t) if now < t => true,
            _ => {
                self.busy_until = None;
                false
            }
        }
    }

    fn cancel(&mut self) {
        self.busy_until = None;
        self.cancelled += 1;
    }
}

// Capture fake that hands back canned bytes on stop.
pub struct FakeCapture {
    pub bytes: Vec<u8>,
    pub fail_start: bool,
    active: Option<u64>,
    next: u64,
}

impl FakeCapture {
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self { bytes, fail_start: false, active: None, next: 0 }
    }

    pub fn returning_clip(clip: &AudioClip) -> Self {
        Self::returning(wav::encode(clip).expect("encodable clip"))
    }
}

impl CaptureCapability for FakeCapture {
    fn start(&mut self) -> Result<CaptureHandle, CoreError> {
        if self.fail_start {
            return Err(CoreError::Capture("device denied".into()));
        }
        if self.active.is_some() {
            return Err(CoreError::Capture("already recording".into()));
        }
        let id = self.next;
        self.next += 1;
        self.active = Some(id);
        Ok(CaptureHandle::from_raw(id))
    }

    fn stop(&mut self, handle: CaptureHandle) -> Result<Vec<u8>, CoreError> {
        if self.active.take() != Some(handle.raw()) {
            return Err(CoreError::Capture("stale capture handle".into()));
        }
        Ok(self.bytes.clone())
    }

    fn is_capturing(&self) -> bool {
        self.active.is_some()
    }
}
