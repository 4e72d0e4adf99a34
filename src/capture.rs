// Microphone capture capability. One shared recorder: start hands back an
// opaque handle, stop resolves it to encoded WAV bytes so the engine's
// decode path is the same for recordings and loaded files.

use crossbeam_channel::Receiver;

use crate::audio::StereoFrame;
use crate::error::CoreError;
use crate::wav::{self, AudioClip};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureHandle(u64);

impl CaptureHandle {
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn raw(self) -> u64 {
        self.0
    }
}

pub trait CaptureCapability {
    fn start(&mut self) -> Result<CaptureHandle, CoreError>;
    fn stop(&mut self, handle: CaptureHandle) -> Result<Vec<u8>, CoreError>;
    fn is_capturing(&self) -> bool;
    // called from the tick loop while capturing, so a long take never
    // overflows the mic channel
    fn pump(&mut self) {}
}

// Capture backed by the cpal input stream's frame channel.
pub struct CpalCapture {
    rx: Receiver<Vec<StereoFrame>>,
    sample_rate: u32,
    next_handle: u64,
    active: Option<u64>,
    taken: Vec<StereoFrame>,
}

impl CpalCapture {
    pub fn new(rx: Receiver<Vec<StereoFrame>>, sample_rate: u32) -> Self {
        Self { rx, sample_rate, next_handle: 0, active: None, taken: Vec::new() }
    }

    fn drain(&mut self, keep: bool) {
        while let Ok(chunk) = self.rx.try_recv() {
            if keep {
                self.taken.extend_from_slice(&chunk);
            }
        }
    }
}

impl CaptureCapability for CpalCapture {
    fn start(&mut self) -> Result<CaptureHandle, CoreError> {
        if self.active.is_some() {
            return Err(CoreError::Capture("already recording".into()));
        }
        // discard whatever the mic sent while idle
        self.drain(false);
        self.taken.clear();
        let id = self.next_handle;
        self.next_handle += 1;
        self.active = Some(id);
        Ok(CaptureHandle(id))
    }

    fn stop(&mut self, handle: CaptureHandle) -> Result<Vec<u8>, CoreError> {
        if self.active != Some(handle.0) {
            return Err(CoreError::Capture("stale capture handle".into()));
        }
        self.drain(true);
        self.active = None;
        let taken = std::mem::take(&mut self.taken);
        if taken.is_empty() {
            return Err(CoreError::Capture("no audio captured".into()));
        }
        let clip = AudioClip {
            sample_rate: self.sample_rate,
            channels: vec![
                taken.iter().map(|f| f.left).collect(),
                taken.iter().map(|f| f.right).collect(),
            ],
        };
        wav::encode(&clip).map_err(|e| CoreError::Capture(e.to_string()))
    }

    fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    fn pump(&mut self) {
        if self.active.is_some() {
            self.drain(true);
        }
    }
}
