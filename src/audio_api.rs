// The boundary between the control thread and the rendering capability.
// Every voice is fully described at trigger time; after that the render
// side only ever receives an earlier stop, never a parameter change.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio::StereoFrame;
use crate::kit::{Adsr, FilterKind};
use crate::shared::PadRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

// atomic counter so ids can be minted from any thread
pub fn next_voice_id() -> VoiceId {
    VoiceId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

// Immutable-after-construction parameters for one voice.
#[derive(Clone, Debug)]
pub struct VoiceParams {
    pub id: VoiceId,
    pub pad: PadRef,
    pub frames: Arc<Vec<StereoFrame>>,
    pub sample_rate: u32,
    // playback rate from the pitch law; 1.0 = native speed
    pub rate: f32,
    pub gain: f32,
    pub pan: f32,
    pub filter: FilterKind,
    pub cutoff: f32,
    pub q: f32,
    pub env: Adsr,
    // seconds into the sample to start from
    pub start_offset: f32,
    pub looped: bool,
    pub reverse: bool,
    // seconds after start at which the exponential release begins;
    // None for looped and toggle-held voices
    pub release_at: Option<f32>,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    Trigger(VoiceParams),
    StopVoice(VoiceId),
    StopPad(PadRef),
    StopAll,
}

// The rendering capability the engine talks to. The real implementation
// pushes onto a channel drained by the audio callback; tests record.
pub trait AudioSink {
    fn send(&mut self, cmd: AudioCommand);
}

impl AudioSink for Vec<AudioCommand> {
    fn send(&mut self, cmd: AudioCommand) {
        self.push(cmd);
    }
}
