// The real-time side: an explicit registry of active voices, keyed by the
// ids the control thread minted. Voices are removed when they deactivate
// themselves or when a stop command arrives; nothing is left to the host
// to clean up.

use crate::audio_api::AudioCommand;

use super::frame::StereoFrame;
use super::voice::RenderVoice;

// hard cap so a runaway trigger storm can't grow the registry unbounded
pub const MAX_VOICES: usize = 64;

pub struct RenderEngine {
    sample_rate: f32,
    voices: Vec<RenderVoice>,
}

impl RenderEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Trigger(params) => {
                if self.voices.len() >= MAX_VOICES {
                    // steal the oldest slot rather than allocate past the cap
                    self.voices.remove(0);
                }
                self.voices.push(RenderVoice::new(params, self.sample_rate));
            }
            AudioCommand::StopVoice(id) => self.voices.retain(|v| v.id != id),
            AudioCommand::StopPad(pad) => self.voices.retain(|v| v.pad != pad),
            AudioCommand::StopAll => self.voices.clear(),
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        for voice in &mut self.voices {
            voice.render_into(out);
        }
        self.voices.retain(|v| v.active);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}
