use std::sync::Arc;

use crate::audio_api::{VoiceId, VoiceParams};
use crate::shared::PadRef;

use super::envelope::VoiceEnvelope;
use super::filter::VoiceFilter;
use super::frame::StereoFrame;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

// One sounding instance of a pad's sample: an interpolating playhead fed
// through filter → pan → envelope gain, mixed additively into the output.
// Deactivates itself when the playhead leaves the buffer (unless looping).
pub struct RenderVoice {
    pub id: VoiceId,
    pub pad: PadRef,
    pub active: bool,
    frames: Arc<Vec<StereoFrame>>,
    pos: f32,
    step: f32,
    gain: f32,
    pan_l: f32,
    pan_r: f32,
    filter: [VoiceFilter; 2],
    env: VoiceEnvelope,
    looped: bool,
    reverse: bool,
}

impl RenderVoice {
    pub fn new(params: VoiceParams, out_rate: f32) -> Self {
        let len = params.frames.len();
        // playhead advance per output frame, in source frames
        let step = params.rate * params.sample_rate as f32 / out_rate;
        let offset_frames = params.start_offset * params.sample_rate as f32;
        let pos = if params.reverse {
            ((len as f32 - 1.0) - offset_frames).max(0.0)
        } else {
            offset_frames.min(len as f32)
        };
        // linear pan; center passes both channels at unity
        let pan_l = (1.0 - params.pan).min(1.0);
        let pan_r = (1.0 + params.pan).min(1.0);
        let filter = VoiceFilter::new(params.filter, params.cutoff, params.q, out_rate);
        Self {
            id: params.id,
            pad: params.pad,
            active: len > 0,
            frames: params.frames,
            pos,
            step,
            gain: params.gain,
            pan_l,
            pan_r,
            filter: [filter, filter],
            env: VoiceEnvelope::new(params.env, out_rate, params.release_at),
            looped: params.looped,
            reverse: params.reverse,
        }
    }

    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        let data = &self.frames;
        let len = data.len() as f32;

        for frame in out.iter_mut() {
            if !self.looped {
                if self.reverse && self.pos < 0.0 {
                    self.active = false;
                    break;
                }
                if !self.reverse && self.pos >= len {
                    self.active = false;
                    break;
                }
            }

            let read_pos = self.pos.clamp(0.0, len - 1.0);
            let i = read_pos as usize;
            let frac = read_pos - i as f32;
            let s0 = data[i];
            let s1 = data.get(i + 1).copied().unwrap_or(s0);
            let raw = StereoFrame {
                left: lerp(s0.left, s1.left, frac),
                right: lerp(s0.right, s1.right, frac),
            };

            let shaped = StereoFrame {
                left: self.filter[0].process(raw.left),
                right: self.filter[1].process(raw.right),
            };

            let level = self.gain * self.env.next_level();
            frame.add_scaled(shaped, level * self.pan_l, level * self.pan_r);

            if self.reverse {
                self.pos -= self.step;
            } else {
                self.pos += self.step;
            }

            if self.looped {
                // wrap, never release: a looping voice sounds until stopped
                if self.pos >= len {
                    self.pos -= len;
                } else if self.pos < 0.0 {
                    self.pos += len;
                }
            }
        }
    }
}
