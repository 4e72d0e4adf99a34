// Per-pad trigger/toggle/record logic. This side owns all voice
// bookkeeping (the render capability is fire-and-forget): which voices a
// pad has sounding, the held toggle voice, and the saved resume offset.
// Time is injected so elapsed-playback math is deterministic under test.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::audio_api::{AudioCommand, AudioSink, VoiceId, VoiceParams, next_voice_id};
use crate::capture::{CaptureCapability, CaptureHandle};
use crate::error::CoreError;
use crate::kit::{Kit, Pad, PadMode};
use crate::shared::PadRef;
use crate::wav;

// rate = 2^((tune + fine/100) / 12)
pub fn playback_rate(tune: i32, fine: f32) -> f32 {
    2f32.powf((tune as f32 + fine / 100.0) / 12.0)
}

// seconds the voice will sound: buffer duration over playback rate
pub fn estimated_duration(pad: &Pad) -> Option<f32> {
    let sample = pad.sample.as_ref()?;
    Some(sample.duration / playback_rate(pad.tune, pad.fine))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Press {
    Started,
    Stopped,
    // pad has no buffer; a defined no-op, callers may apply fallback
    NoAudio,
    RecordingStarted,
    RecordingStopped,
}

struct HeldVoice {
    id: VoiceId,
    started: Instant,
    rate: f32,
    // seconds into the sample the voice started from
    offset: f32,
}

struct LiveVoice {
    id: VoiceId,
    // None for looping voices, which sound until stopped
    ends: Option<Instant>,
}

#[derive(Default)]
struct PadState {
    live: Vec<LiveVoice>,
    held: Option<HeldVoice>,
    resume_offset: f32,
}

impl PadState {
    fn new() -> Self {
        Self { live: Vec::new(), held: None, resume_offset: 0.0 }
    }
}

#[derive(Default)]
pub struct PadVoiceEngine {
    states: HashMap<PadRef, PadState>,
    recording: Option<(PadRef, CaptureHandle)>,
}

impl PadVoiceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // The full press contract: dispatches on the pad's mode, including
    // Record. Needs the kit mutable because finalizing a recording writes
    // the captured audio back into a pad.
    pub fn press(
        &mut self,
        at: &PadRef,
        kit: &mut Kit,
        velocity: f32,
        now: Instant,
        sink: &mut dyn AudioSink,
        capture: &mut dyn CaptureCapability,
    ) -> Result<Press, CoreError> {
        let Some(pad) = kit.pad(at) else {
            return Ok(Press::NoAudio);
        };
        if pad.mode == PadMode::Record {
            return self.toggle_record(at, kit, capture);
        }
        let pad = pad.clone();
        Ok(self.trigger(at, &pad, velocity, now, sink))
    }

    // Trigger for the three playback modes. No-op when the pad has no
    // buffer; never touches other pads.
    pub fn trigger(
        &mut self,
        at: &PadRef,
        pad: &Pad,
        velocity: f32,
        now: Instant,
        sink: &mut dyn AudioSink,
    ) -> Press {
        match pad.mode {
            PadMode::Retrigger => self.trigger_retrigger(at, pad, velocity, now, sink),
            PadMode::ToggleStart | PadMode::ToggleResume => {
                self.trigger_toggle(at, pad, velocity, now, sink)
            }
            PadMode::Record => Press::NoAudio,
        }
    }

    fn trigger_retrigger(
        &mut self,
        at: &PadRef,
        pad: &Pad,
        velocity: f32,
        now: Instant,
        sink: &mut dyn AudioSink,
    ) -> Press {
        let Some(sample) = &pad.sample else {
            return Press::NoAudio;
        };
        let rate = playback_rate(pad.tune, pad.fine);
        let dur = sample.duration / rate;
        let id = next_voice_id();
        sink.send(AudioCommand::Trigger(VoiceParams {
            id,
            pad: at.clone(),
            frames: sample.frames.clone(),
            sample_rate: sample.sample_rate,
            rate,
            gain: pad.gain * velocity.clamp(0.0, 1.0),
            pan: pad.pan,
            filter: pad.filter,
            cutoff: pad.cutoff,
            q: pad.q,
            env: pad.env,
            start_offset: 0.0,
            looped: pad.looped,
            reverse: pad.reverse,
            // release approaches silence from the estimated end of playback;
            // a looping voice never gets one
            release_at: (!pad.looped).then_some(dur),
        }));
        let state = self.states.entry(at.clone()).or_insert_with(PadState::new);
        state.live.push(LiveVoice {
            id,
            ends: (!pad.looped).then(|| now + Duration::from_secs_f32(dur)),
        });
        Press::Started
    }

    fn trigger_toggle(
        &mut self,
        at: &PadRef,
        pad: &Pad,
        velocity: f32,
        now: Instant,
        sink: &mut dyn AudioSink,
    ) -> Press {
        let Some(sample) = &pad.sample else {
            return Press::NoAudio;
        };
        let state = self.states.entry(at.clone()).or_insert_with(PadState::new);

        if let Some(held) = state.held.take() {
            sink.send(AudioCommand::StopVoice(held.id));
            if pad.mode == PadMode::ToggleResume {
                let elapsed = now.duration_since(held.started).as_secs_f32() * held.rate;
                let total = held.offset + elapsed;
                state.resume_offset = if pad.looped {
                    total % sample.duration
                } else {
                    total.min(sample.duration)
                };
            } else {
                // ToggleStart always replays from the top
                state.resume_offset = 0.0;
            }
            return Press::Stopped;
        }

        let offset = if pad.mode == PadMode::ToggleResume { state.resume_offset } else { 0.0 };
        let rate = playback_rate(pad.tune, pad.fine);
        let id = next_voice_id();
        sink.send(AudioCommand::Trigger(VoiceParams {
            id,
            pad: at.clone(),
            frames: sample.frames.clone(),
            sample_rate: sample.sample_rate,
            rate,
            gain: pad.gain * velocity.clamp(0.0, 1.0),
            pan: pad.pan,
            filter: pad.filter,
            cutoff: pad.cutoff,
            q: pad.q,
            env: pad.env,
            start_offset: offset,
            looped: pad.looped,
            reverse: pad.reverse,
            // only attack/decay apply; the voice is stopped explicitly
            release_at: None,
        }));
        state.held = Some(HeldVoice { id, started: now, rate, offset });
        Press::Started
    }

    // Silence every voice on the pad immediately. No-op for a pad that
    // isn't sounding.
    pub fn stop_all(&mut self, at: &PadRef, sink: &mut dyn AudioSink) {
        sink.send(AudioCommand::StopPad(at.clone()));
        if let Some(state) = self.states.get_mut(at) {
            state.live.clear();
            state.held = None;
        }
    }

    // Drop bookkeeping for retrigger voices whose estimated end has
    // passed; the render side already removed them itself.
    pub fn prune(&mut self, now: Instant) {
        for state in self.states.values_mut() {
            state.live.retain(|v| v.ends.is_none_or(|t| t > now));
        }
    }

    pub fn toggle_record(
        &mut self,
        at: &PadRef,
        kit: &mut Kit,
        capture: &mut dyn CaptureCapability,
    ) -> Result<Press, CoreError> {
        // one mic: a press on a second pad finalizes the first take before
        // its own capture starts
        if let Some((pad_ref, handle)) = self.recording.take() {
            let bytes = capture.stop(handle)?;
            let clip = wav::decode_any(&bytes)?;
            if let Some(pad) = kit.pad_mut(&pad_ref) {
                pad.assign_clip(&clip);
            }
            if pad_ref == *at {
                return Ok(Press::RecordingStopped);
            }
        }
        let handle = capture.start()?;
        self.recording = Some((at.clone(), handle));
        Ok(Press::RecordingStarted)
    }

    pub fn recording_pad(&self) -> Option<&PadRef> {
        self.recording.as_ref().map(|(p, _)| p)
    }

    pub fn resume_offset(&self, at: &PadRef) -> f32 {
        self.states.get(at).map(|s| s.resume_offset).unwrap_or(0.0)
    }

    pub fn live_voices(&self, at: &PadRef) -> usize {
        self.states
            .get(at)
            .map(|s| s.live.len() + usize::from(s.held.is_some()))
            .unwrap_or(0)
    }

    // Choke enforcement hook. The choke field is carried but deliberately
    // not enforced by any trigger path; this names the pads that would be
    // silenced if it were.
    pub fn choke_victims(kit: &Kit, at: &PadRef) -> Vec<PadRef> {
        let Some(choke) = kit.pad(at).and_then(|p| p.choke) else {
            return Vec::new();
        };
        let mut victims = Vec::new();
        for group in &kit.groups {
            for (index, pad) in group.pads.iter().enumerate() {
                let candidate = PadRef::new(group.id.clone(), index);
                if candidate != *at && pad.choke == Some(choke) {
                    victims.push(candidate);
                }
            }
        }
        victims
    }
}
