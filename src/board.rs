// The single explicit context object: all engine state lives here and is
// mutated only by handle() (one command at a time) and poll() (the tick
// driver). The capabilities are passed in, never owned, so the frontend
// decides what is real and tests decide what is fake.

use std::time::Instant;

use crate::audio_api::AudioSink;
use crate::capture::CaptureCapability;
use crate::engine::{PadVoiceEngine, Press};
use crate::error::CoreError;
use crate::kit::{Group, Kit};
use crate::scenes::SceneChainManager;
use crate::sequencer::{SentenceSequencer, SentenceToken, SeqState};
use crate::shared::{Command, PadRef};
use crate::speech::SpeechCapability;
use crate::wav;

// The capability bundle every command handler receives.
pub struct Caps<'a> {
    pub sink: &'a mut dyn AudioSink,
    pub speech: &'a mut dyn SpeechCapability,
    pub capture: &'a mut dyn CaptureCapability,
}

pub struct Board {
    pub kit: Kit,
    pub engine: PadVoiceEngine,
    pub sequencer: SentenceSequencer,
    pub scenes: SceneChainManager,
    pub compose: bool,
    pub tts_fallback: bool,
}

impl Default for Board {
    fn default() -> Self {
        let mut kit = Kit::default();
        let group = Group::new("main", "Main", 4, 4);
        kit.visible = vec![group.id.clone()];
        kit.groups.push(group);
        Self::with_kit(kit)
    }
}

impl Board {
    pub fn with_kit(kit: Kit) -> Self {
        Self {
            kit,
            engine: PadVoiceEngine::new(),
            sequencer: SentenceSequencer::new(),
            scenes: SceneChainManager::new(),
            compose: false,
            tts_fallback: false,
        }
    }

    pub fn handle(&mut self, cmd: Command, now: Instant, caps: &mut Caps) -> Result<(), CoreError> {
        match cmd {
            Command::PressPad(at) => self.press_pad(&at, now, caps),
            Command::SilencePad(at) => {
                self.engine.stop_all(&at, caps.sink);
                Ok(())
            }
            Command::ToggleRecord(at) => {
                self.engine.toggle_record(&at, &mut self.kit, caps.capture)?;
                Ok(())
            }
            Command::PlaySentence => {
                if self.sequencer.is_playing() {
                    self.stop_playback(caps);
                } else {
                    self.scenes.cancel_chain();
                    let scene = &self.scenes.active;
                    self.sequencer.play(&scene.sentence, scene.gap_ms, self.tts_fallback);
                    self.poll(now, caps);
                }
                Ok(())
            }
            Command::PlayChain => {
                if self.sequencer.is_playing() {
                    self.stop_playback(caps);
                } else {
                    self.scenes.begin_chain();
                    self.poll(now, caps);
                }
                Ok(())
            }
            Command::StopPlayback => {
                self.stop_playback(caps);
                Ok(())
            }
            Command::ToggleCompose => {
                self.compose = !self.compose;
                Ok(())
            }
            Command::ToggleTtsFallback => {
                self.tts_fallback = !self.tts_fallback;
                Ok(())
            }
            Command::PopToken => {
                self.scenes.active.sentence.pop();
                Ok(())
            }
            Command::ClearSentence => {
                self.scenes.active.sentence.clear();
                Ok(())
            }
            Command::SelectScene(index) => {
                self.scenes.select_scene(index);
                Ok(())
            }
            Command::SetGap(ms) => {
                self.scenes.active.gap_ms = ms;
                Ok(())
            }
            Command::SetChain(chain) => {
                self.scenes.set_chain(chain);
                Ok(())
            }
            Command::SetName { pad, name } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.name = name;
                }
                Ok(())
            }
            Command::SetPhrase { pad, phrase } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.phrase = phrase;
                }
                Ok(())
            }
            Command::SetGain { pad, value } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.set_gain(value);
                }
                Ok(())
            }
            Command::SetPan { pad, value } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.set_pan(value);
                }
                Ok(())
            }
            Command::SetFilter { pad, kind, cutoff, q } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.set_filter(kind, cutoff, q);
                }
                Ok(())
            }
            Command::SetEnv { pad, env } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.set_env(env);
                }
                Ok(())
            }
            Command::SetTune { pad, semis } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.tune = semis.clamp(-48, 48);
                }
                Ok(())
            }
            Command::SetFine { pad, cents } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.fine = cents.clamp(-100.0, 100.0);
                }
                Ok(())
            }
            Command::SetLoop { pad, on } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.looped = on;
                }
                Ok(())
            }
            Command::SetReverse { pad, on } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.reverse = on;
                }
                Ok(())
            }
            Command::SetChoke { pad, choke } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.choke = choke;
                }
                Ok(())
            }
            Command::SetMode { pad, mode } => {
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.mode = mode;
                }
                Ok(())
            }
            Command::LoadSampleFile { pad, path } => {
                let bytes =
                    std::fs::read(&path).map_err(|e| CoreError::Decode(e.to_string()))?;
                let clip = wav::decode_any(&bytes)?;
                if let Some(p) = self.kit.pad_mut(&pad) {
                    p.assign_clip(&clip);
                }
                Ok(())
            }
            Command::ResizeGroup { group, rows, cols } => {
                if let Some(g) = self.kit.group_mut(&group) {
                    g.resize(rows, cols);
                }
                Ok(())
            }
            Command::SetGroupColor { group, color } => {
                if let Some(g) = self.kit.group_mut(&group) {
                    g.color = color;
                }
                Ok(())
            }
            Command::ToggleGroupVisible(id) => {
                self.kit.toggle_visible(&id);
                Ok(())
            }
        }
    }

    fn press_pad(&mut self, at: &PadRef, now: Instant, caps: &mut Caps) -> Result<(), CoreError> {
        if self.compose
            && let Some(group) = self.kit.group(&at.group)
            && let Some(pad) = group.pads.get(at.index)
        {
            self.scenes
                .active
                .sentence
                .push(SentenceToken::snapshot(group, at.index, pad));
        }
        let press = self
            .engine
            .press(at, &mut self.kit, 1.0, now, caps.sink, caps.capture)?;
        // the engine treats a bufferless press as a no-op; the board is the
        // caller that decides to speak instead
        if press == Press::NoAudio
            && self.tts_fallback
            && caps.speech.available()
            && let Some(pad) = self.kit.pad(at)
        {
            caps.speech.speak(pad.spoken_text(), 0, now);
        }
        Ok(())
    }

    fn stop_playback(&mut self, caps: &mut Caps) {
        self.sequencer.stop(caps.speech);
        self.scenes.cancel_chain();
    }

    // Tick driver: drains the mic, expires voice bookkeeping, advances the
    // sequencer, and feeds the next chain scene when one finishes.
    pub fn poll(&mut self, now: Instant, caps: &mut Caps) {
        caps.capture.pump();
        self.engine.prune(now);
        self.sequencer
            .poll(&self.kit, &mut self.engine, caps.sink, caps.speech, now);

        while self.sequencer.state() == SeqState::Idle && self.scenes.chain_running() {
            match self.scenes.advance_chain() {
                Some(index) => {
                    self.scenes.select_scene(index);
                    let scene = &self.scenes.active;
                    if self.sequencer.play(&scene.sentence, scene.gap_ms, self.tts_fallback) {
                        self.sequencer
                            .poll(&self.kit, &mut self.engine, caps.sink, caps.speech, now);
                        break;
                    }
                    // empty scene: fall through to the next chain entry
                }
                None => break,
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing() || self.scenes.chain_running()
    }
}
