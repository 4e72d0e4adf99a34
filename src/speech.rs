// Speech-fallback capability. The contract: speak() starts an utterance
// plus a trailing gap of silence, is_speaking() reports until both are
// done, cancel() is best effort (a backend may flush what it already
// queued before going quiet).

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub trait SpeechCapability {
    fn available(&self) -> bool;
    fn speak(&mut self, text: &str, gap_ms: u64, now: Instant);
    fn is_speaking(&mut self, now: Instant) -> bool;
    fn cancel(&mut self);
}

// No speech backend at all; callers fall through to silent gaps.
pub struct NullSpeech;

impl SpeechCapability for NullSpeech {
    fn available(&self) -> bool {
        false
    }
    fn speak(&mut self, _text: &str, _gap_ms: u64, _now: Instant) {}
    fn is_speaking(&mut self, _now: Instant) -> bool {
        false
    }
    fn cancel(&mut self) {}
}

// Shells out to a TTS command (espeak by default) once per utterance and
// holds "speaking" for the trailing gap after the child exits.
pub struct CommandSpeech {
    program: String,
    child: Option<Child>,
    gap: Duration,
    gap_until: Option<Instant>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: None,
            gap: Duration::ZERO,
            gap_until: None,
        }
    }
}

impl SpeechCapability for CommandSpeech {
    fn available(&self) -> bool {
        !self.program.is_empty()
    }

    fn speak(&mut self, text: &str, gap_ms: u64, now: Instant) {
        self.cancel();
        self.gap = Duration::from_millis(gap_ms);
        match Command::new(&self.program)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => self.child = Some(child),
            Err(e) => {
                eprintln!("phrasepad: tts command '{}' failed: {e}", self.program);
                // still observe the gap so the sequencer's pacing holds
                self.gap_until = Some(now + self.gap);
            }
        }
    }

    fn is_speaking(&mut self, now: Instant) -> bool {
        if let Some(child) = &mut self.child {
            match child.try_wait() {
                Ok(None) => return true,
                Ok(Some(_)) | Err(_) => {
                    self.child = None;
                    self.gap_until = Some(now + self.gap);
                }
            }
        }
        match self.gap_until {
            Some(t) if now < t => true,
            Some(_) => {
                self.gap_until = None;
                false
            }
            None => false,
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.gap_until = None;
    }
}
