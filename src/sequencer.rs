// Single-track sentence playback: Idle → Playing on play, tokens consumed
// strictly in order, each one either triggering its pad (then waiting out
// the estimated duration plus the gap), speaking through the fallback, or
// waiting the gap alone. All waits are deadlines observed by poll, so a
// stop cancels them synchronously; the abort is acted on before the next
// token, never mid-token.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::audio_api::AudioSink;
use crate::engine::{PadVoiceEngine, estimated_duration};
use crate::kit::{Group, Kit, Pad};
use crate::shared::PadRef;
use crate::speech::SpeechCapability;

// A snapshot of one composed pad press. Cached name/text/color mean a pad
// edited or deleted later never changes an already-composed token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentenceToken {
    #[serde(rename = "groupId")]
    pub group: String,
    pub index: usize,
    pub name: String,
    pub text: String,
    pub color: String,
}

impl SentenceToken {
    pub fn snapshot(group: &Group, index: usize, pad: &Pad) -> Self {
        Self {
            group: group.id.clone(),
            index,
            name: pad.name.clone(),
            text: pad.spoken_text().to_string(),
            color: group.color.clone(),
        }
    }

    pub fn pad_ref(&self) -> PadRef {
        PadRef::new(self.group.clone(), self.index)
    }

    pub fn spoken_text(&self) -> &str {
        if self.text.trim().is_empty() { &self.name } else { &self.text }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeqState {
    Idle,
    Playing,
    Aborted,
}

enum Wait {
    None,
    Until(Instant),
    Speech,
}

pub struct SentenceSequencer {
    state: SeqState,
    tokens: Vec<SentenceToken>,
    pos: usize,
    gap: Duration,
    tts_fallback: bool,
    wait: Wait,
}

impl Default for SentenceSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSequencer {
    pub fn new() -> Self {
        Self {
            state: SeqState::Idle,
            tokens: Vec::new(),
            pos: 0,
            gap: Duration::ZERO,
            tts_fallback: false,
            wait: Wait::None,
        }
    }

    pub fn state(&self) -> SeqState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SeqState::Playing
    }

    // Begin playback over a token snapshot. An empty sentence is an
    // immediate no-op; returns whether playback actually started.
    pub fn play(&mut self, tokens: &[SentenceToken], gap_ms: u64, tts_fallback: bool) -> bool {
        if self.state == SeqState::Playing || tokens.is_empty() {
            return false;
        }
        self.tokens = tokens.to_vec();
        self.pos = 0;
        self.gap = Duration::from_millis(gap_ms);
        self.tts_fallback = tts_fallback;
        self.wait = Wait::None;
        self.state = SeqState::Playing;
        true
    }

    // Cancels the pending wait now and asks the speech backend to stop;
    // the state machine returns to Idle at its next iteration point.
    pub fn stop(&mut self, speech: &mut dyn SpeechCapability) {
        if self.state != SeqState::Playing {
            return;
        }
        self.state = SeqState::Aborted;
        self.wait = Wait::None;
        speech.cancel();
    }

    pub fn poll(
        &mut self,
        kit: &Kit,
        engine: &mut PadVoiceEngine,
        sink: &mut dyn AudioSink,
        speech: &mut dyn SpeechCapability,
        now: Instant,
    ) {
        match self.state {
            SeqState::Idle => {}
            SeqState::Aborted => {
                self.state = SeqState::Idle;
                self.wait = Wait::None;
            }
            SeqState::Playing => {
                match self.wait {
                    Wait::Until(t) if now < t => return,
                    Wait::Speech if speech.is_speaking(now) => return,
                    _ => {}
                }
                self.wait = Wait::None;
                if self.pos >= self.tokens.len() {
                    self.state = SeqState::Idle;
                    return;
                }
                let token = self.tokens[self.pos].clone();
                self.pos += 1;
                self.start_token(&token, kit, engine, sink, speech, now);
            }
        }
    }

    fn start_token(
        &mut self,
        token: &SentenceToken,
        kit: &Kit,
        engine: &mut PadVoiceEngine,
        sink: &mut dyn AudioSink,
        speech: &mut dyn SpeechCapability,
        now: Instant,
    ) {
        let at = token.pad_ref();
        let pad = kit.pad(&at);

        // a pad with audio always wins over the speech fallback
        if let Some(pad) = pad
            && pad.sample.is_some()
        {
            engine.trigger(&at, pad, 1.0, now, sink);
            let dur = estimated_duration(pad).unwrap_or(0.0);
            self.wait = Wait::Until(now + Duration::from_secs_f32(dur) + self.gap);
            return;
        }

        // bufferless (or deleted) pad: speech if enabled and available,
        // otherwise a silent gap-length placeholder
        if self.tts_fallback && speech.available() {
            speech.speak(token.spoken_text(), self.gap.as_millis() as u64, now);
            self.wait = Wait::Speech;
        } else {
            self.wait = Wait::Until(now + self.gap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::AudioCommand;
    use crate::kit::Group;
    use crate::testkit::{FakeSpeech, pad_with_audio};

    const SR: u32 = 8_000;
    const GAP: u64 = 250;

    fn kit_with_audio_pads(n: usize) -> Kit {
        let mut group = Group::new("g", "Words", 3, 3);
        for i in 0..n {
            group.pads[i] = pad_with_audio(1.0, SR);
            group.pads[i].name = format!("pad{i}");
        }
        Kit { groups: vec![group], visible: vec!["g".into()] }
    }

    fn tokens(kit: &Kit, n: usize) -> Vec<SentenceToken> {
        let group = &kit.groups[0];
        (0..n)
            .map(|i| SentenceToken::snapshot(group, i, &group.pads[i]))
            .collect()
    }

    fn triggers(sink: &[AudioCommand]) -> usize {
        sink.iter()
            .filter(|c| matches!(c, AudioCommand::Trigger(_)))
            .count()
    }

    #[test]
    fn empty_sentence_is_a_noop() {
        let mut seq = SentenceSequencer::new();
        assert!(!seq.play(&[], GAP, false));
        assert_eq!(seq.state(), SeqState::Idle);
    }

    #[test]
    fn tokens_fire_in_order_with_duration_plus_gap_spacing() {
        let kit = kit_with_audio_pads(3);
        let toks = tokens(&kit, 3);
        let mut seq = SentenceSequencer::new();
        let mut eng = PadVoiceEngine::new();
        let mut sink: Vec<AudioCommand> = Vec::new();
        let mut speech = FakeSpeech::unavailable();
        let t0 = Instant::now();

        seq.play(&toks, GAP, false);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0);
        assert_eq!(triggers(&sink), 1);

        // pad duration 1.0s + 250ms gap: still waiting just before
        let just_before = t0 + Duration::from_millis(1_249);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, just_before);
        assert_eq!(triggers(&sink), 1);

        let due = t0 + Duration::from_millis(1_251);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, due);
        assert_eq!(triggers(&sink), 2);

        let due2 = due + Duration::from_millis(1_251);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, due2);
        assert_eq!(triggers(&sink), 3);

        // last token's wait elapses and playback winds down to idle
        let done = due2 + Duration::from_millis(1_251);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, done);
        assert_eq!(seq.state(), SeqState::Idle);
    }

    #[test]
    fn abort_mid_wait_stops_later_tokens_only() {
        let kit = kit_with_audio_pads(5);
        let toks = tokens(&kit, 5);
        let mut seq = SentenceSequencer::new();
        let mut eng = PadVoiceEngine::new();
        let mut sink: Vec<AudioCommand> = Vec::new();
        let mut speech = FakeSpeech::new(Duration::from_millis(100));
        let t0 = Instant::now();

        seq.play(&toks, GAP, false);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0);
        let t1 = t0 + Duration::from_millis(1_300);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t1);
        assert_eq!(triggers(&sink), 2);

        // stop while waiting out token 2
        seq.stop(&mut speech);
        assert_eq!(seq.state(), SeqState::Aborted);
        assert_eq!(speech.cancelled, 1);

        // no matter how much time passes, tokens 3..5 never fire
        for ms in [1, 2_000, 10_000] {
            seq.poll(&kit, &mut eng, &mut sink, &mut speech, t1 + Duration::from_millis(ms));
        }
        assert_eq!(triggers(&sink), 2);
        assert_eq!(seq.state(), SeqState::Idle);
    }

    #[test]
    fn pad_with_audio_never_invokes_speech() {
        let kit = kit_with_audio_pads(1);
        let toks = tokens(&kit, 1);
        let mut seq = SentenceSequencer::new();
        let mut eng = PadVoiceEngine::new();
        let mut sink: Vec<AudioCommand> = Vec::new();
        let mut speech = FakeSpeech::new(Duration::from_millis(100));

        seq.play(&toks, GAP, true);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, Instant::now());
        assert_eq!(triggers(&sink), 1);
        assert!(speech.spoken.is_empty());
    }

    #[test]
    fn bufferless_pad_speaks_its_text() {
        let mut kit = kit_with_audio_pads(0);
        kit.groups[0].pads[0].name = "water".into();
        let toks = tokens(&kit, 1);
        let mut seq = SentenceSequencer::new();
        let mut eng = PadVoiceEngine::new();
        let mut sink: Vec<AudioCommand> = Vec::new();
        let mut speech = FakeSpeech::new(Duration::from_millis(400));
        let t0 = Instant::now();

        seq.play(&toks, GAP, true);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0);
        assert!(sink.is_empty());
        assert_eq!(speech.spoken, vec!["water".to_string()]);

        // busy until utterance + the fallback's own gap have elapsed
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0 + Duration::from_millis(500));
        assert_eq!(seq.state(), SeqState::Playing);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0 + Duration::from_millis(700));
        assert_eq!(seq.state(), SeqState::Idle);
    }

    #[test]
    fn fallback_disabled_waits_exactly_the_gap() {
        let kit = kit_with_audio_pads(0);
        let toks = tokens(&kit, 1);
        let mut seq = SentenceSequencer::new();
        let mut eng = PadVoiceEngine::new();
        let mut sink: Vec<AudioCommand> = Vec::new();
        let mut speech = FakeSpeech::new(Duration::from_millis(400));
        let t0 = Instant::now();

        seq.play(&toks, GAP, false);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0);
        assert!(sink.is_empty());
        assert!(speech.spoken.is_empty());

        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0 + Duration::from_millis(249));
        assert_eq!(seq.state(), SeqState::Playing);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, t0 + Duration::from_millis(251));
        assert_eq!(seq.state(), SeqState::Idle);
    }

    #[test]
    fn deleted_pad_token_falls_through_to_fallback() {
        let kit = kit_with_audio_pads(0);
        let token = SentenceToken {
            group: "gone".into(),
            index: 5,
            name: "juice".into(),
            text: String::new(),
            color: String::new(),
        };
        let mut seq = SentenceSequencer::new();
        let mut eng = PadVoiceEngine::new();
        let mut sink: Vec<AudioCommand> = Vec::new();
        let mut speech = FakeSpeech::new(Duration::from_millis(100));

        seq.play(std::slice::from_ref(&token), GAP, true);
        seq.poll(&kit, &mut eng, &mut sink, &mut speech, Instant::now());
        // blank text falls back to the cached name
        assert_eq!(speech.spoken, vec!["juice".to_string()]);
    }

    #[test]
    fn play_while_playing_is_refused() {
        let kit = kit_with_audio_pads(2);
        let toks = tokens(&kit, 2);
        let mut seq = SentenceSequencer::new();
        assert!(seq.play(&toks, GAP, false));
        assert!(!seq.play(&toks, GAP, false));
    }
}
