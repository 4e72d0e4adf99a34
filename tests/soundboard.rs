// End-to-end exercise of the board with fake capabilities: compose a
// sentence from a speech-fallback pad, play it, and check the sequencer
// settles back to idle. Also covers a full save/load cycle of a kit with
// embedded audio.

use std::time::{Duration, Instant};

use phrasepad::audio_api::AudioCommand;
use phrasepad::board::{Board, Caps};
use phrasepad::doc;
use phrasepad::kit::{Group, Kit};
use phrasepad::sequencer::SeqState;
use phrasepad::shared::{Command, PadRef};
use phrasepad::testkit::{FakeCapture, FakeSpeech, pad_with_audio, tone_clip};

// Build a fresh capability bundle per call so the borrow of sink/speech
// ends before the assertions read them back.
macro_rules! caps {
    ($sink:ident, $speech:ident, $capture:ident) => {
        &mut Caps {
            sink: &mut $sink,
            speech: &mut $speech,
            capture: &mut $capture,
        }
    };
}

fn two_group_board() -> Board {
    let mut nouns = Group::new("nouns", "Nouns", 4, 4);
    nouns.pads[0].name = "water".into();
    nouns.pads[0].phrase = "water".into();
    let verbs = Group::new("verbs", "Verbs", 3, 3);
    let kit = Kit {
        groups: vec![nouns, verbs],
        visible: vec!["nouns".into(), "verbs".into()],
    };
    Board::with_kit(kit)
}

#[test]
fn spoken_fallback_sentence_plays_and_returns_to_idle() {
    let mut board = two_group_board();
    board.compose = true;
    board.tts_fallback = true;
    board.scenes.active.gap_ms = 250;

    let mut sink: Vec<AudioCommand> = Vec::new();
    let mut speech = FakeSpeech::new(Duration::from_millis(600));
    let mut capture = FakeCapture::returning(Vec::new());

    let t0 = Instant::now();
    board
        .handle(
            Command::PressPad(PadRef::new("nouns", 0)),
            t0,
            caps!(sink, speech, capture),
        )
        .unwrap();
    assert_eq!(board.scenes.active.sentence.len(), 1);

    // the press itself already spoke once (bufferless pad, fallback on)
    board
        .handle(Command::PlaySentence, t0, caps!(sink, speech, capture))
        .unwrap();
    assert_eq!(speech.spoken, vec!["water".to_string(), "water".to_string()]);
    assert!(sink.is_empty(), "no audio should have been triggered");
    assert_eq!(board.sequencer.state(), SeqState::Playing);

    // utterance (600ms) plus the fallback's own gap (250ms)
    board.poll(t0 + Duration::from_millis(800), caps!(sink, speech, capture));
    assert_eq!(board.sequencer.state(), SeqState::Playing);

    board.poll(t0 + Duration::from_millis(900), caps!(sink, speech, capture));
    assert_eq!(board.sequencer.state(), SeqState::Idle);
}

#[test]
fn audio_pad_takes_precedence_over_fallback_in_the_same_sentence() {
    let mut board = two_group_board();
    *board
        .kit
        .pad_mut(&PadRef::new("verbs", 0))
        .unwrap() = pad_with_audio(0.5, 8_000);
    board.kit.pad_mut(&PadRef::new("verbs", 0)).unwrap().name = "drink".into();
    board.compose = true;
    board.tts_fallback = true;

    let mut sink: Vec<AudioCommand> = Vec::new();
    let mut speech = FakeSpeech::new(Duration::from_millis(100));
    let mut capture = FakeCapture::returning(Vec::new());

    let t0 = Instant::now();
    board
        .handle(
            Command::PressPad(PadRef::new("verbs", 0)),
            t0,
            caps!(sink, speech, capture),
        )
        .unwrap();
    board
        .handle(
            Command::PressPad(PadRef::new("nouns", 0)),
            t0,
            caps!(sink, speech, capture),
        )
        .unwrap();
    sink.clear();
    speech.spoken.clear();

    board
        .handle(Command::PlaySentence, t0, caps!(sink, speech, capture))
        .unwrap();
    // token 1 has audio: triggered, not spoken
    assert_eq!(sink.len(), 1);
    assert!(speech.spoken.is_empty());

    // token 2 is bufferless: spoken, not triggered
    board.poll(t0 + Duration::from_millis(800), caps!(sink, speech, capture));
    assert_eq!(sink.len(), 1);
    assert_eq!(speech.spoken, vec!["water".to_string()]);

    board.poll(t0 + Duration::from_millis(1_500), caps!(sink, speech, capture));
    assert_eq!(board.sequencer.state(), SeqState::Idle);
}

#[test]
fn kit_with_embedded_audio_survives_disk_round_trip() {
    let mut board = two_group_board();
    {
        let pad = board.kit.pad_mut(&PadRef::new("nouns", 1)).unwrap();
        pad.name = "juice".into();
        pad.assign_clip(&tone_clip(1_600, 8_000));
    }
    board.scenes.active.gap_ms = 400;

    let dir = std::env::temp_dir().join(format!("phrasepad-test-{}", std::process::id()));
    let path = dir.join("kit.json");
    doc::save_file(&path, &board).unwrap();

    let back = doc::load_file(&path).unwrap().expect("file exists");
    let pad = back.kit.pad(&PadRef::new("nouns", 1)).unwrap();
    assert_eq!(pad.name, "juice");
    let sample = pad.sample.as_ref().expect("audio restored");
    assert!((sample.duration - 0.2).abs() < 1e-3);
    assert_eq!(back.scenes.active.gap_ms, 400);
    assert_eq!(back.kit.groups[1].cols, 3);

    std::fs::remove_dir_all(&dir).ok();
}
