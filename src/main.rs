use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use phrasepad::board::{Board, Caps};
use phrasepad::capture::CpalCapture;
use phrasepad::kit::PadMode;
use phrasepad::shared::{Command, PadRef};
use phrasepad::speech::CommandSpeech;
use phrasepad::tui::{self, UiEvent, input};
use phrasepad::vocab::{FileVocab, VocabularySource};
use phrasepad::{audio, doc};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let kit_path: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("kit.json"));

    let mut board = doc::load_file(&kit_path)?.unwrap_or_else(|| {
        let mut board = Board::default();
        // a caregiver word list seeds the fresh board's pad labels
        if let Ok(path) = std::env::var("PHRASEPAD_VOCAB") {
            label_from_vocab(&mut board, &FileVocab::new(path));
        }
        board
    });

    let mut audio = audio::start_audio()?;
    let sample_rate = audio.sample_rate();
    let input_rx = audio.take_input();
    let mut capture = CpalCapture::new(
        input_rx.unwrap_or_else(|| crossbeam_channel::bounded(0).1),
        sample_rate,
    );
    let tts_program =
        std::env::var("PHRASEPAD_TTS").unwrap_or_else(|_| "espeak".to_string());
    let mut speech = CommandSpeech::new(tts_program);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // drops raw mode on any exit path

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let mut group_pos: usize = 0;
    let mut status: Option<String> = None;

    loop {
        let group_id = selected_group(&board, group_pos);
        let ds = tui::snapshot(&board, &group_id, status.clone());
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds);
        })?;

        let events = input::poll_input(tick_rate)?;
        let now = Instant::now();
        for event in events {
            let cmd = match event {
                UiEvent::Quit => {
                    doc::save_file(&kit_path, &board)?;
                    drop(term);
                    return Ok(());
                }
                UiEvent::CycleGroup => {
                    group_pos = group_pos.wrapping_add(1);
                    continue;
                }
                UiEvent::ScenePrev => {
                    let cur = board.scenes.current_index();
                    Command::SelectScene(cur.saturating_sub(1))
                }
                UiEvent::SceneNext => {
                    let cur = board.scenes.current_index();
                    Command::SelectScene((cur + 1).min(board.scenes.num_slots() - 1))
                }
                UiEvent::Pad { index, record } => {
                    let group_id = selected_group(&board, group_pos);
                    let Some(group) = board.kit.group(&group_id) else { continue };
                    let Some(index) = input::remap_grid(index, group.rows, group.cols)
                    else {
                        continue;
                    };
                    let at = PadRef::new(group_id, index);
                    if record || group.pads[index].mode == PadMode::Record {
                        Command::ToggleRecord(at)
                    } else {
                        Command::PressPad(at)
                    }
                }
                UiEvent::Play => Command::PlaySentence,
                UiEvent::PlayChain => Command::PlayChain,
                UiEvent::ToggleCompose => Command::ToggleCompose,
                UiEvent::ToggleTts => Command::ToggleTtsFallback,
                UiEvent::PopToken => Command::PopToken,
                UiEvent::ClearSentence => Command::ClearSentence,
            };

            let mut caps = Caps {
                sink: &mut audio,
                speech: &mut speech,
                capture: &mut capture,
            };
            match board.handle(cmd, now, &mut caps) {
                Ok(()) => status = None,
                // pad-level failures are reported, never fatal
                Err(e) => status = Some(e.to_string()),
            }
        }

        let mut caps = Caps {
            sink: &mut audio,
            speech: &mut speech,
            capture: &mut capture,
        };
        board.poll(Instant::now(), &mut caps);
    }
}

// The grid shows one visible group at a time; Tab cycles through them.
fn selected_group(board: &Board, pos: usize) -> String {
    let visible: Vec<&String> = board
        .kit
        .groups
        .iter()
        .map(|g| &g.id)
        .filter(|id| board.kit.visible.is_empty() || board.kit.visible.contains(id))
        .collect();
    if visible.is_empty() {
        return String::new();
    }
    visible[pos % visible.len()].clone()
}

fn label_from_vocab(board: &mut Board, vocab: &dyn VocabularySource) {
    let mut words = vocab.list().into_iter();
    for group in &mut board.kit.groups {
        for pad in &mut group.pads {
            if pad.name.is_empty()
                && let Some(word) = words.next()
            {
                pad.name = word;
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
