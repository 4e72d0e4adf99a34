pub mod input;
pub mod view;

use crate::board::Board;
use crate::kit::PadMode;

// Semantic keyboard events; main maps these onto board Commands with the
// currently selected group filled in.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    Pad { index: usize, record: bool },
    Play,
    PlayChain,
    ToggleCompose,
    ToggleTts,
    ScenePrev,
    SceneNext,
    PopToken,
    ClearSentence,
    CycleGroup,
    Quit,
}

// Frozen view of the board for one frame; the renderer only reads this.
pub struct DisplayState {
    pub group_name: String,
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<PadCell>,
    pub sentence: String,
    pub scene: usize,
    pub num_scenes: usize,
    pub gap_ms: u64,
    pub compose: bool,
    pub tts: bool,
    pub playing: bool,
    pub status: Option<String>,
}

pub struct PadCell {
    pub name: String,
    pub has_audio: bool,
    pub mode: PadMode,
    pub recording: bool,
}

pub fn snapshot(board: &Board, group_id: &str, status: Option<String>) -> DisplayState {
    let group = board.kit.group(group_id).or_else(|| board.kit.groups.first());
    let (group_name, rows, cols, cells) = match group {
        Some(g) => {
            let recording_index = board
                .engine
                .recording_pad()
                .filter(|at| at.group == g.id)
                .map(|at| at.index);
            let cells = g
                .pads
                .iter()
                .enumerate()
                .map(|(i, p)| PadCell {
                    name: if p.name.is_empty() { "·".into() } else { p.name.clone() },
                    has_audio: p.sample.is_some(),
                    mode: p.mode,
                    recording: recording_index == Some(i),
                })
                .collect();
            (g.name.clone(), g.rows, g.cols, cells)
        }
        None => ("(no groups)".into(), 0, 0, Vec::new()),
    };

    let sentence = board
        .scenes
        .active
        .sentence
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    DisplayState {
        group_name,
        rows,
        cols,
        cells,
        sentence,
        scene: board.scenes.current_index(),
        num_scenes: board.scenes.num_slots(),
        gap_ms: board.scenes.active.gap_ms,
        compose: board.compose,
        tts: board.tts_fallback,
        playing: board.is_playing(),
        status,
    }
}
