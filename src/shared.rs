// Shared types: pad addressing, board-wide constants, and the closed set of
// commands the board's processor understands. Every user action becomes one
// of these values; there is no generic key/value field dispatch.

use std::path::PathBuf;

use crate::kit::{Adsr, FilterKind, PadMode};

pub const NUM_SCENES: usize = 8;
pub const DEFAULT_GAP_MS: u64 = 250;
pub const MAX_GRID_DIM: usize = 12;

// A pad is addressed by its group's stable id plus its index in the grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PadRef {
    pub group: String,
    pub index: usize,
}

impl PadRef {
    pub fn new(group: impl Into<String>, index: usize) -> Self {
        Self { group: group.into(), index }
    }
}

#[derive(Clone, Debug)]
pub enum Command {
    // transport
    PressPad(PadRef),
    SilencePad(PadRef),
    ToggleRecord(PadRef),
    PlaySentence, // play/stop toggle at the ui boundary
    PlayChain,
    StopPlayback,

    // composing
    ToggleCompose,
    ToggleTtsFallback,
    PopToken,
    ClearSentence,

    // scenes
    SelectScene(usize),
    SetGap(u64),
    SetChain(Vec<usize>),

    // per-field pad edits, each with its own validation
    SetName { pad: PadRef, name: String },
    SetPhrase { pad: PadRef, phrase: String },
    SetGain { pad: PadRef, value: f32 },
    SetPan { pad: PadRef, value: f32 },
    SetFilter { pad: PadRef, kind: FilterKind, cutoff: f32, q: f32 },
    SetEnv { pad: PadRef, env: Adsr },
    SetTune { pad: PadRef, semis: i32 },
    SetFine { pad: PadRef, cents: f32 },
    SetLoop { pad: PadRef, on: bool },
    SetReverse { pad: PadRef, on: bool },
    SetChoke { pad: PadRef, choke: Option<u32> },
    SetMode { pad: PadRef, mode: PadMode },
    LoadSampleFile { pad: PadRef, path: PathBuf },

    // group edits
    ResizeGroup { group: String, rows: usize, cols: usize },
    SetGroupColor { group: String, color: String },
    ToggleGroupVisible(String),
}
