// The persisted kit document. Serde structs mirror the on-disk field
// names exactly; conversion to and from the live Board happens here, along
// with the recovery rules: a malformed document aborts the whole load, a
// bad embedded audio string only costs that one pad its sample.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::CoreError;
use crate::kit::{Adsr, FilterKind, Group, Kit, Pad, PadMode};
use crate::scenes::{Scene, SceneChainManager};
use crate::sequencer::SentenceToken;
use crate::shared::MAX_GRID_DIM;
use crate::wav;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KitDoc {
    #[serde(default)]
    pub groups: Vec<GroupDoc>,
    #[serde(rename = "visibleGroupIds", default)]
    pub visible_group_ids: Vec<String>,
    #[serde(default)]
    pub sequencer: SequencerDoc,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupDoc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub pads: Vec<PadDoc>,
}

fn default_gain() -> f32 {
    1.0
}

fn default_cutoff() -> f32 {
    20_000.0
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PadDoc {
    #[serde(default)]
    pub name: String,
    // missing phrase falls back to the name at install time
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(rename = "audioText", default)]
    pub audio_text: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_gain")]
    pub gain: f32,
    #[serde(default)]
    pub pan: f32,
    #[serde(rename = "filterType", default)]
    pub filter_type: FilterKind,
    #[serde(default = "default_cutoff")]
    pub cutoff: f32,
    #[serde(default)]
    pub q: f32,
    #[serde(default)]
    pub env: Adsr,
    #[serde(default)]
    pub tune: i32,
    #[serde(default)]
    pub fine: f32,
    #[serde(rename = "loop", default)]
    pub looped: bool,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub choke: Option<u32>,
    #[serde(default)]
    pub mode: PadMode,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SequencerDoc {
    #[serde(rename = "composeMode", default)]
    pub compose_mode: bool,
    #[serde(rename = "ttsFallback", default)]
    pub tts_fallback: bool,
    #[serde(rename = "currentScene", default)]
    pub current_scene: usize,
    #[serde(default)]
    pub chain: Vec<usize>,
    #[serde(default)]
    pub scenes: Vec<Option<SceneDoc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SceneDoc {
    #[serde(rename = "gapMs")]
    pub gap_ms: u64,
    #[serde(default)]
    pub sentence: Vec<SentenceToken>,
}

// Parse the document text, tolerating the legacy shape: a flat pad list
// with no groups, which becomes one square group.
pub fn parse(text: &str) -> Result<KitDoc, CoreError> {
    match serde_json::from_str::<KitDoc>(text) {
        Ok(doc) => Ok(doc),
        Err(primary) => match serde_json::from_str::<Vec<PadDoc>>(text) {
            Ok(pads) => Ok(legacy_to_doc(pads)),
            Err(_) => Err(CoreError::Document(primary.to_string())),
        },
    }
}

fn legacy_to_doc(pads: Vec<PadDoc>) -> KitDoc {
    let side = ((pads.len().max(1) as f64).sqrt().ceil() as usize).clamp(1, MAX_GRID_DIM);
    KitDoc {
        groups: vec![GroupDoc {
            id: "pads".into(),
            name: "Pads".into(),
            rows: side,
            cols: side,
            color: String::new(),
            pads,
        }],
        visible_group_ids: vec!["pads".into()],
        sequencer: SequencerDoc::default(),
    }
}

fn install_pad(doc: PadDoc) -> Pad {
    let mut pad = Pad::default();
    pad.phrase = doc.phrase.unwrap_or_else(|| doc.name.clone());
    pad.name = doc.name;
    pad.image = doc.image;
    pad.set_gain(doc.gain);
    pad.set_pan(doc.pan);
    pad.set_filter(doc.filter_type, doc.cutoff, doc.q);
    pad.set_env(doc.env);
    pad.tune = doc.tune;
    pad.fine = doc.fine;
    pad.looped = doc.looped;
    pad.reverse = doc.reverse;
    pad.choke = doc.choke;
    pad.mode = doc.mode;
    if !doc.audio_text.trim().is_empty() {
        match wav::decode_text(&doc.audio_text) {
            Ok(clip) => pad.assign_clip(&clip),
            Err(_) => {
                // one bad pad never aborts the load; keep the stored text
                // so nothing is lost on the next save
                pad.audio_text = doc.audio_text;
            }
        }
    }
    pad
}

pub fn to_board(doc: KitDoc) -> Board {
    let groups = doc
        .groups
        .into_iter()
        .map(|g| {
            let mut group = Group::new(g.id, g.name, g.rows, g.cols);
            if !g.color.is_empty() {
                group.color = g.color;
            }
            for (i, pad_doc) in g.pads.into_iter().enumerate() {
                if i < group.pads.len() {
                    group.pads[i] = install_pad(pad_doc);
                }
            }
            group
        })
        .collect();
    let kit = Kit { groups, visible: doc.visible_group_ids };

    let seq = doc.sequencer;
    let slots = seq
        .scenes
        .into_iter()
        .map(|s| s.map(|s| Scene { gap_ms: s.gap_ms, sentence: s.sentence }))
        .collect();
    let scenes = SceneChainManager::restore(slots, seq.current_scene, seq.chain);

    let mut board = Board::with_kit(kit);
    board.scenes = scenes;
    board.compose = seq.compose_mode;
    board.tts_fallback = seq.tts_fallback;
    board
}

pub fn from_board(board: &Board) -> KitDoc {
    // the active scene is only written back to its slot on switches, so
    // snapshot through a clone to pick up in-progress composition
    let mut scenes = board.scenes.clone_for_save();
    scenes.select_scene(scenes.current_index());

    KitDoc {
        groups: board
            .kit
            .groups
            .iter()
            .map(|g| GroupDoc {
                id: g.id.clone(),
                name: g.name.clone(),
                rows: g.rows,
                cols: g.cols,
                color: g.color.clone(),
                pads: g.pads.iter().map(pad_to_doc).collect(),
            })
            .collect(),
        visible_group_ids: board.kit.visible.clone(),
        sequencer: SequencerDoc {
            compose_mode: board.compose,
            tts_fallback: board.tts_fallback,
            current_scene: scenes.current_index(),
            chain: scenes.chain().to_vec(),
            scenes: scenes
                .slots()
                .iter()
                .map(|s| {
                    s.as_ref().map(|s| SceneDoc {
                        gap_ms: s.gap_ms,
                        sentence: s.sentence.clone(),
                    })
                })
                .collect(),
        },
    }
}

fn pad_to_doc(pad: &Pad) -> PadDoc {
    PadDoc {
        name: pad.name.clone(),
        phrase: Some(pad.phrase.clone()),
        audio_text: pad.audio_text.clone(),
        image: pad.image.clone(),
        gain: pad.gain,
        pan: pad.pan,
        filter_type: pad.filter,
        cutoff: pad.cutoff,
        q: pad.q,
        env: pad.env,
        tune: pad.tune,
        fine: pad.fine,
        looped: pad.looped,
        reverse: pad.reverse,
        choke: pad.choke,
        mode: pad.mode,
    }
}

// Missing file is not an error; a present-but-broken one is, and nothing
// gets installed from it.
pub fn load_file(path: &Path) -> Result<Option<Board>, CoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoreError::Document(e.to_string())),
    };
    Ok(Some(to_board(parse(&text)?)))
}

pub fn save_file(path: &Path, board: &Board) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&from_board(board))?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::PadRef;
    use crate::testkit::tone_clip;

    #[test]
    fn document_round_trips_through_the_board() {
        let mut board = Board::default();
        {
            let pad = board.kit.pad_mut(&PadRef::new("main", 0)).unwrap();
            pad.name = "water".into();
            pad.phrase = "I want water".into();
            pad.assign_clip(&tone_clip(800, 8_000));
            pad.tune = 5;
            pad.looped = true;
            pad.mode = PadMode::ToggleResume;
        }
        board.tts_fallback = true;

        let text = serde_json::to_string(&from_board(&board)).unwrap();
        let back = to_board(parse(&text).unwrap());
        let pad = back.kit.pad(&PadRef::new("main", 0)).unwrap();
        assert_eq!(pad.name, "water");
        assert_eq!(pad.phrase, "I want water");
        assert_eq!(pad.tune, 5);
        assert!(pad.looped);
        assert_eq!(pad.mode, PadMode::ToggleResume);
        assert!(pad.sample.is_some());
        assert_eq!(pad.sample.as_ref().unwrap().sample_rate, 8_000);
        assert!(back.tts_fallback);
    }

    #[test]
    fn legacy_flat_pad_list_becomes_a_square_group() {
        let text = r#"[
            {"name": "yes"}, {"name": "no"}, {"name": "more"},
            {"name": "stop"}, {"name": "help"}
        ]"#;
        let board = to_board(parse(text).unwrap());
        assert_eq!(board.kit.groups.len(), 1);
        let g = &board.kit.groups[0];
        assert_eq!((g.rows, g.cols), (3, 3));
        assert_eq!(g.pads[0].name, "yes");
        assert_eq!(g.pads[4].name, "help");
    }

    #[test]
    fn missing_phrase_defaults_to_name_and_missing_mode_to_retrigger() {
        let text = r#"{"groups": [{"id": "g", "rows": 1, "cols": 2,
            "pads": [{"name": "drink"}, {"name": "eat", "phrase": "I am hungry"}]}]}"#;
        let board = to_board(parse(text).unwrap());
        let a = board.kit.pad(&PadRef::new("g", 0)).unwrap();
        assert_eq!(a.phrase, "drink");
        assert_eq!(a.mode, PadMode::Retrigger);
        let b = board.kit.pad(&PadRef::new("g", 1)).unwrap();
        assert_eq!(b.phrase, "I am hungry");
    }

    #[test]
    fn one_bad_audio_text_does_not_abort_the_load() {
        let good = wav::encode_text(&tone_clip(100, 8_000)).unwrap();
        let text = format!(
            r#"{{"groups": [{{"id": "g", "rows": 1, "cols": 2, "pads": [
                {{"name": "a", "audioText": "!!corrupt!!"}},
                {{"name": "b", "audioText": "{good}"}}
            ]}}]}}"#
        );
        let board = to_board(parse(&text).unwrap());
        assert!(board.kit.pad(&PadRef::new("g", 0)).unwrap().sample.is_none());
        assert!(board.kit.pad(&PadRef::new("g", 1)).unwrap().sample.is_some());
    }

    #[test]
    fn malformed_document_is_a_document_error() {
        assert!(matches!(parse("{ nope"), Err(CoreError::Document(_))));
        assert!(matches!(parse("42"), Err(CoreError::Document(_))));
    }

    #[test]
    fn scenes_and_chain_survive_the_round_trip() {
        let mut board = Board::default();
        board.scenes.active.gap_ms = 500;
        board.scenes.set_chain(vec![1, 0, 1]);
        board.scenes.select_scene(1);
        board.scenes.active.gap_ms = 750;

        let text = serde_json::to_string(&from_board(&board)).unwrap();
        let mut back = to_board(parse(&text).unwrap());
        assert_eq!(back.scenes.current_index(), 1);
        assert_eq!(back.scenes.active.gap_ms, 750);
        assert_eq!(back.scenes.chain(), &[1, 0, 1]);
        back.scenes.select_scene(0);
        assert_eq!(back.scenes.active.gap_ms, 500);
    }
}
