// The kit data model: groups of pads and their playback parameters.
// Pure data plus clamped field setters; runtime voice state lives in the
// engine, persistence shape lives in doc.rs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::StereoFrame;
use crate::shared::{MAX_GRID_DIM, PadRef};
use crate::wav::{self, AudioClip};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PadMode {
    #[default]
    Retrigger,
    ToggleStart,
    ToggleResume,
    Record,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    #[default]
    LowPass,
    HighPass,
}

// seconds each; sustain is a level 0..1
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub a: f32,
    pub d: f32,
    pub s: f32,
    pub r: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self { a: 0.005, d: 0.01, s: 1.0, r: 0.1 }
    }
}

// A pad's decoded sample, ready for the render engine. Frames are shared
// with active voices via Arc so reassigning a pad's audio never mutates a
// buffer a sounding voice is reading.
#[derive(Clone, Debug)]
pub struct PadSample {
    pub frames: Arc<Vec<StereoFrame>>,
    pub sample_rate: u32,
    pub duration: f32, // seconds, at the clip's own rate
}

impl PadSample {
    pub fn from_clip(clip: &AudioClip) -> Self {
        let n = clip.frames();
        let left = clip.channels.first();
        let right = clip.channels.get(1).or(left);
        let frames = (0..n)
            .map(|i| StereoFrame {
                left: left.map(|c| c[i]).unwrap_or(0.0),
                right: right.map(|c| c[i]).unwrap_or(0.0),
            })
            .collect();
        Self {
            frames: Arc::new(frames),
            sample_rate: clip.sample_rate,
            duration: clip.duration_secs(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pad {
    pub name: String,
    pub phrase: String,
    pub sample: Option<PadSample>,
    // base64 WAV text form, regenerated whenever the sample changes; empty
    // when the pad has no audio
    pub audio_text: String,
    pub image: Option<String>,
    pub gain: f32,
    pub pan: f32,
    pub filter: FilterKind,
    pub cutoff: f32,
    pub q: f32,
    pub env: Adsr,
    pub tune: i32,
    pub fine: f32,
    pub looped: bool,
    pub reverse: bool,
    // reserved: declared but not enforced anywhere in the trigger path
    pub choke: Option<u32>,
    pub mode: PadMode,
}

impl Default for Pad {
    fn default() -> Self {
        Self {
            name: String::new(),
            phrase: String::new(),
            sample: None,
            audio_text: String::new(),
            image: None,
            gain: 1.0,
            pan: 0.0,
            filter: FilterKind::LowPass,
            cutoff: 20_000.0,
            q: 0.0,
            env: Adsr::default(),
            tune: 0,
            fine: 0.0,
            looped: false,
            reverse: false,
            choke: None,
            mode: PadMode::Retrigger,
        }
    }
}

impl Pad {
    // phrase for sentence tokens and speech fallback; name when blank
    pub fn spoken_text(&self) -> &str {
        if self.phrase.trim().is_empty() { &self.name } else { &self.phrase }
    }

    // Assign decoded audio and regenerate the persisted encoding together,
    // so the two can never drift apart across a save.
    pub fn assign_clip(&mut self, clip: &AudioClip) {
        self.audio_text = wav::encode_text(clip).unwrap_or_default();
        self.sample = Some(PadSample::from_clip(clip));
    }

    pub fn set_gain(&mut self, value: f32) {
        self.gain = value.clamp(0.0, 2.0);
    }

    pub fn set_pan(&mut self, value: f32) {
        self.pan = value.clamp(-1.0, 1.0);
    }

    pub fn set_filter(&mut self, kind: FilterKind, cutoff: f32, q: f32) {
        self.filter = kind;
        self.cutoff = cutoff.clamp(20.0, 20_000.0);
        self.q = q.clamp(0.0, 1.0);
    }

    pub fn set_env(&mut self, env: Adsr) {
        self.env = Adsr {
            a: env.a.max(0.0),
            d: env.d.max(0.0),
            s: env.s.clamp(0.0, 1.0),
            r: env.r.max(0.0),
        };
    }
}

#[derive(Clone, Debug)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub color: String,
    pub pads: Vec<Pad>,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rows: usize, cols: usize) -> Self {
        let rows = rows.clamp(1, MAX_GRID_DIM);
        let cols = cols.clamp(1, MAX_GRID_DIM);
        let mut pads = Vec::new();
        pads.resize_with(rows * cols, Pad::default);
        Self {
            id: id.into(),
            name: name.into(),
            rows,
            cols,
            color: "#888888".to_string(),
            pads,
        }
    }

    // Existing pads keep their index; growth fills with fresh defaults,
    // shrinking truncates.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows.clamp(1, MAX_GRID_DIM);
        self.cols = cols.clamp(1, MAX_GRID_DIM);
        self.pads.resize_with(self.rows * self.cols, Pad::default);
    }
}

#[derive(Clone, Debug, Default)]
pub struct Kit {
    pub groups: Vec<Group>,
    pub visible: Vec<String>,
}

impl Kit {
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn pad(&self, at: &PadRef) -> Option<&Pad> {
        self.group(&at.group)?.pads.get(at.index)
    }

    pub fn pad_mut(&mut self, at: &PadRef) -> Option<&mut Pad> {
        self.group_mut(&at.group)?.pads.get_mut(at.index)
    }

    pub fn toggle_visible(&mut self, id: &str) {
        if let Some(pos) = self.visible.iter().position(|v| v == id) {
            self.visible.remove(pos);
        } else if self.group(id).is_some() {
            self.visible.push(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_preserves_pads_by_index() {
        let mut g = Group::new("g", "Test", 2, 2);
        g.pads[1].name = "water".into();
        g.resize(3, 3);
        assert_eq!(g.pads.len(), 9);
        assert_eq!(g.pads[1].name, "water");
        g.resize(1, 1);
        assert_eq!(g.pads.len(), 1);
    }

    #[test]
    fn grid_dimensions_clamp() {
        let mut g = Group::new("g", "Test", 0, 40);
        assert_eq!((g.rows, g.cols), (1, 12));
        g.resize(99, 0);
        assert_eq!((g.rows, g.cols), (12, 1));
    }

    #[test]
    fn field_setters_clamp() {
        let mut p = Pad::default();
        p.set_gain(5.0);
        assert_eq!(p.gain, 2.0);
        p.set_pan(-3.0);
        assert_eq!(p.pan, -1.0);
        p.set_env(Adsr { a: -1.0, d: 0.5, s: 2.0, r: 0.2 });
        assert_eq!(p.env.a, 0.0);
        assert_eq!(p.env.s, 1.0);
    }

    #[test]
    fn spoken_text_falls_back_to_name() {
        let mut p = Pad { name: "water".into(), ..Pad::default() };
        assert_eq!(p.spoken_text(), "water");
        p.phrase = "  ".into();
        assert_eq!(p.spoken_text(), "water");
        p.phrase = "I want water".into();
        assert_eq!(p.spoken_text(), "I want water");
    }
}
