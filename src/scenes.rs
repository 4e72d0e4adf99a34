// Scene slots and story-mode chains. A fixed number of slots, each lazily
// materialized with an empty sentence and the default gap; the active
// sentence always belongs to the current scene and is written back on
// every switch.

use crate::sequencer::SentenceToken;
use crate::shared::{DEFAULT_GAP_MS, NUM_SCENES};

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub gap_ms: u64,
    pub sentence: Vec<SentenceToken>,
}

impl Default for Scene {
    fn default() -> Self {
        Self { gap_ms: DEFAULT_GAP_MS, sentence: Vec::new() }
    }
}

struct ChainRun {
    entries: Vec<usize>,
    pos: usize,
}

pub struct SceneChainManager {
    slots: Vec<Option<Scene>>,
    current: usize,
    // the scene being composed/played right now; saved back to its slot on
    // every switch
    pub active: Scene,
    chain: Vec<usize>,
    run: Option<ChainRun>,
}

impl Default for SceneChainManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneChainManager {
    pub fn new() -> Self {
        Self {
            slots: (0..NUM_SCENES).map(|_| None).collect(),
            current: 0,
            active: Scene::default(),
            chain: Vec::new(),
            run: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn chain(&self) -> &[usize] {
        &self.chain
    }

    pub fn set_chain(&mut self, chain: Vec<usize>) {
        // duplicates are legal; out-of-range entries are not
        self.chain = chain.into_iter().filter(|&i| i < self.slots.len()).collect();
    }

    // Save the outgoing scene and load (materializing if untouched) the
    // incoming one. Returns false for an out-of-range index.
    pub fn select_scene(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        self.slots[self.current] = Some(self.active.clone());
        self.current = index;
        self.active = self.slots[index].clone().unwrap_or_default();
        self.slots[index] = Some(self.active.clone());
        true
    }

    // Story mode: an empty chain plays every slot once in order.
    pub fn begin_chain(&mut self) {
        let entries = if self.chain.is_empty() {
            (0..self.slots.len()).collect()
        } else {
            self.chain.clone()
        };
        self.run = Some(ChainRun { entries, pos: 0 });
    }

    pub fn chain_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn cancel_chain(&mut self) {
        self.run = None;
    }

    // Next chain entry, or None when the run is exhausted (clearing it).
    pub fn advance_chain(&mut self) -> Option<usize> {
        let run = self.run.as_mut()?;
        if run.pos >= run.entries.len() {
            self.run = None;
            return None;
        }
        let index = run.entries[run.pos];
        run.pos += 1;
        Some(index)
    }

    // Copy for serialization; a chain run in flight is transient state and
    // is not persisted.
    pub fn clone_for_save(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            current: self.current,
            active: self.active.clone(),
            chain: self.chain.clone(),
            run: None,
        }
    }

    // doc layer access
    pub fn slots(&self) -> &[Option<Scene>] {
        &self.slots
    }

    pub fn restore(slots: Vec<Option<Scene>>, current: usize, chain: Vec<usize>) -> Self {
        let mut slots = slots;
        slots.resize_with(NUM_SCENES.max(slots.len()), || None);
        let current = current.min(slots.len().saturating_sub(1));
        let active = slots
            .get(current)
            .and_then(|s| s.clone())
            .unwrap_or_default();
        let mut mgr = Self { slots, current, active, chain: Vec::new(), run: None };
        mgr.set_chain(chain);
        mgr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str) -> SentenceToken {
        SentenceToken {
            group: "g".into(),
            index: 0,
            name: name.into(),
            text: name.into(),
            color: "#fff".into(),
        }
    }

    #[test]
    fn switching_back_restores_the_exact_sentence_and_gap() {
        let mut mgr = SceneChainManager::new();
        mgr.active.sentence = vec![token("water"), token("please")];
        mgr.active.gap_ms = 400;

        mgr.select_scene(1);
        assert!(mgr.active.sentence.is_empty());
        assert_eq!(mgr.active.gap_ms, DEFAULT_GAP_MS);
        mgr.active.sentence = vec![token("more")];

        mgr.select_scene(0);
        assert_eq!(mgr.active.sentence, vec![token("water"), token("please")]);
        assert_eq!(mgr.active.gap_ms, 400);

        mgr.select_scene(1);
        assert_eq!(mgr.active.sentence, vec![token("more")]);
    }

    #[test]
    fn out_of_range_scene_is_refused() {
        let mut mgr = SceneChainManager::new();
        assert!(!mgr.select_scene(NUM_SCENES));
        assert_eq!(mgr.current_index(), 0);
    }

    #[test]
    fn empty_chain_defaults_to_every_slot_in_order() {
        let mut mgr = SceneChainManager::new();
        mgr.begin_chain();
        let visited: Vec<usize> = std::iter::from_fn(|| mgr.advance_chain()).collect();
        assert_eq!(visited, (0..NUM_SCENES).collect::<Vec<_>>());
        assert!(!mgr.chain_running());
    }

    #[test]
    fn explicit_chain_allows_duplicates_and_omissions() {
        let mut mgr = SceneChainManager::new();
        mgr.set_chain(vec![2, 0, 2, 99]);
        mgr.begin_chain();
        let visited: Vec<usize> = std::iter::from_fn(|| mgr.advance_chain()).collect();
        assert_eq!(visited, vec![2, 0, 2]);
    }

    #[test]
    fn cancel_ends_the_run() {
        let mut mgr = SceneChainManager::new();
        mgr.begin_chain();
        assert!(mgr.advance_chain().is_some());
        mgr.cancel_chain();
        assert_eq!(mgr.advance_chain(), None);
    }
}
