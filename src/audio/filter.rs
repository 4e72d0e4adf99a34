// Chamberlin state-variable filter, one channel. Cutoff and resonance are
// fixed at trigger time; the voice owns one state per channel.

use crate::kit::FilterKind;

#[derive(Clone, Copy, Debug)]
pub struct VoiceFilter {
    kind: FilterKind,
    f: f32,
    damp: f32,
    low: f32,
    band: f32,
    bypass: bool,
}

impl VoiceFilter {
    pub fn new(kind: FilterKind, cutoff: f32, q: f32, sample_rate: f32) -> Self {
        // a wide-open lowpass is a no-op; skip the state updates entirely
        let bypass = kind == FilterKind::LowPass && cutoff >= 18_000.0 && q <= 0.01;
        let cutoff = cutoff.clamp(20.0, sample_rate * 0.45);
        let f = (2.0 * (std::f32::consts::PI * cutoff / sample_rate).sin()).min(1.0);
        let damp = 2.0 * (1.0 - q.clamp(0.0, 0.98)).min(1.0);
        Self { kind, f, damp, low: 0.0, band: 0.0, bypass }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        if self.bypass {
            return x;
        }
        self.low += self.f * self.band;
        let high = x - self.low - self.damp * self.band;
        self.band += self.f * high;
        match self.kind {
            FilterKind::LowPass => self.low,
            FilterKind::HighPass => high,
        }
    }
}
