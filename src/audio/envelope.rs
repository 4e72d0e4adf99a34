// Per-voice gain envelope. Attack ramps 0→1 linearly, decay ramps
// 1→sustain linearly, then the level holds. Release is an exponential
// approach to silence with time constant `r`, pre-scheduled at a sample
// position computed at trigger time (the estimated end of playback);
// a voice with no scheduled release holds sustain until stopped.

use crate::kit::Adsr;

pub struct VoiceEnvelope {
    attack_samples: f32,
    decay_samples: f32,
    sustain: f32,
    // per-sample multiplier during release: exp(-1 / (r * sample_rate))
    release_coeff: f32,
    release_at: Option<u64>,
    pos: u64,
    release_level: f32,
    released: bool,
}

impl VoiceEnvelope {
    pub fn new(env: Adsr, sample_rate: f32, release_at_secs: Option<f32>) -> Self {
        let release_coeff = if env.r > 0.0 {
            (-1.0 / (env.r * sample_rate)).exp()
        } else {
            0.0
        };
        Self {
            // zero-length stages are skipped by the branch ordering below
            attack_samples: (env.a * sample_rate).max(0.0),
            decay_samples: (env.d * sample_rate).max(0.0),
            sustain: env.s.clamp(0.0, 1.0),
            release_coeff,
            release_at: release_at_secs.map(|t| (t.max(0.0) * sample_rate) as u64),
            pos: 0,
            release_level: 0.0,
            released: false,
        }
    }

    // Level for the current sample; advances one sample per call.
    pub fn next_level(&mut self) -> f32 {
        let level = if self.released {
            self.release_level *= self.release_coeff;
            self.release_level
        } else {
            let t = self.pos as f32;
            let base = if t < self.attack_samples {
                t / self.attack_samples
            } else if t < self.attack_samples + self.decay_samples {
                let frac = (t - self.attack_samples) / self.decay_samples;
                1.0 + (self.sustain - 1.0) * frac
            } else {
                self.sustain
            };
            if self.release_at.is_some_and(|r| self.pos >= r) {
                self.released = true;
                self.release_level = base;
            }
            base
        };
        self.pos += 1;
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1_000.0;

    fn levels(env: &mut VoiceEnvelope, n: usize) -> Vec<f32> {
        (0..n).map(|_| env.next_level()).collect()
    }

    #[test]
    fn attack_ramps_linearly_to_one() {
        let adsr = Adsr { a: 0.1, d: 0.1, s: 0.5, r: 0.1 };
        let mut env = VoiceEnvelope::new(adsr, SR, None);
        let out = levels(&mut env, 100);
        assert!((out[50] - 0.5).abs() < 0.02);
        assert!((out[99] - 1.0).abs() < 0.02);
    }

    #[test]
    fn decay_settles_on_sustain() {
        let adsr = Adsr { a: 0.01, d: 0.05, s: 0.6, r: 0.1 };
        let mut env = VoiceEnvelope::new(adsr, SR, None);
        let out = levels(&mut env, 200);
        assert!((out[199] - 0.6).abs() < 1e-3);
    }

    #[test]
    fn scheduled_release_decays_exponentially() {
        let adsr = Adsr { a: 0.001, d: 0.001, s: 1.0, r: 0.02 };
        let mut env = VoiceEnvelope::new(adsr, SR, Some(0.1));
        levels(&mut env, 100); // up to the scheduled release point
        let after = levels(&mut env, 100);
        // one time constant (20 samples) drops to ~1/e
        assert!(after[20] < 0.45 && after[20] > 0.25, "got {}", after[20]);
        assert!(after[99] < 0.02);
    }

    #[test]
    fn no_scheduled_release_holds_sustain() {
        let adsr = Adsr { a: 0.001, d: 0.001, s: 0.8, r: 0.02 };
        let mut env = VoiceEnvelope::new(adsr, SR, None);
        let out = levels(&mut env, 5_000);
        assert!((out[4_999] - 0.8).abs() < 1e-3);
    }
}
