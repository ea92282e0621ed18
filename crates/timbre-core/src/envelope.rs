//! Peak envelope follower with separate attack and release.

use libm::expf;

/// One-pole smoothing coefficient for a time constant of `ms` milliseconds.
///
/// `exp(-1 / (ms * sample_rate / 1000))`. A zero or negative time yields `0`
/// (instant response).
#[inline]
pub fn time_constant_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms * sample_rate / 1000.0;
    if samples <= 0.0 {
        0.0
    } else {
        expf(-1.0 / samples)
    }
}

/// Tracks the rectified amplitude of a signal.
///
/// ```rust
/// use timbre_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(48000.0, 5.0, 50.0);
/// for _ in 0..4800 {
///     env.process(1.0);
/// }
/// assert!(env.level() > 0.99);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    level: f32,
    attack: f32,
    release: f32,
}

impl EnvelopeFollower {
    /// Follower with the given attack and release times.
    pub fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            level: 0.0,
            attack: time_constant_coeff(attack_ms, sample_rate),
            release: time_constant_coeff(release_ms, sample_rate),
        }
    }

    /// Feed one sample and return the updated envelope.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let x = input.abs();
        let coeff = if x > self.level {
            self.attack
        } else {
            self.release
        };
        self.level = coeff * self.level + (1.0 - coeff) * x;
        self.level
    }

    /// Current envelope without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Drop the envelope to zero.
    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_faster_than_release() {
        let mut env = EnvelopeFollower::new(48000.0, 1.0, 200.0);
        for _ in 0..480 {
            env.process(1.0);
        }
        let peak = env.level();
        assert!(peak > 0.99);
        for _ in 0..480 {
            env.process(0.0);
        }
        // 10 ms into a 200 ms release has barely moved
        assert!(env.level() > 0.9 * peak);
    }

    #[test]
    fn zero_time_is_instant() {
        assert_eq!(time_constant_coeff(0.0, 48000.0), 0.0);
        let mut env = EnvelopeFollower::new(48000.0, 0.0, 0.0);
        assert_eq!(env.process(-0.7), 0.7);
        assert_eq!(env.process(0.2), 0.2);
    }
}
