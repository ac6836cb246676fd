//! Sensor signal conditioning.
//!
//! Turns raw, biased, partially-populated device samples into a clean
//! device-space acceleration plus a scalar motion energy. Bias removal uses
//! a two-phase exponential estimator: fast adaptation while the device
//! settles after start, then a slow steady-state rate that tracks thermal
//! drift without fighting real motion.
//!
//! Stale-input policy: if no fresh sample arrived since the last tick the
//! filtered acceleration decays multiplicatively toward zero. Holding the
//! last value instead would integrate phantom motion for as long as the
//! platform stays quiet.

use glam::Vec3;

use crate::config::MotionTuning;

/// Raw device-motion fields staged by a platform callback. Either field may
/// be absent on a given event; absent means "no update this tick".
#[derive(Clone, Copy, Debug, Default)]
pub struct StagedMotion {
    pub acceleration: Option<Vec3>,
    pub rotation_rate: Option<Vec3>,
}

/// Output of one conditioning pass, consumed by the integrator.
#[derive(Clone, Copy, Debug)]
pub struct Conditioned {
    /// Bias-removed, low-passed acceleration in device space.
    pub acceleration: Vec3,
    /// Smoothed motion energy in [0, 1].
    pub energy: f32,
    /// Last observed rotation-rate magnitude (deg/s), for the ZVU check.
    pub rotation_magnitude: f32,
}

#[derive(Clone, Debug)]
pub struct SignalConditioner {
    bias: Vec3,
    filtered: Vec3,
    energy_avg: f32,
    rotation_magnitude: f32,
    samples_seen: u64,
}

impl SignalConditioner {
    pub fn new() -> Self {
        Self {
            bias: Vec3::ZERO,
            filtered: Vec3::ZERO,
            energy_avg: 0.0,
            rotation_magnitude: 0.0,
            samples_seen: 0,
        }
    }

    /// Condition one physics tick's worth of input. `raw` is `None` when no
    /// sensor event arrived since the previous tick.
    pub fn condition(&mut self, raw: Option<&StagedMotion>, tuning: &MotionTuning) -> Conditioned {
        let accel = raw.and_then(|r| r.acceleration);
        let rotation = raw.and_then(|r| r.rotation_rate);

        match accel {
            Some(a) => {
                let adapt = if self.samples_seen < tuning.bias_fast_window {
                    tuning.bias_adapt_fast
                } else {
                    tuning.bias_adapt_slow
                };
                self.bias += adapt * (a - self.bias);
                let centered = (a - self.bias) * tuning.accel_scale;
                self.filtered += tuning.low_pass_alpha * (centered - self.filtered);
                self.samples_seen += 1;
            }
            None => {
                self.filtered *= tuning.stale_decay;
            }
        }

        if let Some(rate) = rotation {
            self.rotation_magnitude = rate.length();
            let raw_energy = self.rotation_magnitude / tuning.energy_norm;
            self.energy_avg += tuning.energy_alpha * (raw_energy - self.energy_avg);
        }

        Conditioned {
            acceleration: self.filtered,
            energy: self.energy_avg.clamp(0.0, 1.0),
            rotation_magnitude: self.rotation_magnitude,
        }
    }

    /// Current bias estimate, for diagnostics.
    pub fn bias(&self) -> Vec3 {
        self.bias
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SignalConditioner {
    fn default() -> Self {
        Self::new()
    }
}
