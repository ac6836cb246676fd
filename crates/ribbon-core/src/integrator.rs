//! Damped numerical integration from conditioned acceleration to position.
//!
//! The chain per tick: rotate device-space acceleration into world space,
//! soft deadzone, zero-velocity update, damped velocity integration, then
//! position. Stability matters more than physical fidelity here; every
//! stage is biased toward returning to rest.

use glam::{Quat, Vec3};

use crate::config::MotionTuning;
use crate::signal::Conditioned;
use crate::stroke::TracePoint;

/// Mutable physics state for one session. Reset to zero on session start.
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionState {
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Clone, Debug)]
pub struct MotionIntegrator {
    state: MotionState,
    /// Consecutive ticks with both acceleration and rotation below their
    /// stillness thresholds. More than one in a row triggers the ZVU clamp.
    still_ticks: u32,
}

impl MotionIntegrator {
    pub fn new() -> Self {
        Self {
            state: MotionState::default(),
            still_ticks: 0,
        }
    }

    /// Advance the state by `dt` seconds and produce the next trace point.
    pub fn step(
        &mut self,
        conditioned: &Conditioned,
        orientation: Quat,
        dt: f32,
        tuning: &MotionTuning,
    ) -> TracePoint {
        // A backgrounded tab can hand us a multi-second gap; one giant step
        // would fling the trace across the scene.
        let dt = dt.clamp(0.0, tuning.max_dt);

        let mut world = orientation * conditioned.acceleration;
        let magnitude = world.length();

        let accel_still = magnitude < tuning.deadzone;
        if accel_still {
            world = Vec3::ZERO;
            self.state.velocity *= tuning.rest_damping;
        } else {
            // Subtract the deadzone from the magnitude so motion onset ramps
            // from zero instead of stepping.
            world *= (magnitude - tuning.deadzone) / magnitude;
        }

        let rotation_still = conditioned.rotation_magnitude < tuning.zvu_gyro_threshold;
        if accel_still && rotation_still {
            self.still_ticks = self.still_ticks.saturating_add(1);
        } else {
            self.still_ticks = 0;
        }
        if self.still_ticks > 1 {
            // Zero-velocity update: the device is at rest, kill drift now.
            world = Vec3::ZERO;
            self.state.velocity = Vec3::ZERO;
        }

        self.state.velocity += world * dt * tuning.integration_gain;
        self.state.velocity *= tuning.velocity_damping;
        if self.state.velocity.length() < tuning.velocity_snap {
            self.state.velocity = Vec3::ZERO;
        }

        self.state.position += self.state.velocity * dt * tuning.position_gain;

        TracePoint::new(self.state.position, conditioned.energy)
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = MotionState::default();
        self.still_ticks = 0;
    }
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditioned(accel: Vec3, energy: f32, rotation: f32) -> Conditioned {
        Conditioned {
            acceleration: accel,
            energy,
            rotation_magnitude: rotation,
        }
    }

    const DT: f32 = 1.0 / 45.0;

    #[test]
    fn stillness_converges_to_fixed_point() {
        let tuning = MotionTuning::default();
        let mut integrator = MotionIntegrator::new();

        // Kick it into motion first.
        for _ in 0..30 {
            integrator.step(
                &conditioned(Vec3::new(2.0, 0.0, 0.0), 0.5, 100.0),
                Quat::IDENTITY,
                DT,
                &tuning,
            );
        }
        assert!(integrator.state().velocity.length() > 0.0);

        // Near-zero input for longer than the ZVU window.
        for _ in 0..10 {
            integrator.step(
                &conditioned(Vec3::new(1e-4, 0.0, 0.0), 0.0, 0.1),
                Quat::IDENTITY,
                DT,
                &tuning,
            );
        }
        let settled = integrator.state();
        assert_eq!(settled.velocity, Vec3::ZERO);

        // Position must not creep once settled.
        for _ in 0..100 {
            integrator.step(
                &conditioned(Vec3::ZERO, 0.0, 0.0),
                Quat::IDENTITY,
                DT,
                &tuning,
            );
        }
        assert_eq!(integrator.state().position, settled.position);
    }

    #[test]
    fn deadzone_monotonicity() {
        let tuning = MotionTuning::default();
        let below = tuning.deadzone * 0.5;
        let above = tuning.deadzone * 4.0;

        let run = |mag: f32| {
            let mut integrator = MotionIntegrator::new();
            for _ in 0..50 {
                integrator.step(
                    &conditioned(Vec3::new(mag, 0.0, 0.0), 0.5, 100.0),
                    Quat::IDENTITY,
                    DT,
                    &tuning,
                );
            }
            integrator.state().velocity.length()
        };

        assert!(run(below) <= run(above));
        // Sub-deadzone input produces no sustained velocity at all.
        assert!(run(below) < 1e-6);
    }

    #[test]
    fn deadzone_onset_is_smooth() {
        let tuning = MotionTuning::default();
        let mut integrator = MotionIntegrator::new();
        // Just over the threshold: the effective acceleration is the excess,
        // not the full magnitude.
        let just_over = tuning.deadzone * 1.01;
        let point = integrator.step(
            &conditioned(Vec3::new(just_over, 0.0, 0.0), 0.0, 100.0),
            Quat::IDENTITY,
            DT,
            &tuning,
        );
        assert!(point.position.length() < just_over * DT * DT);
    }

    #[test]
    fn orientation_rotates_acceleration_into_world() {
        let tuning = MotionTuning::default();
        let mut integrator = MotionIntegrator::new();
        // Yaw 90°: device +Z acceleration should move the trace along world X.
        let yaw = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        for _ in 0..20 {
            integrator.step(
                &conditioned(Vec3::new(0.0, 0.0, 1.0), 0.5, 100.0),
                yaw,
                DT,
                &tuning,
            );
        }
        let pos = integrator.state().position;
        assert!(pos.x.abs() > 10.0 * pos.z.abs());
    }

    #[test]
    fn huge_dt_is_clamped() {
        let tuning = MotionTuning::default();
        let mut clamped = MotionIntegrator::new();
        let mut reference = MotionIntegrator::new();
        let input = conditioned(Vec3::new(3.0, 0.0, 0.0), 0.5, 100.0);

        clamped.step(&input, Quat::IDENTITY, 30.0, &tuning);
        reference.step(&input, Quat::IDENTITY, tuning.max_dt, &tuning);

        assert_eq!(
            clamped.state().position,
            reference.state().position
        );
    }

    #[test]
    fn bounded_input_keeps_position_bounded() {
        let tuning = MotionTuning::default();
        let mut integrator = MotionIntegrator::new();
        for i in 0..2000 {
            // Decaying oscillating input.
            let decay = (-(i as f32) / 300.0).exp();
            integrator.step(
                &conditioned(Vec3::new(2.0 * decay, 0.0, 0.0), 0.5, 100.0),
                Quat::IDENTITY,
                DT,
                &tuning,
            );
        }
        assert!(integrator.state().position.is_finite());
        assert!(integrator.state().position.length() < 1000.0);
    }
}
