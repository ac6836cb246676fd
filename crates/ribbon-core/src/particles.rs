//! Ambient particle trail along the trajectory.
//!
//! Peripheral to the drawing pipeline: consumes the position stream and the
//! energy scalar, nothing else. Spawn jitter comes from a seeded RNG so a
//! given seed always produces the same trail for the same trajectory.

use glam::Vec3;
use rand::prelude::*;

use crate::config::MotionTuning;

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
    pub lifetime: f32,
}

impl Particle {
    /// Remaining life in [0, 1]; render alpha tracks this.
    pub fn fade(&self) -> f32 {
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

pub struct ParticleTrail {
    particles: Vec<Particle>,
    spawn_accum: f32,
    rng: StdRng,
}

impl ParticleTrail {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            spawn_accum: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Advance ages, retire dead particles, spawn new ones at the emitter.
    pub fn step(&mut self, dt: f32, emitter: Vec3, energy: f32, tuning: &MotionTuning) {
        let mut i = 0usize;
        while i < self.particles.len() {
            let p = &mut self.particles[i];
            p.age += dt;
            if p.age >= p.lifetime {
                self.particles.swap_remove(i);
                continue;
            }
            p.position += p.velocity * dt;
            i += 1;
        }

        let rate = tuning.particle_base_rate + energy * tuning.particle_energy_rate;
        self.spawn_accum += rate * dt;
        while self.spawn_accum >= 1.0 {
            self.spawn_accum -= 1.0;
            if self.particles.len() >= tuning.max_particles {
                break;
            }
            let jitter = Vec3::new(
                self.rng.gen::<f32>() - 0.5,
                self.rng.gen::<f32>() - 0.5,
                self.rng.gen::<f32>() - 0.5,
            ) * (2.0 * tuning.particle_jitter);
            self.particles.push(Particle {
                position: emitter,
                velocity: jitter,
                age: 0.0,
                lifetime: tuning.particle_lifetime,
            });
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.spawn_accum = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particles_spawn_and_retire() {
        let tuning = MotionTuning::default();
        let mut trail = ParticleTrail::new(7);

        for _ in 0..30 {
            trail.step(1.0 / 30.0, Vec3::ZERO, 1.0, &tuning);
        }
        assert!(!trail.particles().is_empty());

        // Step past the lifetime with spawning suppressed by zero rate.
        let mut quiet = tuning.clone();
        quiet.particle_base_rate = 0.0;
        quiet.particle_energy_rate = 0.0;
        for _ in 0..120 {
            trail.step(1.0 / 30.0, Vec3::ZERO, 0.0, &quiet);
        }
        assert!(trail.particles().is_empty());
    }

    #[test]
    fn energy_raises_spawn_rate() {
        let tuning = MotionTuning::default();
        let mut calm = ParticleTrail::new(1);
        let mut excited = ParticleTrail::new(1);
        for _ in 0..30 {
            calm.step(1.0 / 30.0, Vec3::ZERO, 0.0, &tuning);
            excited.step(1.0 / 30.0, Vec3::ZERO, 1.0, &tuning);
        }
        assert!(excited.particles().len() > calm.particles().len());
    }

    #[test]
    fn population_respects_the_cap() {
        let mut tuning = MotionTuning::default();
        tuning.max_particles = 10;
        let mut trail = ParticleTrail::new(3);
        for _ in 0..300 {
            trail.step(1.0 / 30.0, Vec3::ZERO, 1.0, &tuning);
        }
        assert!(trail.particles().len() <= 10);
    }

    #[test]
    fn fade_runs_from_one_to_zero() {
        let p = Particle {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            age: 0.0,
            lifetime: 2.0,
        };
        assert!((p.fade() - 1.0).abs() < 1e-6);
        let old = Particle { age: 2.0, ..p };
        assert_eq!(old.fade(), 0.0);
    }
}
