//! Pipeline tuning.
//!
//! Every gain and threshold used by the conditioner, integrator, stroke
//! store and ribbon builder lives in one struct so a front-end can swap the
//! whole feel of the experience without touching pipeline code.

use crate::constants::*;

#[derive(Clone, Debug)]
pub struct MotionTuning {
    // Signal conditioning
    pub bias_adapt_fast: f32,
    pub bias_adapt_slow: f32,
    pub bias_fast_window: u64,
    pub low_pass_alpha: f32,
    pub accel_scale: f32,
    pub stale_decay: f32,
    pub energy_norm: f32,
    pub energy_alpha: f32,

    // Integration
    pub deadzone: f32,
    pub rest_damping: f32,
    pub zvu_gyro_threshold: f32,
    pub integration_gain: f32,
    pub position_gain: f32,
    pub velocity_damping: f32,
    pub velocity_snap: f32,
    pub max_dt: f32,

    // Cadence
    pub physics_interval: f32,

    // Strokes
    pub min_point_spacing: f32,
    pub max_stroke_points: usize,
    pub rebuild_throttle_len: usize,

    // Ribbon geometry
    pub ribbon_min_width: f32,
    pub ribbon_width_multiplier: f32,

    // Particle trail
    pub particle_lifetime: f32,
    pub particle_base_rate: f32,
    pub particle_energy_rate: f32,
    pub particle_jitter: f32,
    pub max_particles: usize,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            bias_adapt_fast: BIAS_ADAPT_FAST,
            bias_adapt_slow: BIAS_ADAPT_SLOW,
            bias_fast_window: BIAS_FAST_WINDOW,
            low_pass_alpha: LOW_PASS_ALPHA,
            accel_scale: ACCEL_SCALE,
            stale_decay: STALE_DECAY,
            energy_norm: ENERGY_NORM,
            energy_alpha: ENERGY_ALPHA,
            deadzone: DEADZONE,
            rest_damping: REST_DAMPING,
            zvu_gyro_threshold: ZVU_GYRO_THRESHOLD,
            integration_gain: INTEGRATION_GAIN,
            position_gain: POSITION_GAIN,
            velocity_damping: VELOCITY_DAMPING,
            velocity_snap: VELOCITY_SNAP,
            max_dt: MAX_DT_SECONDS,
            physics_interval: PHYSICS_INTERVAL_SECONDS,
            min_point_spacing: MIN_POINT_SPACING,
            max_stroke_points: MAX_STROKE_POINTS,
            rebuild_throttle_len: REBUILD_THROTTLE_LEN,
            ribbon_min_width: RIBBON_MIN_WIDTH,
            ribbon_width_multiplier: RIBBON_WIDTH_MULTIPLIER,
            particle_lifetime: PARTICLE_LIFETIME,
            particle_base_rate: PARTICLE_BASE_RATE,
            particle_energy_rate: PARTICLE_ENERGY_RATE,
            particle_jitter: PARTICLE_JITTER,
            max_particles: MAX_PARTICLES,
        }
    }
}
