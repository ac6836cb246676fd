// Canonical tuning constants for the motion pipeline. `MotionTuning::default()`
// reads from here; front-ends that want a different feel override the struct.

// Signal conditioning
pub const BIAS_ADAPT_FAST: f32 = 0.05; // bias convergence rate for the first samples
pub const BIAS_ADAPT_SLOW: f32 = 0.005; // steady-state bias adaptation
pub const BIAS_FAST_WINDOW: u64 = 100; // samples before dropping to the slow rate
pub const LOW_PASS_ALPHA: f32 = 0.3; // acceleration jitter suppression
pub const ACCEL_SCALE: f32 = 1.0; // device units to world units
pub const STALE_DECAY: f32 = 0.6; // per-tick multiplier when no fresh sample arrived
pub const ENERGY_NORM: f32 = 320.0; // rotation-rate magnitude (deg/s) mapping to energy 1.0
pub const ENERGY_ALPHA: f32 = 0.2; // energy exponential average

// Integration
pub const DEADZONE: f32 = 0.12; // world-space acceleration magnitude treated as rest
pub const REST_DAMPING: f32 = 0.6; // velocity multiplier while inside the deadzone
pub const ZVU_GYRO_THRESHOLD: f32 = 12.0; // deg/s below which rotation counts as still
pub const INTEGRATION_GAIN: f32 = 1.0;
pub const POSITION_GAIN: f32 = 1.0;
pub const VELOCITY_DAMPING: f32 = 0.92; // per-tick multiplicative damping
pub const VELOCITY_SNAP: f32 = 1e-3; // speeds below this snap to zero
pub const MAX_DT_SECONDS: f32 = 0.1; // clamp for backgrounded-tab sized gaps

// Cadence
pub const PHYSICS_INTERVAL_SECONDS: f32 = 1.0 / 45.0; // fixed sample rate gate

// Strokes
pub const MIN_POINT_SPACING: f32 = 0.01; // decimation distance for appended points
pub const MAX_STROKE_POINTS: usize = 2048; // ceiling before older points are thinned
pub const REBUILD_THROTTLE_LEN: usize = 512; // above this, rebuild every 4th point

// Ribbon geometry
pub const RIBBON_MIN_WIDTH: f32 = 0.015; // half-width at zero energy
pub const RIBBON_WIDTH_MULTIPLIER: f32 = 0.08; // extra half-width at full energy

// Particle trail
pub const PARTICLE_LIFETIME: f32 = 1.4; // seconds
pub const PARTICLE_BASE_RATE: f32 = 6.0; // spawns per second at zero energy
pub const PARTICLE_ENERGY_RATE: f32 = 40.0; // extra spawns per second at full energy
pub const PARTICLE_JITTER: f32 = 0.05; // velocity jitter amplitude
pub const MAX_PARTICLES: usize = 512;
