//! Session control: the live pipeline, the recorder, and the replayer.
//!
//! `SessionController` owns every pipeline stage and is the only mutator of
//! the stroke store. Sensor callbacks stage data and return; conditioning,
//! integration, appending and mesh rebuilds all happen inside `advance`,
//! the single animation tick, so the renderer never observes a half-built
//! mesh. Physics runs on a fixed-rate gate decoupled from display refresh.
//!
//! Recording logs one entry per accepted physics tick. Replay feeds those
//! entries, one per animation tick, straight into the stroke store while
//! bypassing the sensor stages, so a replayed session reproduces the
//! original stroke geometry bit for bit.

use glam::{Vec2, Vec3};
use thiserror::Error;

use crate::config::MotionTuning;
use crate::integrator::MotionIntegrator;
use crate::orientation::OrientationTracker;
use crate::particles::ParticleTrail;
use crate::signal::{SignalConditioner, StagedMotion};
use crate::stroke::{Stroke, StrokeStore, TracePoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Recording,
    Stopped,
    Replaying,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionPhase,
        to: SessionPhase,
    },
}

impl SessionPhase {
    /// The legal edges of the session state machine. Reset (any -> Idle) is
    /// always allowed.
    fn permits(self, to: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, to),
            (Idle, Recording) | (Recording, Stopped) | (Stopped, Replaying) | (Replaying, Stopped)
        ) || to == Idle
    }
}

/// One recorded physics tick: everything replay needs to reproduce the
/// tick's visible effect without re-running the sensor or physics stages.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogEntry {
    pub point: TracePoint,
    pub painting: bool,
    pub color: [f32; 3],
    pub fold_count: u32,
    pub dt: f32,
}

pub struct SessionController {
    tuning: MotionTuning,
    phase: SessionPhase,
    /// Gate for late-firing sensor callbacks after stop/reset.
    active: bool,

    // Orthogonal paint sub-state, sampled at each tick.
    painting: bool,
    color: [f32; 3],
    fold_count: u32,

    conditioner: SignalConditioner,
    orientation: OrientationTracker,
    integrator: MotionIntegrator,
    strokes: StrokeStore,
    trail: ParticleTrail,

    log: Vec<LogEntry>,
    replay_cursor: usize,
    replay_completed: bool,

    // Data staged by sensor callbacks, consumed by the next physics tick.
    staged: Option<StagedMotion>,
    pending_euler: Option<Vec3>,
    pending_pointer: Option<Vec2>,

    /// Elapsed-time accumulator for the fixed physics rate.
    accum: f32,
    /// Most recent trajectory position, live or replayed.
    head: Vec3,
}

impl SessionController {
    pub fn new(tuning: MotionTuning, particle_seed: u64) -> Self {
        Self {
            tuning,
            phase: SessionPhase::Idle,
            active: false,
            painting: false,
            color: [1.0, 1.0, 1.0],
            fold_count: 1,
            conditioner: SignalConditioner::new(),
            orientation: OrientationTracker::new(),
            integrator: MotionIntegrator::new(),
            strokes: StrokeStore::new(),
            trail: ParticleTrail::new(particle_seed),
            log: Vec::new(),
            replay_cursor: 0,
            replay_completed: false,
            staged: None,
            pending_euler: None,
            pending_pointer: None,
            accum: 0.0,
            head: Vec3::ZERO,
        }
    }

    fn transition(&mut self, to: SessionPhase) -> Result<(), SessionError> {
        if !self.phase.permits(to) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        log::info!("session {:?} -> {:?}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    // ---------------- control surface ----------------

    /// Begin a live session: fresh motion state, fresh log, recording on.
    pub fn start_session(&mut self) -> Result<(), SessionError> {
        self.transition(SessionPhase::Recording)?;
        self.conditioner.reset();
        self.orientation.reset();
        self.integrator.reset();
        self.strokes.clear();
        self.trail.clear();
        self.log.clear();
        self.replay_cursor = 0;
        self.replay_completed = false;
        self.staged = None;
        self.pending_euler = None;
        self.pending_pointer = None;
        self.accum = 0.0;
        self.head = Vec3::ZERO;
        self.active = true;
        if self.painting {
            self.strokes.start_stroke(self.color, self.fold_count);
        }
        Ok(())
    }

    /// Stop the live session. Halts physics synchronously; staged sensor
    /// data is dropped and late callbacks are ignored via the active flag.
    pub fn stop_session(&mut self) -> Result<(), SessionError> {
        self.transition(SessionPhase::Stopped)?;
        self.active = false;
        self.staged = None;
        self.pending_euler = None;
        self.pending_pointer = None;
        self.strokes.rebuild_all(&self.tuning);
        log::info!(
            "session stopped: {} strokes, {} points, {} log entries",
            self.strokes.strokes().len(),
            self.strokes.point_count(),
            self.log.len()
        );
        Ok(())
    }

    /// Toggle painting. Turning it on opens a new stroke with the current
    /// color and fold count. Ignored while a replay owns the paint state.
    pub fn toggle_stroke(&mut self, active: bool) {
        if self.phase != SessionPhase::Replaying {
            self.apply_painting(active);
        }
    }

    /// Change the draw color. While painting this closes the current stroke
    /// and opens a new one, exactly like a paint toggle would.
    pub fn set_color(&mut self, color: [f32; 3]) {
        if self.phase != SessionPhase::Replaying {
            self.apply_color(color);
        }
    }

    /// Change the kaleidoscope fold count (1 = off). Segments like a color
    /// change while painting.
    pub fn toggle_kaleidoscope(&mut self, fold_count: u32) {
        if self.phase != SessionPhase::Replaying {
            self.apply_fold(fold_count);
        }
    }

    fn apply_painting(&mut self, active: bool) {
        if active == self.painting {
            return;
        }
        self.painting = active;
        if active {
            self.strokes.start_stroke(self.color, self.fold_count);
        } else {
            // Closing a stroke flushes its final geometry.
            self.strokes.rebuild_all(&self.tuning);
        }
    }

    fn apply_color(&mut self, color: [f32; 3]) {
        if color == self.color {
            return;
        }
        self.color = color;
        if self.painting {
            self.strokes.start_stroke(self.color, self.fold_count);
        }
    }

    fn apply_fold(&mut self, fold_count: u32) {
        let fold_count = fold_count.max(1);
        if fold_count == self.fold_count {
            return;
        }
        self.fold_count = fold_count;
        if self.painting {
            self.strokes.start_stroke(self.color, self.fold_count);
        }
    }

    /// Replay the recorded log from the top. The stroke store is rebuilt
    /// from scratch; an empty log completes immediately without error.
    pub fn replay_session(&mut self) -> Result<(), SessionError> {
        self.transition(SessionPhase::Replaying)?;
        self.strokes.clear();
        self.trail.clear();
        self.integrator.reset();
        self.replay_cursor = 0;
        self.replay_completed = false;
        self.painting = false;
        if self.log.is_empty() {
            log::warn!("replaying an empty log; completing immediately");
            self.finish_replay();
        }
        Ok(())
    }

    /// Drop session state and return to Idle. `keep_log` preserves the
    /// recorded log so the session can still be replayed after a re-start.
    pub fn reset_session(&mut self, keep_log: bool) {
        // Any -> Idle is always legal; ignore the impossible error.
        let _ = self.transition(SessionPhase::Idle);
        self.active = false;
        self.painting = false;
        self.conditioner.reset();
        self.orientation.reset();
        self.integrator.reset();
        self.strokes.clear();
        self.trail.clear();
        self.replay_cursor = 0;
        self.replay_completed = false;
        self.staged = None;
        self.pending_euler = None;
        self.pending_pointer = None;
        self.accum = 0.0;
        self.head = Vec3::ZERO;
        if !keep_log {
            self.log.clear();
        }
    }

    // ---------------- sensor staging (platform callbacks) ----------------

    /// Stage a device-motion event. Fields merge so acceleration-only and
    /// rotation-only events both contribute to the next tick.
    pub fn stage_motion(&mut self, acceleration: Option<Vec3>, rotation_rate: Option<Vec3>) {
        if !self.active {
            return;
        }
        let staged = self.staged.get_or_insert_with(StagedMotion::default);
        if acceleration.is_some() {
            staged.acceleration = acceleration;
        }
        if rotation_rate.is_some() {
            staged.rotation_rate = rotation_rate;
        }
    }

    /// Stage a device-orientation event (alpha, beta, gamma in degrees).
    pub fn stage_orientation(&mut self, alpha: f32, beta: f32, gamma: f32) {
        if !self.active {
            return;
        }
        self.pending_euler = Some(Vec3::new(alpha, beta, gamma));
    }

    /// Stage a pointer-fallback position in normalized [0, 1] coordinates.
    pub fn stage_pointer(&mut self, uv: Vec2) {
        if !self.active {
            return;
        }
        self.pending_pointer = Some(uv);
    }

    // ---------------- the animation tick ----------------

    /// Advance the session by `dt` seconds of wall time. Called once per
    /// animation frame; physics fires through the fixed-rate gate, replay
    /// consumes exactly one log entry per call.
    pub fn advance(&mut self, dt: f32) {
        match self.phase {
            SessionPhase::Recording => self.live_tick(dt),
            SessionPhase::Replaying => self.replay_tick(),
            SessionPhase::Idle | SessionPhase::Stopped => {}
        }
    }

    fn live_tick(&mut self, dt: f32) {
        self.accum += dt;
        if self.accum < self.tuning.physics_interval {
            return;
        }
        let step_dt = self.accum.min(self.tuning.max_dt);
        self.accum = 0.0;

        // Orientation first so this tick's acceleration maps through the
        // pose that accompanied it. Device events win over the pointer proxy.
        if let Some(euler) = self.pending_euler.take() {
            self.orientation.update_euler_degrees(euler.x, euler.y, euler.z);
            self.pending_pointer = None;
        } else if let Some(uv) = self.pending_pointer.take() {
            self.orientation.update_pointer(uv);
        }

        let staged = self.staged.take();
        let conditioned = self.conditioner.condition(staged.as_ref(), &self.tuning);
        let point = self.integrator.step(
            &conditioned,
            self.orientation.orientation(),
            step_dt,
            &self.tuning,
        );

        if self.painting {
            self.strokes.append(point, &self.tuning);
        }
        self.trail.step(step_dt, point.position, point.energy, &self.tuning);
        self.log.push(LogEntry {
            point,
            painting: self.painting,
            color: self.color,
            fold_count: self.fold_count,
            dt: step_dt,
        });
        self.strokes.rebuild_dirty(&self.tuning);
        self.head = point.position;
    }

    fn replay_tick(&mut self) {
        let Some(entry) = self.log.get(self.replay_cursor).copied() else {
            self.finish_replay();
            return;
        };
        self.replay_cursor += 1;

        // Apply the entry's paint sub-state through the same segmentation
        // rules as the live control surface.
        self.apply_painting(entry.painting);
        self.apply_color(entry.color);
        self.apply_fold(entry.fold_count);

        if entry.painting {
            self.strokes.append(entry.point, &self.tuning);
        }
        self.trail
            .step(entry.dt, entry.point.position, entry.point.energy, &self.tuning);
        self.strokes.rebuild_dirty(&self.tuning);
        self.head = entry.point.position;

        if self.replay_cursor >= self.log.len() {
            self.finish_replay();
        }
    }

    fn finish_replay(&mut self) {
        self.painting = false;
        self.strokes.rebuild_all(&self.tuning);
        // Replaying -> Stopped is always legal here; the only other caller
        // is replay_session itself, already in Replaying.
        let _ = self.transition(SessionPhase::Stopped);
        self.replay_completed = true;
        log::info!(
            "replay complete: {} strokes, {} points",
            self.strokes.strokes().len(),
            self.strokes.point_count()
        );
    }

    // ---------------- render-consumer surface ----------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_painting(&self) -> bool {
        self.painting
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn fold_count(&self) -> u32 {
        self.fold_count
    }

    /// Strokes in drawing order, each carrying its color and cached mesh.
    pub fn strokes(&self) -> &[Stroke] {
        self.strokes.strokes()
    }

    /// Current trajectory position for camera-follow and emitters.
    pub fn head_position(&self) -> Vec3 {
        self.head
    }

    pub fn particles(&self) -> &[crate::particles::Particle] {
        self.trail.particles()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub fn point_count(&self) -> usize {
        self.strokes.point_count()
    }

    /// Latched completion signal for external UI; reading clears it.
    pub fn take_replay_completed(&mut self) -> bool {
        std::mem::take(&mut self.replay_completed)
    }
}
