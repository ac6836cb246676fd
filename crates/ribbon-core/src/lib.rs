//! Motion-to-geometry pipeline: conditions noisy device sensor streams into
//! a world-space trajectory, accumulates it into colored strokes, builds
//! twist-free ribbon meshes, and records sessions for deterministic replay.

pub mod config;
pub mod constants;
pub mod integrator;
pub mod orientation;
pub mod particles;
pub mod ribbon;
pub mod session;
pub mod signal;
pub mod stroke;

pub use config::MotionTuning;
pub use integrator::{MotionIntegrator, MotionState};
pub use orientation::OrientationTracker;
pub use particles::{Particle, ParticleTrail};
pub use ribbon::{build_ribbon, build_ribbon_folded, RibbonMesh, RibbonVertex};
pub use session::{LogEntry, SessionController, SessionError, SessionPhase};
pub use signal::{Conditioned, SignalConditioner, StagedMotion};
pub use stroke::{rgb_from_hex, Stroke, StrokeStore, TracePoint};
