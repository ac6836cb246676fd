//! Device orientation tracking.
//!
//! Maintains the current device (or pointer-proxy) pose as a unit
//! quaternion, expressed relative to the pose at experience start. One Euler
//! convention is used everywhere: intrinsic YXZ, i.e. yaw (alpha) about Y,
//! then pitch (beta) about X, then roll (gamma) about Z. The pointer fallback
//! composes through the same convention so the integrator never has to know
//! which input path is live.

use glam::{EulerRot, Quat, Vec2};

#[derive(Clone, Debug)]
pub struct OrientationTracker {
    /// Inverse of the first valid pose; all output is relative to it.
    zero_inverse: Option<Quat>,
    current: Quat,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self {
            zero_inverse: None,
            current: Quat::IDENTITY,
        }
    }

    /// Feed a device-orientation reading (alpha, beta, gamma in degrees).
    pub fn update_euler_degrees(&mut self, alpha: f32, beta: f32, gamma: f32) -> Quat {
        let absolute = Quat::from_euler(
            EulerRot::YXZ,
            alpha.to_radians(),
            beta.to_radians(),
            gamma.to_radians(),
        );
        self.apply(absolute)
    }

    /// Pointer fallback: normalized screen coordinates in [0, 1] mapped to
    /// yaw/pitch with zero roll, through the same YXZ composition.
    pub fn update_pointer(&mut self, uv: Vec2) -> Quat {
        let yaw = (uv.x - 0.5) * std::f32::consts::PI;
        let pitch = (uv.y - 0.5) * std::f32::consts::FRAC_PI_2;
        let absolute = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
        self.apply(absolute)
    }

    fn apply(&mut self, absolute: Quat) -> Quat {
        let zero_inverse = *self.zero_inverse.get_or_insert_with(|| absolute.inverse());
        self.current = (zero_inverse * absolute).normalize();
        self.current
    }

    /// Current pose relative to the zero reference.
    pub fn orientation(&self) -> Quat {
        self.current
    }

    /// Drop the zero reference; the next reading re-anchors.
    pub fn reset(&mut self) {
        self.zero_inverse = None;
        self.current = Quat::IDENTITY;
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}
