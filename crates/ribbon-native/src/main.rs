//! Mouse-driven demo of the ribbon pipeline.
//!
//! The mouse stands in for the device sensors: pointer position feeds the
//! orientation fallback, pointer velocity becomes the device-space
//! acceleration proxy, and pointer speed becomes the rotation-rate proxy so
//! ribbon width responds to how fast you move. Rendering is a software
//! wireframe of the exact vertex/index buffers the pipeline hands to a real
//! renderer.
//!
//! Controls: hold the left button to paint, 1-5 pick colors, K cycles the
//! kaleidoscope fold count, R replays the session, S stops it, Enter starts
//! a new one, N resets keeping the log, Backspace resets fully, Q quits.

use std::time::{Duration, Instant};

use glam::{Mat4, Vec2, Vec3, Vec4};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use ribbon_core::{MotionTuning, SessionController, SessionPhase};

const WIN_W: usize = 960;
const WIN_H: usize = 600;
const BG_COLOR: u32 = 0xFF10101C;
const PARTICLE_COLOR: [f32; 3] = [0.75, 0.8, 1.0];

// Pointer-proxy gains: velocity -> acceleration, speed -> rotation rate.
const ACCEL_GAIN: f32 = 4.0;
const ROTATION_GAIN: f32 = 900.0;

const PALETTE: [[f32; 3]; 5] = [
    [0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 0.85, 0.2],
    [0.35, 1.0, 0.45],
    [1.0, 0.4, 0.3],
];

const FOLD_STEPS: [u32; 4] = [1, 4, 6, 8];

/// Pointer state carried between frames to derive the motion proxy.
#[derive(Default)]
struct PointerProxy {
    prev_uv: Option<Vec2>,
}

impl PointerProxy {
    /// Map this frame's pointer position to (uv, acceleration, rotation).
    fn sample(&mut self, uv: Vec2, dt: f32) -> (Vec2, Vec3, Vec3) {
        let velocity = match self.prev_uv {
            Some(prev) if dt > 1e-6 => (uv - prev) / dt,
            _ => Vec2::ZERO,
        };
        self.prev_uv = Some(uv);
        // Screen Y grows downward; world Y grows upward.
        let accel = Vec3::new(velocity.x, -velocity.y, 0.0) * ACCEL_GAIN;
        let rotation = Vec3::new(velocity.y, velocity.x, 0.0) * ROTATION_GAIN;
        (uv, accel, rotation)
    }
}

struct Viewer {
    window: Window,
    buf: Vec<u32>,
    camera_target: Vec3,
}

impl Viewer {
    fn new() -> anyhow::Result<Self> {
        let mut window = Window::new(
            "Ribbon — motion drawing",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("window init: {e}"))?;
        window.limit_update_rate(Some(Duration::from_millis(16)));
        Ok(Self {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            camera_target: Vec3::ZERO,
        })
    }

    fn view_proj(&self) -> Mat4 {
        let aspect = WIN_W as f32 / WIN_H as f32;
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, aspect, 0.1, 100.0);
        let eye = self.camera_target + Vec3::new(0.0, 0.4, 4.0);
        let view = Mat4::look_at_rh(eye, self.camera_target, Vec3::Y);
        proj * view
    }

    fn project(&self, vp: &Mat4, p: Vec3) -> Option<(i32, i32)> {
        let clip = *vp * Vec4::from((p, 1.0));
        if clip.w <= 1e-4 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = ((ndc.x + 1.0) * 0.5 * WIN_W as f32) as i32;
        let y = ((1.0 - ndc.y) * 0.5 * WIN_H as f32) as i32;
        Some((x, y))
    }

    fn plot(&mut self, x: i32, y: i32, color: u32) {
        if (0..WIN_W as i32).contains(&x) && (0..WIN_H as i32).contains(&y) {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn draw_line(&mut self, a: (i32, i32), b: (i32, i32), color: u32) {
        let (mut x, mut y) = a;
        let dx = (b.0 - a.0).abs();
        let dy = -(b.1 - a.1).abs();
        let sx = if a.0 < b.0 { 1 } else { -1 };
        let sy = if a.1 < b.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x, y, color);
            if x == b.0 && y == b.1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn render(&mut self, session: &SessionController) {
        self.buf.fill(BG_COLOR);
        // Ease the camera toward the trace head.
        self.camera_target += (session.head_position() - self.camera_target) * 0.05;
        let vp = self.view_proj();

        for stroke in session.strokes() {
            let Some(mesh) = stroke.mesh() else { continue };
            let color = pack_rgb(stroke.color);
            // Wireframe straight off the index buffer, so folds come along
            // for free.
            for tri in mesh.indices.chunks_exact(3) {
                let mut screen = [None; 3];
                for (slot, &index) in screen.iter_mut().zip(tri) {
                    let v = mesh.vertices[index as usize].position;
                    *slot = self.project(&vp, Vec3::from_array(v));
                }
                for (i, j) in [(0, 1), (1, 2), (2, 0)] {
                    if let (Some(a), Some(b)) = (screen[i], screen[j]) {
                        self.draw_line(a, b, color);
                    }
                }
            }
        }

        for particle in session.particles() {
            if let Some((x, y)) = self.project(&vp, particle.position) {
                let c = pack_rgb([
                    PARTICLE_COLOR[0] * particle.fade(),
                    PARTICLE_COLOR[1] * particle.fade(),
                    PARTICLE_COLOR[2] * particle.fade(),
                ]);
                self.plot(x, y, c);
                self.plot(x + 1, y, c);
                self.plot(x, y + 1, c);
            }
        }
    }

    fn present(&mut self, status: &str) -> anyhow::Result<()> {
        self.window.set_title(status);
        self.window
            .update_with_buffer(&self.buf, WIN_W, WIN_H)
            .map_err(|e| anyhow::anyhow!("present: {e}"))
    }
}

fn pack_rgb(rgb: [f32; 3]) -> u32 {
    let r = (rgb[0].clamp(0.0, 1.0) * 255.0) as u32;
    let g = (rgb[1].clamp(0.0, 1.0) * 255.0) as u32;
    let b = (rgb[2].clamp(0.0, 1.0) * 255.0) as u32;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

fn phase_label(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "idle",
        SessionPhase::Recording => "recording",
        SessionPhase::Stopped => "stopped",
        SessionPhase::Replaying => "replaying",
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut viewer = Viewer::new()?;
    let mut session = SessionController::new(MotionTuning::default(), 42);
    let mut proxy = PointerProxy::default();
    let mut fold_index = 0usize;

    session.start_session()?;
    session.set_color(PALETTE[0]);

    let mut last = Instant::now();
    while viewer.window.is_open() && !viewer.window.is_key_down(Key::Q) {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        // --- input: keys map onto the session control surface ---
        let pressed = |w: &Window, k| w.is_key_pressed(k, KeyRepeat::No);
        if pressed(&viewer.window, Key::Enter) {
            if session.phase() != SessionPhase::Idle {
                session.reset_session(false);
            }
            session.start_session()?;
            proxy.prev_uv = None;
        }
        if pressed(&viewer.window, Key::S) && session.phase() == SessionPhase::Recording {
            session.stop_session()?;
        }
        if pressed(&viewer.window, Key::R) {
            if session.phase() == SessionPhase::Recording {
                session.stop_session()?;
            }
            if let Err(e) = session.replay_session() {
                log::warn!("replay unavailable: {e}");
            }
        }
        if pressed(&viewer.window, Key::N) {
            session.reset_session(true);
        }
        if pressed(&viewer.window, Key::Backspace) {
            session.reset_session(false);
        }
        if pressed(&viewer.window, Key::K) {
            fold_index = (fold_index + 1) % FOLD_STEPS.len();
            session.toggle_kaleidoscope(FOLD_STEPS[fold_index]);
        }
        for (i, key) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5]
            .iter()
            .enumerate()
        {
            if pressed(&viewer.window, *key) {
                session.set_color(PALETTE[i]);
            }
        }

        // --- mouse proxy: stage sensor data, paint while held ---
        if let Some((mx, my)) = viewer.window.get_mouse_pos(MouseMode::Clamp) {
            let uv = Vec2::new(mx / WIN_W as f32, my / WIN_H as f32);
            let (uv, accel, rotation) = proxy.sample(uv, dt);
            session.stage_pointer(uv);
            session.stage_motion(Some(accel), Some(rotation));
        }
        if session.phase() == SessionPhase::Recording {
            session.toggle_stroke(viewer.window.get_mouse_down(MouseButton::Left));
        }

        // --- the single animation tick ---
        session.advance(dt);
        if session.take_replay_completed() {
            log::info!("replay finished");
        }

        viewer.render(&session);
        let status = format!(
            "Ribbon [{}] strokes {} points {} log {}",
            phase_label(session.phase()),
            session.strokes().len(),
            session.point_count(),
            session.log_len(),
        );
        viewer.present(&status)?;
    }
    Ok(())
}
