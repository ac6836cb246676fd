//! Ribbon strip geometry.
//!
//! Converts a stroke's point sequence into a two-rail triangle-strip mesh.
//! Side vectors come from a parallel-transport approximation: the frame at
//! each point is derived from the frame at the previous point, never from a
//! fixed reference axis, so the ribbon does not flip when the tangent sweeps
//! past the world up vector. The transport state lives entirely in this
//! call's locals; each stroke seeds and carries its own frame.

use glam::{Quat, Vec3};

use crate::config::MotionTuning;
use crate::stroke::TracePoint;

/// One ribbon vertex, laid out for direct GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RibbonVertex {
    pub position: [f32; 3],
}

/// Two vertices per point, two triangles per segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RibbonMesh {
    pub vertices: Vec<RibbonVertex>,
    pub indices: Vec<u32>,
}

impl RibbonMesh {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build the ribbon mesh for one stroke. Fewer than 2 points is a no-op.
pub fn build_ribbon(points: &[TracePoint], tuning: &MotionTuning) -> Option<RibbonMesh> {
    if points.len() < 2 {
        return None;
    }

    let mut mesh = RibbonMesh {
        vertices: Vec::with_capacity(points.len() * 2),
        indices: Vec::with_capacity((points.len() - 1) * 6),
    };
    emit_rails(points, tuning, Quat::IDENTITY, &mut mesh);
    Some(mesh)
}

/// Kaleidoscope variant: the base ribbon plus `fold_count - 1` copies
/// rotated about the world Y axis, concatenated into one mesh.
pub fn build_ribbon_folded(
    points: &[TracePoint],
    fold_count: u32,
    tuning: &MotionTuning,
) -> Option<RibbonMesh> {
    if points.len() < 2 {
        return None;
    }
    let folds = fold_count.max(1) as usize;
    let mut mesh = RibbonMesh {
        vertices: Vec::with_capacity(points.len() * 2 * folds),
        indices: Vec::with_capacity((points.len() - 1) * 6 * folds),
    };
    for k in 0..folds {
        let angle = (k as f32) * std::f32::consts::TAU / (folds as f32);
        emit_rails(points, tuning, Quat::from_rotation_y(angle), &mut mesh);
    }
    Some(mesh)
}

fn emit_rails(points: &[TracePoint], tuning: &MotionTuning, fold: Quat, mesh: &mut RibbonMesh) {
    let base = mesh.vertices.len() as u32;

    let mut tangent = tangent_at(points, 0).unwrap_or(Vec3::Z);
    let mut side = seed_side(tangent);

    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            if let Some(next) = tangent_at(points, i) {
                tangent = next;
            }
            // Re-derive the side from the previous frame. A degenerate cross
            // product (tangent parallel to the carried side) keeps the old
            // frame instead of poisoning the mesh with NaN.
            let binormal = tangent.cross(side);
            if binormal.length_squared() > f32::EPSILON {
                side = binormal.cross(tangent).normalize();
            }
        }

        let half_width = tuning.ribbon_min_width + point.energy * tuning.ribbon_width_multiplier;
        let left = fold * (point.position - side * half_width);
        let right = fold * (point.position + side * half_width);
        mesh.vertices.push(RibbonVertex {
            position: left.to_array(),
        });
        mesh.vertices.push(RibbonVertex {
            position: right.to_array(),
        });
    }

    for i in 0..(points.len() as u32 - 1) {
        let a = base + i * 2;
        mesh.indices
            .extend_from_slice(&[a, a + 1, a + 2, a + 1, a + 3, a + 2]);
    }
}

/// Forward difference, backward at the end of the sequence. `None` when the
/// difference is degenerate (coincident points).
fn tangent_at(points: &[TracePoint], i: usize) -> Option<Vec3> {
    let delta = if i + 1 < points.len() {
        points[i + 1].position - points[i].position
    } else {
        points[i].position - points[i - 1].position
    };
    let tangent = delta.normalize_or_zero();
    (tangent != Vec3::ZERO).then_some(tangent)
}

/// First side vector: a fixed reference axis projected orthogonal to the
/// first tangent, falling back to X when the tangent runs along Y.
fn seed_side(tangent: Vec3) -> Vec3 {
    for reference in [Vec3::Y, Vec3::X] {
        let projected = reference - tangent * reference.dot(tangent);
        let side = projected.normalize_or_zero();
        if side != Vec3::ZERO {
            return side;
        }
    }
    Vec3::X
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32, y: f32, z: f32, energy: f32) -> TracePoint {
        TracePoint::new(Vec3::new(x, y, z), energy)
    }

    #[test]
    fn too_few_points_build_nothing() {
        let tuning = MotionTuning::default();
        assert!(build_ribbon(&[], &tuning).is_none());
        assert!(build_ribbon(&[point(0.0, 0.0, 0.0, 0.5)], &tuning).is_none());
    }

    #[test]
    fn two_points_make_one_quad() {
        let tuning = MotionTuning::default();
        let mesh = build_ribbon(
            &[point(0.0, 0.0, 0.0, 0.0), point(1.0, 0.0, 0.0, 0.0)],
            &tuning,
        )
        .unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn energy_widens_the_ribbon() {
        let tuning = MotionTuning::default();
        let narrow = build_ribbon(
            &[point(0.0, 0.0, 0.0, 0.0), point(1.0, 0.0, 0.0, 0.0)],
            &tuning,
        )
        .unwrap();
        let wide = build_ribbon(
            &[point(0.0, 0.0, 0.0, 1.0), point(1.0, 0.0, 0.0, 1.0)],
            &tuning,
        )
        .unwrap();

        let rail_gap = |mesh: &RibbonMesh| {
            let l = Vec3::from_array(mesh.vertices[0].position);
            let r = Vec3::from_array(mesh.vertices[1].position);
            (r - l).length()
        };
        assert!(rail_gap(&wide) > rail_gap(&narrow) * 2.0);
    }

    #[test]
    fn transport_frame_survives_tangent_reversal() {
        let tuning = MotionTuning::default();
        // Semicircle in the XZ plane: the tangent sweeps through 180°,
        // passing parallel to X and antiparallel to the start direction.
        let points: Vec<TracePoint> = (0..=32)
            .map(|i| {
                let theta = std::f32::consts::PI * (i as f32) / 32.0;
                point(theta.cos(), 0.0, theta.sin(), 0.3)
            })
            .collect();
        let mesh = build_ribbon(&points, &tuning).unwrap();

        // Reconstruct per-point side directions from the rails and check no
        // consecutive pair flips.
        let mut prev_side: Option<Vec3> = None;
        for i in 0..points.len() {
            let l = Vec3::from_array(mesh.vertices[i * 2].position);
            let r = Vec3::from_array(mesh.vertices[i * 2 + 1].position);
            let side = (r - l).normalize();
            if let Some(prev) = prev_side {
                assert!(
                    prev.dot(side) > 0.5,
                    "side vector flipped at point {i}: {prev:?} -> {side:?}"
                );
            }
            prev_side = Some(side);
        }
    }

    #[test]
    fn coincident_points_do_not_poison_the_mesh() {
        let tuning = MotionTuning::default();
        let mesh = build_ribbon(
            &[
                point(0.0, 0.0, 0.0, 0.2),
                point(0.0, 0.0, 0.0, 0.2),
                point(1.0, 0.0, 0.0, 0.2),
            ],
            &tuning,
        )
        .unwrap();
        for v in &mesh.vertices {
            assert!(v.position.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn vertical_stroke_still_seeds_a_side() {
        let tuning = MotionTuning::default();
        // Tangent along Y defeats the primary reference axis.
        let mesh = build_ribbon(
            &[point(0.0, 0.0, 0.0, 0.0), point(0.0, 1.0, 0.0, 0.0)],
            &tuning,
        )
        .unwrap();
        let l = Vec3::from_array(mesh.vertices[0].position);
        let r = Vec3::from_array(mesh.vertices[1].position);
        assert!((r - l).length() > 0.0);
    }

    #[test]
    fn folding_multiplies_geometry() {
        let tuning = MotionTuning::default();
        let points = [point(1.0, 0.0, 0.0, 0.1), point(1.0, 1.0, 0.0, 0.1)];
        let plain = build_ribbon(&points, &tuning).unwrap();
        let folded = build_ribbon_folded(&points, 6, &tuning).unwrap();
        assert_eq!(folded.vertices.len(), plain.vertices.len() * 6);
        assert_eq!(folded.triangle_count(), plain.triangle_count() * 6);
        // Indices of later folds reference their own vertex range.
        assert!(folded.indices.iter().all(|&i| (i as usize) < folded.vertices.len()));
    }

    #[test]
    fn fold_count_one_matches_plain_build() {
        let tuning = MotionTuning::default();
        let points = [point(0.0, 0.0, 0.0, 0.4), point(0.5, 0.2, 0.0, 0.6)];
        assert_eq!(
            build_ribbon_folded(&points, 1, &tuning),
            build_ribbon(&points, &tuning)
        );
    }

    #[test]
    fn byte_views_match_buffer_sizes() {
        let tuning = MotionTuning::default();
        let mesh = build_ribbon(
            &[point(0.0, 0.0, 0.0, 0.0), point(1.0, 0.0, 0.0, 0.0)],
            &tuning,
        )
        .unwrap();
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertices.len() * 12);
        assert_eq!(mesh.index_bytes().len(), mesh.indices.len() * 4);
    }
}
