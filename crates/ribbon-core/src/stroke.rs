//! Strokes and the stroke store.
//!
//! A stroke is one continuous drawn curve of uniform color and fold mode.
//! The store only ever appends to the most recent stroke; a new stroke is
//! started on explicit paint/color/fold transitions, never because the
//! pipeline merely ticked. Meshes are rebuilt lazily from a dirty flag so
//! rebuilds stay confined to the animation tick.

use glam::Vec3;
use smallvec::SmallVec;

use crate::config::MotionTuning;
use crate::ribbon::{build_ribbon, build_ribbon_folded, RibbonMesh};

/// One sample of the drawn trajectory. Immutable once appended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracePoint {
    pub position: Vec3,
    pub energy: f32,
}

impl TracePoint {
    pub fn new(position: Vec3, energy: f32) -> Self {
        Self {
            position,
            energy: energy.clamp(0.0, 1.0),
        }
    }
}

/// Parse a `#rrggbb` hex color into linear-ish [0,1] RGB components.
/// Returns `None` for anything that is not exactly six hex digits.
pub fn rgb_from_hex(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some([
        ((value >> 16) & 0xFF) as f32 / 255.0,
        ((value >> 8) & 0xFF) as f32 / 255.0,
        (value & 0xFF) as f32 / 255.0,
    ])
}

#[derive(Clone, Debug)]
pub struct Stroke {
    points: Vec<TracePoint>,
    pub color: [f32; 3],
    pub fold_count: u32,
    mesh: Option<RibbonMesh>,
    mesh_dirty: bool,
    /// Accepted points since the last rebuild, for the rebuild throttle.
    points_since_rebuild: usize,
}

impl Stroke {
    fn new(color: [f32; 3], fold_count: u32) -> Self {
        Self {
            points: Vec::new(),
            color,
            fold_count: fold_count.max(1),
            mesh: None,
            mesh_dirty: false,
            points_since_rebuild: 0,
        }
    }

    pub fn points(&self) -> &[TracePoint] {
        &self.points
    }

    /// The cached ribbon mesh, if the stroke has one yet.
    pub fn mesh(&self) -> Option<&RibbonMesh> {
        self.mesh.as_ref()
    }

    fn rebuild(&mut self, tuning: &MotionTuning) {
        self.mesh = if self.fold_count > 1 {
            build_ribbon_folded(&self.points, self.fold_count, tuning)
        } else {
            build_ribbon(&self.points, tuning)
        };
        self.mesh_dirty = false;
        self.points_since_rebuild = 0;
    }
}

#[derive(Debug, Default)]
pub struct StrokeStore {
    strokes: SmallVec<[Stroke; 4]>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self {
            strokes: SmallVec::new(),
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }

    /// Begin a new stroke. An empty active stroke with identical attributes
    /// is reused so repeated transitions cannot churn out empty strokes.
    pub fn start_stroke(&mut self, color: [f32; 3], fold_count: u32) {
        if let Some(active) = self.strokes.last_mut() {
            if active.points.is_empty() {
                active.color = color;
                active.fold_count = fold_count.max(1);
                return;
            }
        }
        log::debug!(
            "starting stroke {} (fold {})",
            self.strokes.len(),
            fold_count.max(1)
        );
        self.strokes.push(Stroke::new(color, fold_count));
    }

    /// Append a point to the active stroke. Points closer to the stroke's
    /// last point than the spacing threshold are rejected. Returns whether
    /// the point was accepted.
    pub fn append(&mut self, point: TracePoint, tuning: &MotionTuning) -> bool {
        let Some(stroke) = self.strokes.last_mut() else {
            return false;
        };
        if let Some(last) = stroke.points.last() {
            if (point.position - last.position).length() < tuning.min_point_spacing {
                return false;
            }
        }
        stroke.points.push(point);
        stroke.mesh_dirty = true;
        stroke.points_since_rebuild += 1;

        if stroke.points.len() > tuning.max_stroke_points {
            thin_points(&mut stroke.points);
        }
        true
    }

    /// Recompute meshes for strokes whose points changed. The sole caller is
    /// the animation tick. Long strokes rebuild every 4th accepted point;
    /// skipped states stay dirty and flush on the next eligible pass.
    pub fn rebuild_dirty(&mut self, tuning: &MotionTuning) {
        for stroke in self.strokes.iter_mut() {
            if !stroke.mesh_dirty {
                continue;
            }
            if stroke.points.len() > tuning.rebuild_throttle_len
                && stroke.points_since_rebuild < 4
            {
                continue;
            }
            stroke.rebuild(tuning);
        }
    }

    /// Flush every dirty mesh regardless of the throttle. Used when a stroke
    /// is being closed so its final geometry is never left stale.
    pub fn rebuild_all(&mut self, tuning: &MotionTuning) {
        for stroke in self.strokes.iter_mut() {
            if stroke.mesh_dirty {
                stroke.rebuild(tuning);
            }
        }
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }
}

/// Drop every second point, oldest first, keeping the newest point so the
/// pen never visibly jumps. Preserves overall shape while halving memory.
fn thin_points(points: &mut Vec<TracePoint>) {
    let len = points.len();
    let mut keep = 0usize;
    for i in 0..len {
        if i % 2 == 1 || i == len - 1 {
            points[keep] = points[i];
            keep += 1;
        }
    }
    points.truncate(keep);
    log::debug!("thinned stroke from {len} to {keep} points");
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYAN: [f32; 3] = [0.0, 1.0, 1.0];

    fn tuning() -> MotionTuning {
        MotionTuning::default()
    }

    fn pt(x: f32) -> TracePoint {
        TracePoint::new(Vec3::new(x, 0.0, 0.0), 0.5)
    }

    #[test]
    fn sub_spacing_points_are_rejected() {
        let tuning = tuning();
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 1);
        assert!(store.append(pt(0.0), &tuning));
        let before = store.point_count();
        // Far below the spacing threshold.
        for i in 0..50 {
            store.append(pt(i as f32 * tuning.min_point_spacing * 0.01), &tuning);
        }
        assert_eq!(store.point_count(), before);
    }

    #[test]
    fn append_without_stroke_is_a_noop() {
        let mut store = StrokeStore::new();
        assert!(!store.append(pt(0.0), &tuning()));
        assert_eq!(store.point_count(), 0);
    }

    #[test]
    fn start_stroke_reuses_empty_active() {
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 1);
        store.start_stroke([1.0, 0.0, 1.0], 3);
        store.start_stroke(CYAN, 1);
        assert_eq!(store.strokes().len(), 1);
        assert_eq!(store.strokes()[0].color, CYAN);
    }

    #[test]
    fn transitions_with_points_start_new_strokes() {
        let tuning = tuning();
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 1);
        store.append(pt(0.0), &tuning);
        store.append(pt(1.0), &tuning);
        store.start_stroke([1.0, 0.0, 1.0], 1);
        store.append(pt(2.0), &tuning);
        assert_eq!(store.strokes().len(), 2);
        assert_eq!(store.strokes()[0].points().len(), 2);
        assert_eq!(store.strokes()[1].points().len(), 1);
    }

    #[test]
    fn ceiling_thins_but_keeps_newest_point() {
        let mut tuning = tuning();
        tuning.max_stroke_points = 16;
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 1);
        for i in 0..100 {
            store.append(pt(i as f32), &tuning);
        }
        let points = store.strokes()[0].points();
        assert!(points.len() <= tuning.max_stroke_points);
        assert_eq!(points.last().unwrap().position.x, 99.0);
        // Thinning preserves ordering.
        for pair in points.windows(2) {
            assert!(pair[0].position.x < pair[1].position.x);
        }
    }

    #[test]
    fn rebuild_dirty_materializes_meshes_once() {
        let tuning = tuning();
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 1);
        store.append(pt(0.0), &tuning);
        store.append(pt(1.0), &tuning);
        assert!(store.strokes()[0].mesh().is_none());
        store.rebuild_dirty(&tuning);
        let mesh = store.strokes()[0].mesh().unwrap();
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn single_point_stroke_has_no_mesh() {
        let tuning = tuning();
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 1);
        store.append(pt(0.0), &tuning);
        store.rebuild_dirty(&tuning);
        assert!(store.strokes()[0].mesh().is_none());
    }

    #[test]
    fn folded_stroke_builds_folded_mesh() {
        let tuning = tuning();
        let mut store = StrokeStore::new();
        store.start_stroke(CYAN, 4);
        store.append(TracePoint::new(Vec3::new(1.0, 0.0, 0.0), 0.0), &tuning);
        store.append(TracePoint::new(Vec3::new(1.0, 1.0, 0.0), 0.0), &tuning);
        store.rebuild_all(&tuning);
        assert_eq!(store.strokes()[0].mesh().unwrap().vertices.len(), 16);
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(rgb_from_hex("#00ffff"), Some([0.0, 1.0, 1.0]));
        assert_eq!(rgb_from_hex("ff00ff"), Some([1.0, 0.0, 1.0]));
        assert_eq!(rgb_from_hex("#fff"), None);
        assert_eq!(rgb_from_hex("#zzzzzz"), None);
    }

    #[test]
    fn trace_point_energy_is_clamped() {
        assert_eq!(TracePoint::new(Vec3::ZERO, 2.0).energy, 1.0);
        assert_eq!(TracePoint::new(Vec3::ZERO, -1.0).energy, 0.0);
    }
}
