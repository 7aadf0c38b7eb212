//! Persistent depth index and view-change gating.

use glam::Mat4;
use splatview_data::SceneBuffer;

use crate::radix::{f32_sort_key, radix_sort_u64};

/// Pack a sortable depth key with a splat index. Sorting the packed value
/// ascending orders by depth first, index second.
#[inline]
pub(crate) fn pack_entry(depth_key: u32, index: u32) -> u64 {
    ((depth_key as u64) << 32) | index as u64
}

#[inline]
pub(crate) fn entry_index(entry: u64) -> u32 {
    entry as u32
}

/// The three matrix coefficients that turn a world position into a view
/// depth: the z components of the column-major basis columns, the same
/// flat elements 2, 6 and 10 the full matrix product would use.
/// Translation never enters, so depth ORDER depends only on this axis.
#[inline]
fn depth_axis(view_proj: &Mat4) -> [f32; 3] {
    [view_proj.x_axis.z, view_proj.y_axis.z, view_proj.z_axis.z]
}

/// View-change detector.
///
/// Holds the depth axis of the last view that actually produced an
/// ordering. The axis only advances on [`ViewState::commit`], so slow
/// continuous rotation accumulates drift against the last sorted view and
/// eventually passes the gate.
#[derive(Debug, Default)]
pub struct ViewState {
    last_axis: Option<[f32; 3]>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the view direction moved enough to warrant a new order.
    /// Always true before the first commit.
    pub fn needs_resort(&self, view_proj: &Mat4, epsilon: f32) -> bool {
        let axis = depth_axis(view_proj);
        match self.last_axis {
            None => true,
            Some(last) => {
                let dot = last[0] * axis[0] + last[1] * axis[1] + last[2] * axis[2];
                (dot - 1.0).abs() >= epsilon
            }
        }
    }

    /// Record the view whose ordering is now current.
    pub fn commit(&mut self, view_proj: &Mat4) {
        self.last_axis = Some(depth_axis(view_proj));
    }

    /// Forget the last view; the next candidate always resorts.
    pub fn clear(&mut self) {
        self.last_axis = None;
    }
}

/// Persistent depth ordering for one scene.
///
/// Each entry packs a splat's depth key with its index so a single u64
/// sort orders both. The permutation survives between cycles: a view that
/// moved a little re-sorts nearly-sorted input. Splat counts must fit in
/// the u32 index half, which the 32-byte record format guarantees long
/// before memory runs out.
#[derive(Debug, Default)]
pub struct DepthIndex {
    entries: Vec<u64>,
    scratch: Vec<u64>,
}

impl DepthIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size the store for `n` splats. Reallocates and reseeds only when
    /// the count changed; otherwise the previous permutation stays.
    pub fn ensure_len(&mut self, n: usize) {
        if self.entries.len() != n {
            self.reset(n);
        }
    }

    /// Reseed with the identity permutation and cleared depth keys.
    pub fn reset(&mut self, n: usize) {
        self.entries.clear();
        self.entries.extend((0..n as u32).map(|i| pack_entry(0, i)));
    }

    /// Recompute every entry's depth key for the given view, leaving the
    /// current permutation in place. The store must already be sized to
    /// the scene.
    pub fn project(&mut self, scene: &SceneBuffer, view_proj: &Mat4, depth_offset: f32) {
        let axis = depth_axis(view_proj);
        let records = scene.records();
        for entry in &mut self.entries {
            let i = entry_index(*entry) as usize;
            let p = records[i].position;
            let depth = depth_offset - (axis[0] * p[0] + axis[1] * p[1] + axis[2] * p[2]);
            *entry = pack_entry(f32_sort_key(depth.to_bits()), i as u32);
        }
    }

    /// Order entries ascending by depth key: farthest splat first under
    /// the `offset - dot` key convention.
    pub fn sort(&mut self) {
        radix_sort_u64(&mut self.entries, &mut self.scratch);
    }

    /// Splat indices in current entry order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&e| entry_index(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatview_data::SplatRecord;

    fn scene_at(zs: &[f32]) -> SceneBuffer {
        let records = zs
            .iter()
            .map(|&z| SplatRecord::new([0.0, 0.0, z], [1.0; 3], [255; 4], [128; 4]))
            .collect();
        SceneBuffer::from_records(records)
    }

    #[test]
    fn reset_seeds_identity() {
        let mut index = DepthIndex::new();
        index.reset(4);
        let order: Vec<u32> = index.indices().collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn ensure_len_keeps_permutation_for_same_count() {
        let scene = scene_at(&[1.0, 5.0, 3.0]);
        let mut index = DepthIndex::new();
        index.reset(3);
        index.project(&scene, &Mat4::IDENTITY, 10_000.0);
        index.sort();
        let sorted: Vec<u32> = index.indices().collect();
        assert_eq!(sorted, vec![1, 2, 0], "far to near along +z");

        index.ensure_len(3);
        let kept: Vec<u32> = index.indices().collect();
        assert_eq!(kept, sorted, "same count must not reseed");

        index.ensure_len(5);
        let reseeded: Vec<u32> = index.indices().collect();
        assert_eq!(reseeded, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let scene = scene_at(&[2.0, 9.0, -4.0, 7.0]);
        let mut index = DepthIndex::new();
        index.reset(4);
        index.project(&scene, &Mat4::IDENTITY, 10_000.0);
        index.sort();
        let first: Vec<u32> = index.indices().collect();

        index.sort();
        let second: Vec<u32> = index.indices().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn projection_walks_the_current_permutation() {
        let scene = scene_at(&[1.0, 5.0, 3.0]);
        let mut index = DepthIndex::new();
        index.reset(3);
        index.project(&scene, &Mat4::IDENTITY, 10_000.0);
        index.sort();
        assert_eq!(index.indices().collect::<Vec<_>>(), vec![1, 2, 0]);

        // A second projection must keep each entry's splat index and only
        // refresh its key; resorting under the same view changes nothing.
        index.project(&scene, &Mat4::IDENTITY, 10_000.0);
        index.sort();
        assert_eq!(index.indices().collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn gate_skips_tiny_rotation_and_passes_large_ones() {
        let mut view = ViewState::new();
        assert!(view.needs_resort(&Mat4::IDENTITY, 0.01), "first view always sorts");

        view.commit(&Mat4::IDENTITY);
        let tiny = Mat4::from_rotation_y(0.04);
        assert!(!view.needs_resort(&tiny, 0.01), "axis dot 0.999 stays gated");

        let large = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_3);
        assert!(view.needs_resort(&large, 0.01), "axis dot 0.5 must resort");
    }

    #[test]
    fn gate_drift_accumulates_across_skipped_views() {
        let mut view = ViewState::new();
        view.commit(&Mat4::IDENTITY);

        // Each step is under the gate on its own, but the axis is only
        // committed on resort, so the total drift eventually passes.
        let step = 0.05f32;
        let mut triggered_at = None;
        for i in 1..=10 {
            let m = Mat4::from_rotation_y(step * i as f32);
            if view.needs_resort(&m, 0.01) {
                triggered_at = Some(i);
                break;
            }
        }
        let i = triggered_at.expect("accumulated drift must pass the gate");
        assert!(i > 1, "single step must stay gated");
    }

    #[test]
    fn gate_clear_forces_resort() {
        let mut view = ViewState::new();
        view.commit(&Mat4::IDENTITY);
        assert!(!view.needs_resort(&Mat4::IDENTITY, 0.01));

        view.clear();
        assert!(view.needs_resort(&Mat4::IDENTITY, 0.01));
    }
}
