//! Dense attribute arrays in draw order.

use splatview_data::SceneBuffer;

/// Per-attribute arrays in sorted order, ready for vertex buffer upload.
///
/// Index-aligned across all four: instance `i` is described by
/// `center[3i..3i+3]`, `scale[3i..3i+3]`, `color[4i..4i+4]` and
/// `rotation[4i..4i+4]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortedSplats {
    pub center: Vec<f32>,
    pub scale: Vec<f32>,
    pub color: Vec<f32>,
    pub rotation: Vec<f32>,
}

impl SortedSplats {
    pub fn splat_count(&self) -> usize {
        self.center.len() / 3
    }
}

/// Gather scene attributes in `indices` order into fresh dense arrays.
///
/// Pure function of the permutation and the scene; the arrays are new
/// allocations so the caller can move them away without a copy.
pub fn repack(scene: &SceneBuffer, indices: impl Iterator<Item = u32>) -> SortedSplats {
    let records = scene.records();
    let n = records.len();

    let mut out = SortedSplats {
        center: Vec::with_capacity(3 * n),
        scale: Vec::with_capacity(3 * n),
        color: Vec::with_capacity(4 * n),
        rotation: Vec::with_capacity(4 * n),
    };

    for i in indices {
        let r = &records[i as usize];
        out.center.extend_from_slice(&r.position);
        out.scale.extend_from_slice(&r.scale);
        out.color.extend_from_slice(&r.color_f32());
        out.rotation.extend_from_slice(&r.rotation_f32());
    }

    out
}
