//! Synchronous sort core: scene state, gating, one cycle at a time.

use glam::Mat4;
use splatview_data::SceneBuffer;
use tracing::debug;

use crate::depth::{DepthIndex, ViewState};
use crate::repack::{repack, SortedSplats};

/// Tunables for depth projection and view gating.
#[derive(Clone, Copy, Debug)]
pub struct SortConfig {
    /// Added to every projected depth so keys stay positive for scenes
    /// within this range of the origin, which keeps raw float bits in
    /// numeric order.
    pub depth_offset: f32,
    /// Gate threshold on the depth-axis dot between the last sorted view
    /// and a candidate view. Larger values skip more aggressively.
    pub view_epsilon: f32,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            depth_offset: 10_000.0,
            view_epsilon: 0.01,
        }
    }
}

/// One completed ordering: the attribute arrays plus the view and scene
/// generation they were computed for.
#[derive(Clone, Debug)]
pub struct SortedFrame {
    pub splats: SortedSplats,
    pub view_proj: Mat4,
    pub generation: u64,
}

/// Everything one sort worker owns: the scene, the persistent depth
/// index, the gate, and the generation counter.
pub struct SortPipeline {
    config: SortConfig,
    scene: Option<SceneBuffer>,
    index: DepthIndex,
    view: ViewState,
    generation: u64,
    cycles: u64,
}

impl SortPipeline {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            scene: None,
            index: DepthIndex::new(),
            view: ViewState::new(),
            generation: 0,
            cycles: 0,
        }
    }

    /// Replace the scene wholesale and bump the generation.
    ///
    /// The stored permutation and the gate reset even when the splat count
    /// matches the old scene; the next view always produces a fresh
    /// ordering. Returns the new generation.
    pub fn set_scene(&mut self, scene: SceneBuffer) -> u64 {
        self.generation += 1;
        self.index.reset(scene.splat_count());
        self.view.clear();
        debug!(
            "scene generation {} applied: {} splats",
            self.generation,
            scene.splat_count()
        );
        self.scene = Some(scene);
        self.generation
    }

    /// Run one sort cycle for `view_proj`.
    ///
    /// Returns `None` without touching any state when no scene is loaded
    /// or the gate holds. Otherwise projects depths over the current
    /// permutation, sorts, repacks, commits the gate, and returns the
    /// frame tagged with the current generation.
    pub fn sort_cycle(&mut self, view_proj: Mat4) -> Option<SortedFrame> {
        let scene = self.scene.as_ref()?;

        if !self.view.needs_resort(&view_proj, self.config.view_epsilon) {
            debug!("view within gate, keeping previous order");
            return None;
        }

        self.index.ensure_len(scene.splat_count());
        self.index.project(scene, &view_proj, self.config.depth_offset);
        self.index.sort();

        let splats = repack(scene, self.index.indices());
        self.view.commit(&view_proj);
        self.cycles += 1;
        debug!("cycle {}: sorted {} splats", self.cycles, splats.splat_count());

        Some(SortedFrame {
            splats,
            view_proj,
            generation: self.generation,
        })
    }

    /// Completed sort cycles since creation. Gated and sceneless calls do
    /// not count.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn splat_count(&self) -> usize {
        self.scene.as_ref().map_or(0, |s| s.splat_count())
    }
}

impl Default for SortPipeline {
    fn default() -> Self {
        Self::new(SortConfig::default())
    }
}
