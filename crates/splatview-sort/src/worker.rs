//! Sort worker thread and its message protocol.
//!
//! Payloads move across the channels; neither side ever shares a buffer
//! with the other. The worker holds the pipeline by value and runs at
//! most one sort cycle per loop turn.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use glam::Mat4;
use splatview_data::SceneBuffer;
use tracing::info;

use crate::pipeline::{SortConfig, SortPipeline, SortedFrame};

/// Requests accepted by the sort worker.
pub enum SortRequest {
    /// Replace the scene. The buffer moves to the worker.
    Scene(SceneBuffer),
    /// Candidate view for the next ordering.
    View(Mat4),
}

/// Handle to the worker thread.
///
/// Scene uploads and view submits are fire-and-forget sends; frames come
/// back through [`SortWorker::try_latest_frame`], which never blocks.
pub struct SortWorker {
    requests: Sender<SortRequest>,
    frames: Receiver<SortedFrame>,
    generation: u64,
    thread: JoinHandle<()>,
}

impl SortWorker {
    /// Spawn the worker with the given tunables.
    pub fn spawn(config: SortConfig) -> SortWorker {
        let (request_tx, request_rx) = mpsc::channel();
        let (frame_tx, frame_rx) = mpsc::channel();

        let thread = thread::spawn(move || run(SortPipeline::new(config), request_rx, frame_tx));

        SortWorker {
            requests: request_tx,
            frames: frame_rx,
            generation: 0,
            thread,
        }
    }

    /// Move a scene to the worker. Returns the generation that frames
    /// computed from this scene will carry.
    ///
    /// The counter here mirrors the worker's own: both count scene
    /// messages, and the channel preserves their order.
    pub fn upload_scene(&mut self, scene: SceneBuffer) -> u64 {
        self.generation += 1;
        let _ = self.requests.send(SortRequest::Scene(scene));
        self.generation
    }

    /// Submit a candidate view, non-blocking. Views queued behind an
    /// in-flight sort coalesce down to the newest one.
    pub fn submit_view(&self, view_proj: Mat4) {
        let _ = self.requests.send(SortRequest::View(view_proj));
    }

    /// Newest frame for the current scene, if any arrived since the last
    /// call. Frames from an older scene generation are dropped here.
    pub fn try_latest_frame(&self) -> Option<SortedFrame> {
        let mut latest = None;
        for frame in self.frames.try_iter() {
            if frame.generation == self.generation {
                latest = Some(frame);
            }
        }
        latest
    }

    /// Scene generation of the most recent upload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(self) {
        let SortWorker {
            requests, thread, ..
        } = self;
        drop(requests);
        let _ = thread.join();
    }
}

fn run(mut pipeline: SortPipeline, requests: Receiver<SortRequest>, frames: Sender<SortedFrame>) {
    info!("sort worker started");
    while let Ok(first) = requests.recv() {
        if let Some(view_proj) = drain(&mut pipeline, first, &requests) {
            if let Some(frame) = pipeline.sort_cycle(view_proj) {
                if frames.send(frame).is_err() {
                    break;
                }
            }
        }
    }
    info!("sort worker stopped after {} cycles", pipeline.cycles());
}

/// Apply `first` and everything already queued behind it. Scene uploads
/// apply in arrival order; of the views, only the newest is kept.
fn drain(
    pipeline: &mut SortPipeline,
    first: SortRequest,
    requests: &Receiver<SortRequest>,
) -> Option<Mat4> {
    let mut view = apply(pipeline, first);
    loop {
        match requests.try_recv() {
            Ok(request) => {
                if let Some(v) = apply(pipeline, request) {
                    view = Some(v);
                }
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    view
}

fn apply(pipeline: &mut SortPipeline, request: SortRequest) -> Option<Mat4> {
    match request {
        SortRequest::Scene(scene) => {
            pipeline.set_scene(scene);
            None
        }
        SortRequest::View(view_proj) => Some(view_proj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatview_data::SplatRecord;

    fn two_splat_scene() -> SceneBuffer {
        SceneBuffer::from_records(vec![
            SplatRecord::new([0.0, 0.0, 1.0], [1.0; 3], [255; 4], [128; 4]),
            SplatRecord::new([0.0, 0.0, 5.0], [1.0; 3], [255; 4], [128; 4]),
        ])
    }

    #[test]
    fn drain_keeps_only_the_newest_view() {
        let (tx, rx) = mpsc::channel();
        let mut pipeline = SortPipeline::default();

        for i in 1..=5 {
            tx.send(SortRequest::View(Mat4::from_rotation_y(0.2 * i as f32)))
                .unwrap();
        }
        let first = rx.recv().unwrap();
        let view = drain(&mut pipeline, first, &rx).expect("a view was queued");
        assert_eq!(view, Mat4::from_rotation_y(0.2 * 5.0));
        assert!(rx.try_recv().is_err(), "drain must empty the queue");
    }

    #[test]
    fn five_views_behind_an_inflight_sort_coalesce_to_one_more_cycle() {
        let (tx, rx) = mpsc::channel();
        let mut pipeline = SortPipeline::default();
        pipeline.set_scene(two_splat_scene());

        // First cycle: one view arrives alone and its sort begins.
        tx.send(SortRequest::View(Mat4::IDENTITY)).unwrap();
        let first = rx.recv().unwrap();
        let view = drain(&mut pipeline, first, &rx).unwrap();
        pipeline.sort_cycle(view).expect("first view must sort");

        // Five more views land while that sort is running.
        for i in 1..=5 {
            tx.send(SortRequest::View(Mat4::from_rotation_y(0.2 * i as f32)))
                .unwrap();
        }

        // Next loop turn drains them all and sorts once, with the newest.
        let first = rx.recv().unwrap();
        let view = drain(&mut pipeline, first, &rx).unwrap();
        assert_eq!(view, Mat4::from_rotation_y(0.2 * 5.0));
        let frame = pipeline.sort_cycle(view).expect("rotated view must sort");

        assert_eq!(pipeline.cycles(), 2, "two cycles total, never five, never one");
        assert_eq!(frame.view_proj, Mat4::from_rotation_y(0.2 * 5.0));
    }

    #[test]
    fn queued_scene_applies_before_its_views_sort() {
        let (tx, rx) = mpsc::channel();
        let mut pipeline = SortPipeline::default();

        tx.send(SortRequest::Scene(two_splat_scene())).unwrap();
        tx.send(SortRequest::View(Mat4::IDENTITY)).unwrap();

        let first = rx.recv().unwrap();
        let view = drain(&mut pipeline, first, &rx).unwrap();
        let frame = pipeline.sort_cycle(view).expect("scene and view were queued");

        assert_eq!(pipeline.cycles(), 1);
        assert_eq!(frame.generation, 1);
        assert_eq!(frame.splats.splat_count(), 2);
    }

    #[test]
    fn scene_only_batch_sorts_nothing() {
        let (tx, rx) = mpsc::channel();
        let mut pipeline = SortPipeline::default();

        tx.send(SortRequest::Scene(two_splat_scene())).unwrap();
        let first = rx.recv().unwrap();
        assert!(drain(&mut pipeline, first, &rx).is_none());
        assert_eq!(pipeline.cycles(), 0);
    }
}
