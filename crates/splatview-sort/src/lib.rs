pub mod depth;
pub mod pipeline;
pub mod radix;
pub mod repack;
pub mod worker;


pub use depth::{DepthIndex, ViewState};
pub use pipeline::{SortConfig, SortPipeline, SortedFrame};
pub use repack::{repack, SortedSplats};
pub use worker::{SortRequest, SortWorker};
