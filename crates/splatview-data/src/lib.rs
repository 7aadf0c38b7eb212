pub mod error;
pub mod fetch;
pub mod record;
pub mod scene;

pub use error::{DataResult, LoadError};
pub use fetch::{fetch_scene, load_scene_bytes, read_scene_file};
pub use record::SplatRecord;
pub use scene::SceneBuffer;
