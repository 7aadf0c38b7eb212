//! Decoding of raw scene bytes into splat records.

use crate::error::{DataResult, LoadError};
use crate::record::SplatRecord;

use bytemuck::Zeroable;

/// A decoded splat scene.
///
/// Records stay in wire order for the lifetime of the scene; sorting
/// produces separate index and attribute buffers and never mutates this.
#[derive(Clone, Debug, Default)]
pub struct SceneBuffer {
    records: Vec<SplatRecord>,
}

impl SceneBuffer {
    /// Decode a scene from raw bytes.
    ///
    /// The input must be a whole number of 32-byte records. Empty input is
    /// a valid scene with zero splats.
    pub fn from_bytes(bytes: &[u8]) -> DataResult<SceneBuffer> {
        let len = bytes.len();
        let record = SplatRecord::SIZE;
        if len % record != 0 {
            return Err(LoadError::Format { len, record });
        }

        let n = len / record;
        let mut records = vec![SplatRecord::zeroed(); n];
        bytemuck::cast_slice_mut::<SplatRecord, u8>(&mut records).copy_from_slice(bytes);

        // Endianness safety: assets are authored little-endian.
        for r in &mut records {
            for v in &mut r.position {
                *v = f32::from_bits(u32::from_le(v.to_bits()));
            }
            for v in &mut r.scale {
                *v = f32::from_bits(u32::from_le(v.to_bits()));
            }
        }

        Ok(SceneBuffer { records })
    }

    pub fn from_records(records: Vec<SplatRecord>) -> SceneBuffer {
        SceneBuffer { records }
    }

    pub fn splat_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SplatRecord] {
        &self.records
    }
}
