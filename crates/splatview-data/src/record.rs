use bytemuck::{Pod, Zeroable};

/// A single Gaussian splat as authored in the wire format.
///
/// Memory layout: 32 bytes, little-endian.
/// Offsets 0/12/24/28 hold position, scale, color, rotation.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SplatRecord {
    /// World-space center
    pub position: [f32; 3],
    /// Scale along each local axis
    pub scale: [f32; 3],
    /// RGBA color, 0-255
    pub color: [u8; 4],
    /// Rotation quaternion, each component packed around 128
    pub rotation: [u8; 4],
}

impl SplatRecord {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(position: [f32; 3], scale: [f32; 3], color: [u8; 4], rotation: [u8; 4]) -> Self {
        Self { position, scale, color, rotation }
    }

    /// Color components mapped to [0, 1].
    pub fn color_f32(&self) -> [f32; 4] {
        [
            self.color[0] as f32 / 255.0,
            self.color[1] as f32 / 255.0,
            self.color[2] as f32 / 255.0,
            self.color[3] as f32 / 255.0,
        ]
    }

    /// Quaternion components unpacked from bytes.
    ///
    /// 128 maps to 0.0 and the byte range covers -1.0..=0.9921875. Assets
    /// are authored against this mapping, so it is preserved as-is rather
    /// than rescaled to a symmetric range.
    pub fn rotation_f32(&self) -> [f32; 4] {
        [
            (self.rotation[0] as f32 - 128.0) / 128.0,
            (self.rotation[1] as f32 - 128.0) / 128.0,
            (self.rotation[2] as f32 - 128.0) / 128.0,
            (self.rotation[3] as f32 - 128.0) / 128.0,
        ]
    }
}
