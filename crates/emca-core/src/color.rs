//! RGBA material colors as transferred by the renderer.

use std::fmt;

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Linear RGBA color with `f32` channels.
///
/// The layout matches the wire format (four consecutive floats), so slices of
/// colors can be handed to GPU buffers via [`bytemuck::cast_slice`].
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct Color4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4f {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a color from its four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from `[r, g, b, a]`.
    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Returns the channels as `[r, g, b, a]`.
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }


}

impl From<[f32; 4]> for Color4f {
    fn from(c: [f32; 4]) -> Self {
        Self::from_array(c)
    }
}

impl From<Vec4> for Color4f {
    fn from(v: Vec4) -> Self {
        Self::from_array(v.to_array())
    }
}

impl fmt::Display for Color4f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.r, self.g, self.b, self.a)
    }
}
