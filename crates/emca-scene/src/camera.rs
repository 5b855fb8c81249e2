//! Camera and render info records.

use emca_core::{Result, Stream};
use glam::Vec3;

/// The renderer's camera, as sent in a camera response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    pub origin: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Field of view in degrees.
    pub fov: f32,
}

impl CameraData {
    /// Reads origin, direction, up, clip planes and field of view.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S) -> Result<Self> {
        Ok(Self {
            origin: stream.read_point3f()?,
            direction: stream.read_vec3f()?,
            up: stream.read_vec3f()?,
            near_clip: stream.read_f32()?,
            far_clip: stream.read_f32()?,
            fov: stream.read_f32()?,
        })
    }

    /// Writes the camera in the order [`CameraData::decode`] reads it.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_point3f(self.origin)?;
        stream.write_vec3f(self.direction)?;
        stream.write_vec3f(self.up)?;
        stream.write_f32(self.near_clip)?;
        stream.write_f32(self.far_clip)?;
        stream.write_f32(self.fov)
    }
}

/// Placeholder reported for names the renderer left empty.
pub const NOT_SET: &str = "not set";

/// General information about the connected renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInfo {
    pub renderer_name: String,
    pub scene_name: String,
    pub sample_count: u32,
}

impl RenderInfo {
    /// Reads both names and the sample count; empty names become [`NOT_SET`].
    pub fn decode<S: Stream + ?Sized>(stream: &mut S) -> Result<Self> {
        Ok(Self {
            renderer_name: or_not_set(stream.read_string()?),
            scene_name: or_not_set(stream.read_string()?),
            sample_count: stream.read_u32()?,
        })
    }

    /// Writes both names and the sample count.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_string(&self.renderer_name)?;
        stream.write_string(&self.scene_name)?;
        stream.write_u32(self.sample_count)
    }
}

fn or_not_set(name: String) -> String {
    if name.is_empty() {
        NOT_SET.to_string()
    } else {
        name
    }
}
