//! Analytic sphere records.

use std::fmt;

use emca_core::{Color4f, Result, Stream};
use glam::Vec3;

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereData {
    pub radius: f32,
    pub center: Vec3,
    pub diffuse_color: Color4f,
    pub specular_color: Color4f,
}

impl Default for SphereData {
    fn default() -> Self {
        Self {
            radius: 1.0,
            center: Vec3::ZERO,
            diffuse_color: Color4f::WHITE,
            specular_color: Color4f::BLACK,
        }
    }
}

impl SphereData {
    /// Creates a sphere with the default material colors.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            radius,
            center,
            ..Self::default()
        }
    }

    /// Axis-aligned bounds: `center ± |radius|`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let r = Vec3::splat(self.radius.abs());
        (self.center - r, self.center + r)
    }

    /// Reads a sphere body: radius, center, diffuse, specular.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S) -> Result<Self> {
        let radius = stream.read_f32()?;
        let center = stream.read_point3f()?;
        let diffuse_color = stream.read_color4f()?;
        let specular_color = stream.read_color4f()?;
        log::debug!("decoded sphere: radius {radius}, center {center}");
        Ok(Self {
            radius,
            center,
            diffuse_color,
            specular_color,
        })
    }

    /// Writes a sphere body in the order [`SphereData::decode`] reads it.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_f32(self.radius)?;
        stream.write_point3f(self.center)?;
        stream.write_color4f(self.diffuse_color)?;
        stream.write_color4f(self.specular_color)
    }
}

impl fmt::Display for SphereData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "radius = {}", self.radius)?;
        writeln!(f, "center = {}", self.center)?;
        writeln!(f, "specularColor = {}", self.specular_color)?;
        writeln!(f, "diffuseColor = {}", self.diffuse_color)
    }
}

/// Reads a sphere body from `stream`.
pub fn decode_sphere<S: Stream + ?Sized>(stream: &mut S) -> Result<SphereData> {
    SphereData::decode(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emca_core::{ByteStream, EmcaError};

    #[test]
    fn test_sphere_field_order() {
        let mut stream = ByteStream::new();
        stream.write_f32(2.5).unwrap();
        stream.write_float_array(&[1.0, 2.0, 3.0]).unwrap();
        stream.write_color4f(Color4f::new(1.0, 0.0, 0.0, 1.0)).unwrap();
        stream.write_color4f(Color4f::WHITE).unwrap();

        let sphere = decode_sphere(&mut stream).unwrap();
        assert_eq!(sphere.radius, 2.5);
        assert_eq!(sphere.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(sphere.diffuse_color, Color4f::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(sphere.specular_color, Color4f::WHITE);
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_sphere_roundtrip() {
        let sphere = SphereData::new(Vec3::new(-1.0, 0.5, 4.0), 0.25);
        let mut stream = ByteStream::new();
        sphere.encode(&mut stream).unwrap();
        assert_eq!(stream.remaining(), 4 + 12 + 16 + 16);
        assert_eq!(decode_sphere(&mut stream).unwrap(), sphere);
    }

    #[test]
    fn test_truncated_sphere() {
        let mut stream = ByteStream::new();
        stream.write_f32(1.0).unwrap();
        stream.write_f32(0.0).unwrap();
        assert!(matches!(
            decode_sphere(&mut stream),
            Err(EmcaError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_bounds() {
        let (min, max) = SphereData::new(Vec3::new(1.0, 0.0, 0.0), 2.0).bounds();
        assert_eq!(min, Vec3::new(-1.0, -2.0, -2.0));
        assert_eq!(max, Vec3::new(3.0, 2.0, 2.0));
    }
}
