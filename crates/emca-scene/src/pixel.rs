//! Per-pixel path data sent in response to a pixel render request.
//!
//! A pixel package holds every path traced through the selected pixel. Each
//! path lists its intersections, and both levels carry a [`UserData`] block
//! with whatever the renderer chose to record.

use std::collections::BTreeMap;
use std::fmt;

use emca_core::{Color4f, DecodeLimits, Result, Stream};
use glam::Vec3;

use crate::mesh::wire_count;
use crate::user_data::UserData;

/// Next event estimation at an intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextEventEstimate {
    /// Sampled point on the light source.
    pub pos: Vec3,
    /// Whether the light sample was unoccluded.
    pub visible: bool,
}

/// One vertex of a traced path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntersectionData {
    pub user_data: UserData,
    /// Bounce index along the path.
    pub depth_idx: u32,
    pub pos: Option<Vec3>,
    pub next_event: Option<NextEventEstimate>,
    /// Radiance estimate of the path evaluated up to this vertex.
    pub li: Option<Color4f>,
    /// Emission at this vertex.
    pub le: Option<Color4f>,
}

impl IntersectionData {
    /// Creates an intersection with no optional fields set.
    pub fn new(depth_idx: u32) -> Self {
        Self {
            depth_idx,
            ..Self::default()
        }
    }

    /// Reads one intersection.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let user_data = UserData::decode(stream, limits)?;
        let depth_idx = stream.read_u32()?;
        let pos = read_optional(stream, S::read_point3f)?;
        let next_event = read_optional(stream, |s| {
            Ok(NextEventEstimate {
                pos: s.read_point3f()?,
                visible: s.read_bool()?,
            })
        })?;
        let li = read_optional(stream, S::read_color4f)?;
        let le = read_optional(stream, S::read_color4f)?;
        Ok(Self {
            user_data,
            depth_idx,
            pos,
            next_event,
            li,
            le,
        })
    }

    /// Writes one intersection.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        self.user_data.encode(stream)?;
        stream.write_u32(self.depth_idx)?;
        write_optional(stream, self.pos, S::write_point3f)?;
        write_optional(stream, self.next_event, |s, ne| {
            s.write_point3f(ne.pos)?;
            s.write_bool(ne.visible)
        })?;
        write_optional(stream, self.li, S::write_color4f)?;
        write_optional(stream, self.le, S::write_color4f)
    }
}

/// One traced path and its intersections, keyed by depth.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    pub user_data: UserData,
    pub sample_idx: u32,
    /// Number of bounces the renderer reported for this path.
    pub path_depth: u32,
    pub path_origin: Vec3,
    pub final_estimate: Option<Color4f>,
    pub intersections: BTreeMap<u32, IntersectionData>,
}

impl PathData {
    /// Creates an empty path for `sample_idx`.
    pub fn new(sample_idx: u32) -> Self {
        Self {
            sample_idx,
            ..Self::default()
        }
    }

    /// Adds an intersection, replacing any with the same depth.
    pub fn insert(&mut self, intersection: IntersectionData) {
        self.intersections.insert(intersection.depth_idx, intersection);
    }

    /// Number of intersections.
    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    /// Intersection positions in depth order, starting at the path origin.
    ///
    /// Intersections without a recorded position are skipped.
    pub fn vertices(&self) -> Vec<Vec3> {
        std::iter::once(self.path_origin)
            .chain(self.intersections.values().filter_map(|i| i.pos))
            .collect()
    }

    /// Reads one path with all of its intersections.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let user_data = UserData::decode(stream, limits)?;
        let sample_idx = stream.read_u32()?;
        let path_depth = stream.read_u32()?;
        let path_origin = stream.read_point3f()?;
        let final_estimate = read_optional(stream, S::read_color4f)?;

        let count =
            DecodeLimits::check("intersection", stream.read_u32()?, limits.max_intersections)?;
        let mut intersections = BTreeMap::new();
        for _ in 0..count {
            let intersection = IntersectionData::decode(stream, limits)?;
            if let Some(old) = intersections.insert(intersection.depth_idx, intersection) {
                log::warn!(
                    "path {sample_idx}: duplicate intersection at depth {}",
                    old.depth_idx
                );
            }
        }

        Ok(Self {
            user_data,
            sample_idx,
            path_depth,
            path_origin,
            final_estimate,
            intersections,
        })
    }

    /// Writes one path with all of its intersections.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        self.user_data.encode(stream)?;
        stream.write_u32(self.sample_idx)?;
        stream.write_u32(self.path_depth)?;
        stream.write_point3f(self.path_origin)?;
        write_optional(stream, self.final_estimate, S::write_color4f)?;
        stream.write_u32(wire_count("intersection", self.intersections.len())?)?;
        self.intersections
            .values()
            .try_for_each(|intersection| intersection.encode(stream))
    }
}

/// Every path traced through one pixel, keyed by sample index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelData {
    paths: BTreeMap<u32, PathData>,
}

impl PixelData {
    /// Creates a package from paths; later duplicates of a sample index win.
    pub fn new(paths: impl IntoIterator<Item = PathData>) -> Self {
        Self {
            paths: paths.into_iter().map(|p| (p.sample_idx, p)).collect(),
        }
    }

    /// Number of paths.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no path was recorded.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Looks up the path of one sample.
    pub fn path(&self, sample_idx: u32) -> Option<&PathData> {
        self.paths.get(&sample_idx)
    }

    /// Paths ordered by sample index.
    pub fn paths(&self) -> impl Iterator<Item = &PathData> {
        self.paths.values()
    }

    /// Sample indices of all paths, ascending.
    pub fn sample_indices(&self) -> Vec<u32> {
        self.paths.keys().copied().collect()
    }

    /// Reads a `u32` path count followed by that many paths.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let count = DecodeLimits::check("path", stream.read_u32()?, limits.max_paths)?;
        let mut paths = BTreeMap::new();
        for index in 0..count {
            let path = PathData::decode(stream, limits).map_err(|e| {
                log::warn!("path {index}/{count} failed to decode: {e}");
                e
            })?;
            if let Some(old) = paths.insert(path.sample_idx, path) {
                log::warn!("duplicate path for sample {}", old.sample_idx);
            }
        }
        log::debug!("decoded pixel package with {} paths", paths.len());
        Ok(Self { paths })
    }

    /// Writes the path count followed by every path.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_u32(wire_count("path", self.paths.len())?)?;
        self.paths.values().try_for_each(|path| path.encode(stream))
    }
}

impl fmt::Display for PixelData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "number of paths = {}", self.paths.len())
    }
}

fn read_optional<S, T>(stream: &mut S, read: impl FnOnce(&mut S) -> Result<T>) -> Result<Option<T>>
where
    S: Stream + ?Sized,
{
    if stream.read_bool()? {
        read(stream).map(Some)
    } else {
        Ok(None)
    }
}

fn write_optional<S, T>(
    stream: &mut S,
    value: Option<T>,
    write: impl FnOnce(&mut S, T) -> Result<()>,
) -> Result<()>
where
    S: Stream + ?Sized,
{
    stream.write_bool(value.is_some())?;
    match value {
        Some(value) => write(stream, value),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_data::UserValue;
    use emca_core::{ByteStream, EmcaError};

    fn two_bounce_path(sample_idx: u32) -> PathData {
        let mut path = PathData::new(sample_idx);
        path.path_depth = 2;
        path.path_origin = Vec3::new(0.0, 1.0, 5.0);
        path.final_estimate = Some(Color4f::new(0.3, 0.2, 0.1, 1.0));
        path.user_data.push("spp", UserValue::Int(16));

        let mut first = IntersectionData::new(0);
        first.pos = Some(Vec3::new(0.0, 0.0, 0.0));
        first.next_event = Some(NextEventEstimate {
            pos: Vec3::new(0.0, 2.0, 0.0),
            visible: true,
        });
        first.li = Some(Color4f::new(0.1, 0.1, 0.1, 1.0));
        first.user_data.push("bsdf", UserValue::String("diffuse".into()));
        path.insert(first);

        let mut second = IntersectionData::new(1);
        second.pos = Some(Vec3::new(0.0, 2.0, 0.0));
        second.le = Some(Color4f::new(10.0, 10.0, 10.0, 1.0));
        path.insert(second);
        path
    }

    fn pixel() -> PixelData {
        PixelData::new([two_bounce_path(0), two_bounce_path(3)])
    }

    #[test]
    fn test_pixel_roundtrip() {
        let pixel = pixel();
        let mut stream = ByteStream::new();
        pixel.encode(&mut stream).unwrap();
        let decoded = PixelData::decode(&mut stream, &DecodeLimits::default()).unwrap();
        assert_eq!(decoded, pixel);
        assert!(stream.is_exhausted());
        assert_eq!(decoded.sample_indices(), vec![0, 3]);
        assert_eq!(decoded.to_string(), "number of paths = 2");
    }

    #[test]
    fn test_intersection_wire_layout() {
        let mut stream = ByteStream::new();
        stream.write_u32(0).unwrap(); // no user data
        stream.write_u32(4).unwrap();
        stream.write_bool(false).unwrap();
        stream.write_bool(true).unwrap();
        stream.write_point3f(Vec3::ONE).unwrap();
        stream.write_bool(false).unwrap();
        stream.write_bool(false).unwrap();
        stream.write_bool(false).unwrap();

        let intersection = IntersectionData::decode(&mut stream, &DecodeLimits::default()).unwrap();
        assert_eq!(intersection.depth_idx, 4);
        assert_eq!(intersection.pos, None);
        assert_eq!(
            intersection.next_event,
            Some(NextEventEstimate {
                pos: Vec3::ONE,
                visible: false
            })
        );
        assert!(intersection.li.is_none() && intersection.le.is_none());
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_path_vertices_start_at_origin() {
        let path = two_bounce_path(0);
        assert_eq!(
            path.vertices(),
            vec![path.path_origin, Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)]
        );
        assert_eq!(path.intersection_count(), 2);
    }

    #[test]
    fn test_truncated_pixel_package() {
        let mut stream = ByteStream::new();
        pixel().encode(&mut stream).unwrap();
        let bytes = stream.into_bytes();
        let cut = bytes.len() - 5;
        let result = PixelData::decode(
            &mut ByteStream::from_bytes(bytes[..cut].to_vec()),
            &DecodeLimits::default(),
        );
        assert!(matches!(result, Err(EmcaError::TruncatedStream { .. })));
    }

    #[test]
    fn test_path_limit() {
        let limits = DecodeLimits {
            max_paths: 1,
            ..DecodeLimits::default()
        };
        let mut stream = ByteStream::new();
        pixel().encode(&mut stream).unwrap();
        assert!(matches!(
            PixelData::decode(&mut stream, &limits),
            Err(EmcaError::MalformedRecord(_))
        ));
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_duplicate_sample_keeps_last() {
        let mut stream = ByteStream::new();
        stream.write_u32(2).unwrap();
        two_bounce_path(7).encode(&mut stream).unwrap();
        let mut later = two_bounce_path(7);
        later.path_depth = 9;
        later.encode(&mut stream).unwrap();

        let pixel = PixelData::decode(&mut stream, &DecodeLimits::default()).unwrap();
        assert_eq!(pixel.path_count(), 1);
        assert_eq!(pixel.path(7).unwrap().path_depth, 9);
    }
}
