//! Tagged shape records and ordered shape collections.
//!
//! Every record on the wire starts with a `u16` [`ShapeType`] tag followed by
//! the body of the matching primitive. Record bodies have no length prefix,
//! so a tag that cannot be interpreted leaves the reader with no way to find
//! the next record; decoding stops with [`EmcaError::UnsupportedShapeType`].

use std::fmt;

use emca_core::{ByteStream, Color4f, DecodeLimits, EmcaError, Result, ShapeType, Stream};
use glam::Vec3;

use crate::mesh::{wire_count, MeshData};
use crate::sphere::SphereData;

/// One decoded geometric primitive with its material colors.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRecord {
    Mesh(MeshData),
    Sphere(SphereData),
}

impl ShapeRecord {
    /// The tag this record is written with.
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Mesh(_) => ShapeType::TriangleMesh,
            Self::Sphere(_) => ShapeType::SphereMesh,
        }
    }

    /// Diffuse material color of the primitive.
    pub fn diffuse_color(&self) -> Color4f {
        match self {
            Self::Mesh(mesh) => mesh.diffuse_color(),
            Self::Sphere(sphere) => sphere.diffuse_color,
        }
    }

    /// Specular material color of the primitive.
    pub fn specular_color(&self) -> Color4f {
        match self {
            Self::Mesh(mesh) => mesh.specular_color(),
            Self::Sphere(sphere) => sphere.specular_color,
        }
    }

    /// Returns the mesh if this record is one.
    pub fn as_mesh(&self) -> Option<&MeshData> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            Self::Sphere(_) => None,
        }
    }

    /// Returns the sphere if this record is one.
    pub fn as_sphere(&self) -> Option<&SphereData> {
        match self {
            Self::Sphere(sphere) => Some(sphere),
            Self::Mesh(_) => None,
        }
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        match self {
            Self::Mesh(mesh) => mesh.bounds(),
            Self::Sphere(sphere) => Some(sphere.bounds()),
        }
    }

    /// Reads a tag and the record body it announces.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let tag = stream.read_u16()?;
        match ShapeType::try_from(tag)? {
            ShapeType::TriangleMesh => MeshData::decode(stream, limits).map(Self::Mesh),
            ShapeType::SphereMesh => SphereData::decode(stream).map(Self::Sphere),
        }
    }

    /// Writes the tag followed by the record body.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_u16(self.shape_type().tag())?;
        match self {
            Self::Mesh(mesh) => mesh.encode(stream),
            Self::Sphere(sphere) => sphere.encode(stream),
        }
    }
}

impl From<MeshData> for ShapeRecord {
    fn from(mesh: MeshData) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<SphereData> for ShapeRecord {
    fn from(sphere: SphereData) -> Self {
        Self::Sphere(sphere)
    }
}

impl fmt::Display for ShapeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh(mesh) => fmt::Display::fmt(mesh, f),
            Self::Sphere(sphere) => fmt::Display::fmt(sphere, f),
        }
    }
}

/// Aggregate statistics over a [`ShapeData`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeSummary {
    pub shape_count: usize,
    pub mesh_count: usize,
    pub sphere_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Bounds over all geometry; `None` if nothing has extent.
    pub bounds: Option<(Vec3, Vec3)>,
}

/// All shape records of one scene, in wire order.
///
/// The collection is immutable once decoded; presentation layers only read
/// it to build their own render objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeData {
    records: Vec<ShapeRecord>,
}

impl ShapeData {
    /// Wraps records in wire order.
    pub fn new(records: Vec<ShapeRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at `index`.
    pub fn get(&self, index: usize) -> Option<&ShapeRecord> {
        self.records.get(index)
    }

    /// All records in wire order.
    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    /// Iterates over the records in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, ShapeRecord> {
        self.records.iter()
    }

    /// Consumes the collection, returning its records.
    pub fn into_records(self) -> Vec<ShapeRecord> {
        self.records
    }

    /// Iterates over the mesh records only.
    pub fn meshes(&self) -> impl Iterator<Item = &MeshData> {
        self.records.iter().filter_map(ShapeRecord::as_mesh)
    }

    /// Iterates over the sphere records only.
    pub fn spheres(&self) -> impl Iterator<Item = &SphereData> {
        self.records.iter().filter_map(ShapeRecord::as_sphere)
    }

    /// Counts records and geometry and merges their bounds.
    pub fn summary(&self) -> ShapeSummary {
        let mut summary = ShapeSummary {
            shape_count: self.records.len(),
            ..ShapeSummary::default()
        };
        for record in &self.records {
            match record {
                ShapeRecord::Mesh(mesh) => {
                    summary.mesh_count += 1;
                    summary.vertex_count += mesh.vertex_count();
                    summary.triangle_count += mesh.triangle_count();
                }
                ShapeRecord::Sphere(_) => summary.sphere_count += 1,
            }
            if let Some((lo, hi)) = record.bounds() {
                summary.bounds = Some(match summary.bounds {
                    Some((min, max)) => (min.min(lo), max.max(hi)),
                    None => (lo, hi),
                });
            }
        }
        summary
    }

    /// Decodes exactly `count` tagged records.
    ///
    /// Fails on the first bad record; no partial collection is returned.
    pub fn decode<S: Stream + ?Sized>(
        stream: &mut S,
        count: u32,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        let count = DecodeLimits::check("shape", count, limits.max_shapes)?;
        let mut records = Vec::with_capacity(count.min(1024));
        for index in 0..count {
            let record = ShapeRecord::decode(stream, limits).map_err(|e| {
                log::warn!("shape record {index}/{count} failed to decode: {e}");
                e
            })?;
            records.push(record);
        }
        Ok(Self { records })
    }

    /// Decodes a `u32` record count followed by that many tagged records.
    pub fn decode_list<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let count = stream.read_u32()?;
        Self::decode(stream, count, limits)
    }

    /// Decodes tagged records until the buffer is exhausted.
    pub fn decode_to_end(stream: &mut ByteStream, limits: &DecodeLimits) -> Result<Self> {
        let mut records = Vec::new();
        while !stream.is_exhausted() {
            if records.len() >= limits.max_shapes as usize {
                return Err(EmcaError::malformed(format!(
                    "more than {} shapes in buffer",
                    limits.max_shapes
                )));
            }
            records.push(ShapeRecord::decode(stream, limits)?);
        }
        Ok(Self { records })
    }

    /// Writes every record (tag + body) without a count prefix.
    pub fn encode_records<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        self.records.iter().try_for_each(|r| r.encode(stream))
    }

    /// Writes a `u32` record count followed by every record.
    pub fn encode_list<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_u32(wire_count("shape", self.records.len())?)?;
        self.encode_records(stream)
    }
}

impl From<Vec<ShapeRecord>> for ShapeData {
    fn from(records: Vec<ShapeRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<ShapeRecord> for ShapeData {
    fn from_iter<I: IntoIterator<Item = ShapeRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ShapeData {
    type Item = ShapeRecord;
    type IntoIter = std::vec::IntoIter<ShapeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ShapeData {
    type Item = &'a ShapeRecord;
    type IntoIter = std::slice::Iter<'a, ShapeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for ShapeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "meshCount = {}", self.records.len())?;
        for record in &self.records {
            write!(f, "Mesh = {{\n{record}}}\n\n")?;
        }
        Ok(())
    }
}

/// Reads one tagged record with the default [`DecodeLimits`].
pub fn decode_shape_record<S: Stream + ?Sized>(stream: &mut S) -> Result<ShapeRecord> {
    ShapeRecord::decode(stream, &DecodeLimits::default())
}

/// Reads exactly `count` tagged records with the default [`DecodeLimits`].
pub fn decode_shape_data<S: Stream + ?Sized>(stream: &mut S, count: u32) -> Result<ShapeData> {
    ShapeData::decode(stream, count, &DecodeLimits::default())
}

/// Reads tagged records until `stream` runs out of bytes.
pub fn decode_shape_data_to_end(stream: &mut ByteStream) -> Result<ShapeData> {
    ShapeData::decode_to_end(stream, &DecodeLimits::default())
}

/// Reads a count-prefixed list of tagged records.
pub fn decode_shape_list<S: Stream + ?Sized>(stream: &mut S) -> Result<ShapeData> {
    ShapeData::decode_list(stream, &DecodeLimits::default())
}
