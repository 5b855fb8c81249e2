//! Triangle mesh records.

use std::fmt;

use emca_core::{Color4f, DecodeLimits, EmcaError, Result, Stream};
use glam::{UVec3, Vec3};

/// Number of vertices per polygon cell, written before each triangle in
/// [`MeshData::polygon_cells`].
pub const TRIANGLE_CELL_SIZE: i64 = 3;

/// A triangle mesh with one diffuse and one specular material color.
///
/// Triangle indices are zero-based into the vertex list and are not bounds
/// checked; an out-of-range index is the consumer's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    vertices: Vec<Vec3>,
    triangles: Vec<UVec3>,
    // Some(colors) always holds exactly one color per triangle.
    face_colors: Option<Vec<Vec3>>,
    diffuse_color: Color4f,
    specular_color: Color4f,
}

impl MeshData {
    /// Creates a mesh with a white diffuse and a black specular color.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<UVec3>) -> Self {
        Self {
            vertices,
            triangles,
            face_colors: None,
            diffuse_color: Color4f::WHITE,
            specular_color: Color4f::BLACK,
        }
    }

    /// Attaches one color per triangle.
    ///
    /// An empty list removes the face colors, since the wire format cannot
    /// tell an empty block from an absent one.
    pub fn with_face_colors(mut self, colors: Vec<Vec3>) -> Result<Self> {
        if colors.is_empty() {
            self.face_colors = None;
            return Ok(self);
        }
        if colors.len() != self.triangles.len() {
            return Err(EmcaError::malformed(format!(
                "{} face colors for {} triangles",
                colors.len(),
                self.triangles.len()
            )));
        }
        self.face_colors = Some(colors);
        Ok(self)
    }

    /// Sets the diffuse material color.
    pub fn with_diffuse_color(mut self, color: Color4f) -> Self {
        self.diffuse_color = color;
        self
    }

    /// Sets the specular material color.
    pub fn with_specular_color(mut self, color: Color4f) -> Self {
        self.specular_color = color;
        self
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Vertex positions as a flat `xyz` sequence of `3 * vertex_count` floats.
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangles as vertex index triples.
    pub fn triangles(&self) -> &[UVec3] {
        &self.triangles
    }

    /// Triangle indices as a flat sequence of `3 * triangle_count` values.
    pub fn triangle_indices(&self) -> &[u32] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// Triangles in cell-array layout: `[3, a, b, c, 3, d, e, f, ...]`.
    ///
    /// Polygon-mesh consumers expect each cell to be prefixed with its
    /// vertex count, stored as 64-bit signed integers. The result always
    /// holds `4 * triangle_count` entries.
    pub fn polygon_cells(&self) -> Vec<i64> {
        self.triangles
            .iter()
            .flat_map(|t| {
                [
                    TRIANGLE_CELL_SIZE,
                    i64::from(t.x),
                    i64::from(t.y),
                    i64::from(t.z),
                ]
            })
            .collect()
    }

    /// Per-triangle colors, if the renderer sent any.
    pub fn face_colors(&self) -> Option<&[Vec3]> {
        self.face_colors.as_deref()
    }

    /// Number of face colors; zero when they are absent.
    pub fn face_color_count(&self) -> usize {
        self.face_colors.as_ref().map_or(0, Vec::len)
    }

    /// Diffuse material color.
    pub fn diffuse_color(&self) -> Color4f {
        self.diffuse_color
    }

    /// Specular material color.
    pub fn specular_color(&self) -> Color4f {
        self.specular_color
    }

    /// Axis-aligned bounds of all vertices, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), &v| (min.min(v), max.max(v))),
        )
    }

    /// Reads a mesh body (everything after the shape tag).
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let vertex_count = DecodeLimits::check("vertex", stream.read_u32()?, limits.max_vertices)?;
        let vertices = read_vec3_array(stream, vertex_count)?;

        let triangle_count =
            DecodeLimits::check("triangle", stream.read_u32()?, limits.max_triangles)?;
        let triangles = stream
            .read_uint_array(element_count(triangle_count)?)?
            .chunks_exact(3)
            .map(UVec3::from_slice)
            .collect();

        let face_color_count = stream.read_u32()?;
        let face_colors = if face_color_count > 0 {
            let count = DecodeLimits::check("face color", face_color_count, limits.max_triangles)?;
            if count != triangle_count {
                return Err(EmcaError::malformed(format!(
                    "{count} face colors for {triangle_count} triangles"
                )));
            }
            Some(read_vec3_array(stream, count)?)
        } else {
            None
        };

        let diffuse_color = stream.read_color4f()?;
        let specular_color = stream.read_color4f()?;

        log::debug!(
            "decoded mesh: {vertex_count} vertices, {triangle_count} triangles, {face_color_count} face colors"
        );

        Ok(Self {
            vertices,
            triangles,
            face_colors,
            diffuse_color,
            specular_color,
        })
    }

    /// Writes a mesh body (everything after the shape tag).
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_u32(wire_count("vertex", self.vertices.len())?)?;
        stream.write_float_array(self.vertex_floats())?;
        stream.write_u32(wire_count("triangle", self.triangles.len())?)?;
        stream.write_uint_array(self.triangle_indices())?;
        stream.write_u32(wire_count("face color", self.face_color_count())?)?;
        if let Some(colors) = &self.face_colors {
            stream.write_float_array(bytemuck::cast_slice(colors))?;
        }
        stream.write_color4f(self.diffuse_color)?;
        stream.write_color4f(self.specular_color)
    }
}

impl fmt::Display for MeshData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "vertexCount = {}", self.vertex_count())?;
        writeln!(f, "triangleCount = {}", self.triangle_count())?;
        writeln!(f, "specularColor = {}", self.specular_color)?;
        writeln!(f, "diffuseColor = {}", self.diffuse_color)
    }
}

/// Reads a mesh body from `stream` with the default [`DecodeLimits`].
pub fn decode_mesh<S: Stream + ?Sized>(stream: &mut S) -> Result<MeshData> {
    MeshData::decode(stream, &DecodeLimits::default())
}

/// Writes a mesh body to `stream`.
pub fn encode_mesh<S: Stream + ?Sized>(stream: &mut S, mesh: &MeshData) -> Result<()> {
    mesh.encode(stream)
}

fn element_count(count: usize) -> Result<usize> {
    count
        .checked_mul(3)
        .ok_or_else(|| EmcaError::malformed(format!("{count} xyz triples overflow")))
}

fn read_vec3_array<S: Stream + ?Sized>(stream: &mut S, count: usize) -> Result<Vec<Vec3>> {
    Ok(stream
        .read_float_array(element_count(count)?)?
        .chunks_exact(3)
        .map(Vec3::from_slice)
        .collect())
}

pub(crate) fn wire_count(what: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| EmcaError::malformed(format!("{what} count {len} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emca_core::ByteStream;
    use proptest::prelude::*;

    fn quad() -> MeshData {
        MeshData::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
        )
        .with_diffuse_color(Color4f::new(0.8, 0.2, 0.2, 1.0))
        .with_specular_color(Color4f::new(0.1, 0.1, 0.1, 1.0))
    }

    fn encoded(mesh: &MeshData) -> ByteStream {
        let mut stream = ByteStream::new();
        encode_mesh(&mut stream, mesh).unwrap();
        stream
    }

    #[test]
    fn test_mesh_roundtrip() {
        let mesh = quad();
        let mut stream = encoded(&mesh);
        assert_eq!(decode_mesh(&mut stream).unwrap(), mesh);
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_wire_layout() {
        let mesh = MeshData::new(vec![Vec3::X], Vec::new());
        let stream = encoded(&mesh);
        // vertex count + 3 floats + triangle count + face color count + 2 colors
        assert_eq!(stream.remaining(), 4 + 12 + 4 + 4 + 32);
        assert_eq!(&stream.as_bytes()[..4], &1_u32.to_le_bytes());
    }

    #[test]
    fn test_polygon_cells() {
        let cells = quad().polygon_cells();
        assert_eq!(cells, vec![3, 0, 1, 2, 3, 0, 2, 3]);
    }

    #[test]
    fn test_zero_face_colors_are_absent() {
        let mut stream = encoded(&quad());
        let mesh = decode_mesh(&mut stream).unwrap();
        assert!(mesh.face_colors().is_none());
        assert_eq!(mesh.face_color_count(), 0);
    }

    #[test]
    fn test_face_colors_roundtrip() {
        let mesh = quad()
            .with_face_colors(vec![Vec3::X, Vec3::Y])
            .unwrap();
        let mut stream = encoded(&mesh);
        let decoded = decode_mesh(&mut stream).unwrap();
        assert_eq!(decoded.face_colors(), Some(&[Vec3::X, Vec3::Y][..]));
    }

    #[test]
    fn test_face_color_count_must_match_triangles() {
        assert!(quad().with_face_colors(vec![Vec3::X]).is_err());
        assert!(quad().with_face_colors(Vec::new()).unwrap().face_colors().is_none());

        let mut stream = ByteStream::new();
        stream.write_u32(0).unwrap();
        stream.write_u32(1).unwrap();
        stream.write_uint_array(&[0, 0, 0]).unwrap();
        stream.write_u32(2).unwrap();
        stream.write_float_array(&[0.0; 6]).unwrap();
        stream.write_color4f(Color4f::WHITE).unwrap();
        stream.write_color4f(Color4f::BLACK).unwrap();
        assert!(matches!(
            decode_mesh(&mut stream),
            Err(EmcaError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_truncated_vertex_array() {
        let bytes = encoded(&quad()).into_bytes();
        // Cut inside the vertex array.
        let mut stream = ByteStream::from_bytes(bytes[..20].to_vec());
        assert!(matches!(
            decode_mesh(&mut stream),
            Err(EmcaError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn test_out_of_range_indices_are_kept() {
        let mesh = MeshData::new(vec![Vec3::ZERO], vec![UVec3::new(0, 5, 9)]);
        let mut stream = encoded(&mesh);
        assert_eq!(decode_mesh(&mut stream).unwrap().triangles(), &[UVec3::new(0, 5, 9)]);
    }

    #[test]
    fn test_vertex_limit() {
        let limits = DecodeLimits {
            max_vertices: 3,
            ..DecodeLimits::default()
        };
        let mut stream = encoded(&quad());
        assert!(matches!(
            MeshData::decode(&mut stream, &limits),
            Err(EmcaError::MalformedRecord(_))
        ));
        // Only the count was consumed.
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_bounds() {
        let (min, max) = quad().bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
        assert!(MeshData::new(Vec::new(), Vec::new()).bounds().is_none());
    }

    #[test]
    fn test_display() {
        let text = quad().to_string();
        assert!(text.contains("vertexCount = 4"));
        assert!(text.contains("triangleCount = 2"));
    }

    fn arb_mesh() -> impl Strategy<Value = MeshData> {
        let vertex = prop::array::uniform3(-1.0e6_f32..1.0e6);
        let triangle = prop::array::uniform3(any::<u32>());
        (
            prop::collection::vec(vertex, 0..32),
            prop::collection::vec(triangle, 0..32),
            prop::array::uniform4(0.0_f32..1.0),
        )
            .prop_map(|(verts, tris, diffuse)| {
                MeshData::new(
                    verts.into_iter().map(Vec3::from_array).collect(),
                    tris.into_iter().map(UVec3::from_array).collect(),
                )
                .with_diffuse_color(Color4f::from_array(diffuse))
            })
    }

    proptest! {
        #[test]
        fn prop_mesh_roundtrip(mesh in arb_mesh()) {
            let mut stream = encoded(&mesh);
            prop_assert_eq!(decode_mesh(&mut stream).unwrap(), mesh);
        }

        #[test]
        fn prop_cell_array_is_four_per_triangle(mesh in arb_mesh()) {
            let cells = mesh.polygon_cells();
            prop_assert_eq!(cells.len(), 4 * mesh.triangle_count());
            prop_assert!(cells.iter().step_by(4).all(|&c| c == TRIANGLE_CELL_SIZE));
        }
    }
}
