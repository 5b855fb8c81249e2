//! Decoding tests on hand-assembled byte buffers.
//!
//! The buffers are built field by field from the wire layout instead of
//! through the encoders, so these tests pin the format itself.

use emca::*;
use proptest::prelude::*;

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn sphere_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    push_u16(&mut buf, 1);
    push_f32s(&mut buf, &[2.0]);
    push_f32s(&mut buf, &[0.0, 0.0, 0.0]);
    push_f32s(&mut buf, &[1.0, 0.0, 0.0, 1.0]);
    push_f32s(&mut buf, &[1.0, 1.0, 1.0, 1.0]);
    buf
}

fn triangle_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    push_u16(&mut buf, 0);
    push_u32(&mut buf, 3);
    push_f32s(&mut buf, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    push_u32(&mut buf, 1);
    for i in [0_u32, 1, 2] {
        push_u32(&mut buf, i);
    }
    push_u32(&mut buf, 0);
    push_f32s(&mut buf, &[0.5, 0.5, 0.5, 1.0]);
    push_f32s(&mut buf, &[0.0, 0.0, 0.0, 1.0]);
    buf
}

#[test]
fn test_sphere_followed_by_triangle_mesh() {
    let mut bytes = sphere_bytes();
    bytes.extend(triangle_bytes());

    let shapes = decode_shape_data_to_end(&mut ByteStream::from_bytes(bytes.clone())).unwrap();
    assert_eq!(shapes.len(), 2);

    let sphere = shapes.get(0).and_then(ShapeRecord::as_sphere).unwrap();
    assert_eq!(sphere.radius, 2.0);
    assert_eq!(sphere.center, Vec3::ZERO);
    assert_eq!(sphere.diffuse_color, Color4f::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(sphere.specular_color, Color4f::WHITE);

    let mesh = shapes.get(1).and_then(ShapeRecord::as_mesh).unwrap();
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.polygon_cells(), vec![3, 0, 1, 2]);
    assert!(mesh.face_colors().is_none());

    // Counted decoding sees the same records.
    let counted = decode_shape_data(&mut ByteStream::from_bytes(bytes), 2).unwrap();
    assert_eq!(counted, shapes);
}

#[test]
fn test_truncated_mid_vertex_array() {
    let mut bytes = sphere_bytes();
    let mesh = triangle_bytes();
    // tag + vertex count + two of nine floats
    bytes.extend_from_slice(&mesh[..2 + 4 + 8]);

    let result = decode_shape_data_to_end(&mut ByteStream::from_bytes(bytes));
    assert!(matches!(result, Err(EmcaError::TruncatedStream { .. })));
}

#[test]
fn test_unknown_tag_stops_decoding() {
    let mut bytes = Vec::new();
    push_u16(&mut bytes, 2);
    bytes.extend(sphere_bytes());

    let result = decode_shape_data_to_end(&mut ByteStream::from_bytes(bytes));
    assert!(matches!(result, Err(EmcaError::UnsupportedShapeType(2))));
}

#[test]
fn test_face_color_block_present() {
    let mut buf = Vec::new();
    push_u32(&mut buf, 3);
    push_f32s(&mut buf, &[0.0; 9]);
    push_u32(&mut buf, 1);
    for i in [2_u32, 1, 0] {
        push_u32(&mut buf, i);
    }
    push_u32(&mut buf, 1);
    push_f32s(&mut buf, &[0.25, 0.5, 0.75]);
    push_f32s(&mut buf, &[1.0; 4]);
    push_f32s(&mut buf, &[0.0; 4]);

    let mut stream = ByteStream::from_bytes(buf);
    let mesh = decode_mesh(&mut stream).unwrap();
    assert_eq!(mesh.face_colors(), Some(&[Vec3::new(0.25, 0.5, 0.75)][..]));
    assert_eq!(mesh.triangle_indices(), &[2, 1, 0]);
    assert!(stream.is_exhausted());
}

#[test]
fn test_decode_limits_apply_before_reading_arrays() {
    let limits = DecodeLimits {
        max_triangles: 0,
        ..DecodeLimits::default()
    };
    let mut stream = ByteStream::from_bytes(triangle_bytes());
    let result = ShapeData::decode(&mut stream, 1, &limits);
    assert!(matches!(result, Err(EmcaError::MalformedRecord(_))));
}

fn push_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// One path of sample 9 with a single intersection at depth 0.
fn pixel_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    push_u32(&mut buf, 1); // paths
    push_u32(&mut buf, 1); // path user data items
    push_string(&mut buf, "px");
    buf.extend_from_slice(b"2i");
    buf.extend_from_slice(&3_i32.to_le_bytes());
    buf.extend_from_slice(&4_i32.to_le_bytes());
    push_u32(&mut buf, 9); // sample index
    push_u32(&mut buf, 1); // path depth
    push_f32s(&mut buf, &[0.0, 0.0, 5.0]);
    buf.push(0); // no final estimate
    push_u32(&mut buf, 1); // intersections
    push_u32(&mut buf, 0); // intersection user data items
    push_u32(&mut buf, 0); // depth index
    buf.push(1);
    push_f32s(&mut buf, &[0.0, 0.0, 1.0]);
    buf.push(0); // no next event estimate
    buf.push(0); // no li
    buf.push(1);
    push_f32s(&mut buf, &[2.0, 2.0, 2.0, 1.0]);
    buf
}

#[test]
fn test_pixel_package_layout() {
    let mut stream = ByteStream::from_bytes(pixel_bytes());
    let pixel = PixelData::decode(&mut stream, &DecodeLimits::default()).unwrap();
    assert!(stream.is_exhausted());

    let path = pixel.path(9).unwrap();
    assert_eq!(path.user_data.get("px"), Some(&UserValue::Int2(glam::IVec2::new(3, 4))));
    assert_eq!(path.path_origin, Vec3::new(0.0, 0.0, 5.0));
    assert!(path.final_estimate.is_none());

    let hit = &path.intersections[&0];
    assert_eq!(hit.pos, Some(Vec3::Z));
    assert!(hit.next_event.is_none() && hit.li.is_none());
    assert_eq!(hit.le, Some(Color4f::new(2.0, 2.0, 2.0, 1.0)));
}

#[test]
fn test_truncated_pixel_package() {
    let bytes = pixel_bytes();
    // Cut inside the emission color of the last intersection.
    let mut stream = ByteStream::from_bytes(bytes[..bytes.len() - 8].to_vec());
    assert!(matches!(
        PixelData::decode(&mut stream, &DecodeLimits::default()),
        Err(EmcaError::TruncatedStream { .. })
    ));
}

proptest! {
    #[test]
    fn prop_sphere_roundtrip(
        radius in 0.0_f32..100.0,
        center in prop::array::uniform3(-100.0_f32..100.0),
        diffuse in prop::array::uniform4(0.0_f32..1.0),
    ) {
        let sphere = SphereData {
            radius,
            center: Vec3::from_array(center),
            diffuse_color: Color4f::from_array(diffuse),
            specular_color: Color4f::BLACK,
        };
        let mut stream = ByteStream::new();
        ShapeRecord::from(sphere).encode(&mut stream).unwrap();
        let shapes = decode_shape_data_to_end(&mut stream).unwrap();
        prop_assert_eq!(shapes.spheres().next().copied(), Some(sphere));
    }
}
