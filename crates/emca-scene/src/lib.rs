//! Scene record decoders for emca-rs.
//!
//! This crate turns renderer byte streams into typed records:
//! - Triangle meshes and spheres, joined in the [`ShapeRecord`] sum type
//! - Ordered shape collections ([`ShapeData`])
//! - Scene responses with optional heatmap header
//! - Camera and render info
//! - Pixel packages: the traced paths of one pixel with their user data
//!
//! Each record also has an encoder that writes the exact layout the decoder
//! expects.

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_possible_truncation)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod camera;
pub mod mesh;
pub mod pixel;
pub mod scene;
pub mod shape;
pub mod sphere;
pub mod user_data;

pub use camera::{CameraData, RenderInfo};
pub use mesh::{decode_mesh, encode_mesh, MeshData};
pub use pixel::{IntersectionData, NextEventEstimate, PathData, PixelData};
pub use scene::{HeatmapInfo, SceneInfo, SceneResponse};
pub use shape::{
    decode_shape_data, decode_shape_data_to_end, decode_shape_list, decode_shape_record,
    ShapeData, ShapeRecord, ShapeSummary,
};
pub use sphere::{decode_sphere, SphereData};
pub use user_data::{UserData, UserValue};
