//! emca-rs: client side of the EMCA Monte Carlo path debugging protocol.
//!
//! A renderer running the EMCA server exposes its scene, camera and
//! per-pixel path data over TCP. This crate connects to it, performs the
//! handshake, and decodes the responses into typed records that a viewer can
//! turn into render objects.
//!
//! # Quick Start
//!
//! ```no_run
//! use emca::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let mut client = Client::connect(&ClientOptions::default())?;
//!     let camera = client.request_camera()?;
//!     let scene = client.request_scene()?;
//!
//!     for shape in &scene.shapes {
//!         match shape {
//!             ShapeRecord::Mesh(mesh) => println!("mesh with {} triangles", mesh.triangle_count()),
//!             ShapeRecord::Sphere(sphere) => println!("sphere of radius {}", sphere.radius),
//!         }
//!     }
//!     println!("camera at {}", camera.origin);
//!
//!     client.disconnect()
//! }
//! ```
//!
//! # Layers
//!
//! - [`emca_core`]: the [`Stream`] codec, message ids, errors, options
//! - [`emca_scene`]: mesh/sphere/shape decoders, the scene response and pixel packages
//! - this crate: [`SocketStream`], [`Client`] and logging setup

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod client;
mod init;

// Re-export core types
pub use emca_core::{
    error::{EmcaError, Result},
    messages::{ServerMsg, ShapeType},
    options::{ClientOptions, DecodeLimits},
    stream::{ByteStream, Stream},
    Color4f, Vec3, Vec4,
};

// Re-export scene records
pub use emca_scene::{
    decode_mesh, decode_shape_data, decode_shape_data_to_end, decode_shape_list, decode_sphere,
    encode_mesh, CameraData, HeatmapInfo, IntersectionData, MeshData, NextEventEstimate, PathData,
    PixelData, RenderInfo, SceneInfo, SceneResponse, ShapeData, ShapeRecord, ShapeSummary,
    SphereData, UserData, UserValue,
};

pub use client::{Client, RenderedImage, SocketStream};
pub use init::{fetch_scene, init_logging};

pub use glam::UVec3;
