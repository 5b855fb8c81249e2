//! Core abstractions for emca-rs.
//!
//! This crate provides the pieces shared by every layer of the EMCA client:
//! - [`Stream`] trait: the little-endian wire codec, plus the in-memory [`ByteStream`]
//! - Protocol message ids ([`ServerMsg`]) and shape tags ([`ShapeType`])
//! - The [`EmcaError`] taxonomy
//! - Client configuration and decode limits

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod color;
pub mod error;
pub mod messages;
pub mod options;
pub mod stream;

pub use color::Color4f;
pub use error::{EmcaError, Result};
pub use messages::{ServerMsg, ShapeType};
pub use options::{ClientOptions, DecodeLimits};
pub use stream::{ByteStream, Stream};

// Re-export glam types for convenience
pub use glam::{Vec3, Vec4};
