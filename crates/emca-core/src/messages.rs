//! Message identifiers and shape tags of the EMCA TCP protocol.

use crate::error::{EmcaError, Result};

/// Message header sent as a `u16` before every protocol message.
///
/// Ids outside this table are plugin messages and are resolved by whoever
/// owns the plugin registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ServerMsg {
    // connection management (0x000x)
    Hello = 0x0001,
    SupportedPlugins = 0x0002,
    Disconnect = 0x000E,
    Quit = 0x000F,

    // requests from the client (0x001x)
    RequestRenderInfo = 0x0011,
    RequestRenderImage = 0x0012,
    RequestRenderPixel = 0x0013,
    RequestCamera = 0x0014,
    RequestScene = 0x0015,

    // responses to the client (0x002x)
    ResponseRenderInfo = 0x0021,
    ResponseRenderImage = 0x0022,
    ResponseRenderPixel = 0x0023,
    ResponseCamera = 0x0024,
    ResponseScene = 0x0025,
}

impl ServerMsg {
    /// Looks up a header id. Returns `None` for plugin ids.
    pub fn from_id(id: u16) -> Option<Self> {
        let msg = match id {
            0x0001 => Self::Hello,
            0x0002 => Self::SupportedPlugins,
            0x000E => Self::Disconnect,
            0x000F => Self::Quit,
            0x0011 => Self::RequestRenderInfo,
            0x0012 => Self::RequestRenderImage,
            0x0013 => Self::RequestRenderPixel,
            0x0014 => Self::RequestCamera,
            0x0015 => Self::RequestScene,
            0x0021 => Self::ResponseRenderInfo,
            0x0022 => Self::ResponseRenderImage,
            0x0023 => Self::ResponseRenderPixel,
            0x0024 => Self::ResponseCamera,
            0x0025 => Self::ResponseScene,
            _ => return None,
        };
        Some(msg)
    }

    /// The `u16` sent on the wire.
    pub fn id(self) -> u16 {
        self as u16
    }

    /// The response a request is answered with, if it has one.
    pub fn response(self) -> Option<Self> {
        match self {
            Self::RequestRenderInfo => Some(Self::ResponseRenderInfo),
            Self::RequestRenderImage => Some(Self::ResponseRenderImage),
            Self::RequestRenderPixel => Some(Self::ResponseRenderPixel),
            Self::RequestCamera => Some(Self::ResponseCamera),
            Self::RequestScene => Some(Self::ResponseScene),
            _ => None,
        }
    }
}

/// Tag that precedes every shape record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ShapeType {
    TriangleMesh = 0,
    SphereMesh = 1,
}

impl ShapeType {
    /// The `u16` tag sent before the record body.
    pub fn tag(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for ShapeType {
    type Error = EmcaError;

    fn try_from(tag: u16) -> Result<Self> {
        match tag {
            0 => Ok(Self::TriangleMesh),
            1 => Ok(Self::SphereMesh),
            other => Err(EmcaError::UnsupportedShapeType(other)),
        }
    }
}
