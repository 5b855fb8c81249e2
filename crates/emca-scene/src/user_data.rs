//! Free-form key/value data attached to paths and intersections.
//!
//! Each item is a key string, a one- or two-character type identifier and
//! the value. Identifiers starting with a digit (`2i`, `3f`, ...) take a
//! second character. Items have no length prefix, so an unknown identifier
//! stops decoding with [`EmcaError::UnsupportedUserDataType`].

use std::fmt;

use emca_core::{Color4f, DecodeLimits, EmcaError, Result, Stream};
use glam::{IVec2, IVec3, Vec2, Vec3};

use crate::mesh::wire_count;

/// One value recorded by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum UserValue {
    Bool(bool),
    Float(f32),
    Double(f64),
    Int(i32),
    Int2(IVec2),
    Float2(Vec2),
    Int3(IVec3),
    Float3(Vec3),
    /// Four floats, used for colors.
    Float4(Color4f),
    String(String),
}

impl UserValue {
    /// The type identifier written before the value.
    pub fn type_id(&self) -> &'static str {
        match self {
            Self::Bool(_) => "?",
            Self::Float(_) => "f",
            Self::Double(_) => "d",
            Self::Int(_) => "i",
            Self::Int2(_) => "2i",
            Self::Float2(_) => "2f",
            Self::Int3(_) => "3i",
            Self::Float3(_) => "3f",
            Self::Float4(_) => "4f",
            Self::String(_) => "s",
        }
    }

    fn decode<S: Stream + ?Sized>(stream: &mut S, type_id: &[u8]) -> Result<Self> {
        let value = match type_id {
            b"?" => Self::Bool(stream.read_bool()?),
            b"f" => Self::Float(stream.read_f32()?),
            b"d" => Self::Double(stream.read_f64()?),
            b"i" => Self::Int(stream.read_i32()?),
            b"2i" => Self::Int2(IVec2::new(stream.read_i32()?, stream.read_i32()?)),
            b"2f" => Self::Float2(Vec2::new(stream.read_f32()?, stream.read_f32()?)),
            b"3i" => Self::Int3(IVec3::new(
                stream.read_i32()?,
                stream.read_i32()?,
                stream.read_i32()?,
            )),
            b"3f" => Self::Float3(stream.read_point3f()?),
            b"4f" => Self::Float4(stream.read_color4f()?),
            b"s" => Self::String(stream.read_string()?),
            other => {
                return Err(EmcaError::UnsupportedUserDataType(
                    String::from_utf8_lossy(other).into_owned(),
                ))
            }
        };
        Ok(value)
    }

    fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_raw(self.type_id().as_bytes())?;
        match self {
            Self::Bool(v) => stream.write_bool(*v),
            Self::Float(v) => stream.write_f32(*v),
            Self::Double(v) => stream.write_f64(*v),
            Self::Int(v) => stream.write_i32(*v),
            Self::Int2(v) => {
                stream.write_i32(v.x)?;
                stream.write_i32(v.y)
            }
            Self::Float2(v) => stream.write_float_array(&v.to_array()),
            Self::Int3(v) => {
                stream.write_i32(v.x)?;
                stream.write_i32(v.y)?;
                stream.write_i32(v.z)
            }
            Self::Float3(v) => stream.write_point3f(*v),
            Self::Float4(c) => stream.write_color4f(*c),
            Self::String(s) => stream.write_string(s),
        }
    }
}

impl fmt::Display for UserValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Int2(v) => write!(f, "{v}"),
            Self::Float2(v) => write!(f, "{v}"),
            Self::Int3(v) => write!(f, "{v}"),
            Self::Float3(v) => write!(f, "{v}"),
            Self::Float4(c) => write!(f, "{c}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Ordered key/value items. Keys may repeat; [`UserData::get`] returns the
/// last value written for a key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserData {
    items: Vec<(String, UserValue)>,
}

impl UserData {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    pub fn push(&mut self, key: impl Into<String>, value: UserValue) {
        self.items.push((key.into(), value));
    }

    /// Returns the value most recently recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&UserValue> {
        self.items.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the block holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserValue)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Reads a `u32` item count followed by that many items.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let count = DecodeLimits::check("user data item", stream.read_u32()?, limits.max_user_items)?;
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let key = stream.read_string()?;
            let first = stream.read_u8()?;
            let value = if (b'1'..=b'9').contains(&first) {
                let second = stream.read_u8()?;
                UserValue::decode(stream, &[first, second])?
            } else {
                UserValue::decode(stream, &[first])?
            };
            items.push((key, value));
        }
        Ok(Self { items })
    }

    /// Writes the item count followed by every item.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_u32(wire_count("user data item", self.items.len())?)?;
        for (key, value) in &self.items {
            stream.write_string(key)?;
            value.encode(stream)?;
        }
        Ok(())
    }
}

impl FromIterator<(String, UserValue)> for UserData {
    fn from_iter<I: IntoIterator<Item = (String, UserValue)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
