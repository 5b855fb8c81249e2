//! Configuration options for the EMCA client.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EmcaError, Result};

/// Connection and decoding options.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// config file only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Host running the EMCA server.
    pub hostname: String,

    /// TCP port of the EMCA server.
    pub port: u16,

    /// Timeout for establishing the connection, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Read/write timeout once connected, in milliseconds (0 = blocking).
    pub io_timeout_ms: u64,

    /// How long to wait for the heatmap scene that may follow a rendered
    /// image, in milliseconds.
    pub heatmap_wait_ms: u64,

    /// Plausibility caps applied while decoding records.
    pub limits: DecodeLimits,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 50013,
            connect_timeout_ms: 5_000,
            io_timeout_ms: 30_000,
            heatmap_wait_ms: 500,
            limits: DecodeLimits::default(),
        }
    }
}

impl ClientOptions {
    /// Parses options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes options as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options = Self::from_json_str(&text)?;
        log::debug!("loaded client options from {}", path.as_ref().display());
        Ok(options)
    }

    /// Writes options to a JSON file, replacing any existing one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json_string()?)?;
        Ok(())
    }

    /// `hostname:port`, as accepted by `ToSocketAddrs`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

/// Upper bounds on element counts announced by the peer.
///
/// A count above its cap is treated as a malformed record rather than an
/// allocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    pub max_vertices: u32,
    pub max_triangles: u32,
    pub max_shapes: u32,
    /// Paths per pixel package.
    pub max_paths: u32,
    /// Intersections per path.
    pub max_intersections: u32,
    /// Key/value items per user data block.
    pub max_user_items: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_vertices: 1 << 26,
            max_triangles: 1 << 26,
            max_shapes: 1 << 20,
            max_paths: 1 << 20,
            max_intersections: 1 << 16,
            max_user_items: 1 << 16,
        }
    }
}

impl DecodeLimits {
    /// Validates a declared count against `cap`.
    ///
    /// `what` names the field in the resulting error message.
    pub fn check(what: &str, count: u32, cap: u32) -> Result<usize> {
        if count > cap {
            return Err(EmcaError::malformed(format!(
                "{what} count {count} exceeds limit {cap}"
            )));
        }
        usize::try_from(count)
            .map_err(|_| EmcaError::malformed(format!("{what} count {count} exceeds address space")))
    }
}
