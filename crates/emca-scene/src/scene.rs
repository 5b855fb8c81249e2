//! Scene response payload: heatmap header plus the shape list.

use emca_core::{DecodeLimits, Result, Stream};

use crate::shape::ShapeData;

/// Heatmap display settings sent ahead of heatmap proxy meshes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeatmapInfo {
    pub colormap: String,
    pub show_colorbar: bool,
    pub colorbar_label: String,
}

/// Header of a scene response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneInfo {
    /// Present when the shapes carry per-face heatmap colors.
    pub heatmap: Option<HeatmapInfo>,
}

impl SceneInfo {
    /// Returns true if a heatmap header is present.
    pub fn has_heatmap(&self) -> bool {
        self.heatmap.is_some()
    }

    /// Reads the `has_heatmap` flag and, if set, the heatmap header.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S) -> Result<Self> {
        let heatmap = if stream.read_bool()? {
            Some(HeatmapInfo {
                colormap: stream.read_string()?,
                show_colorbar: stream.read_bool()?,
                colorbar_label: stream.read_string()?,
            })
        } else {
            None
        };
        Ok(Self { heatmap })
    }

    /// Writes the `has_heatmap` flag and the header if present.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        stream.write_bool(self.has_heatmap())?;
        if let Some(heatmap) = &self.heatmap {
            stream.write_string(&heatmap.colormap)?;
            stream.write_bool(heatmap.show_colorbar)?;
            stream.write_string(&heatmap.colorbar_label)?;
        }
        Ok(())
    }
}

/// Body of a scene response (everything after the message header).
///
/// With a heatmap the shapes are the renderer's heatmap proxy meshes,
/// otherwise they are the scene's own meshes and spheres.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneResponse {
    pub info: SceneInfo,
    pub shapes: ShapeData,
}

impl SceneResponse {
    /// Reads the scene header followed by the count-prefixed shape list.
    pub fn decode<S: Stream + ?Sized>(stream: &mut S, limits: &DecodeLimits) -> Result<Self> {
        let info = SceneInfo::decode(stream)?;
        let shapes = ShapeData::decode_list(stream, limits)?;
        Ok(Self { info, shapes })
    }

    /// Writes the scene header followed by the count-prefixed shape list.
    pub fn encode<S: Stream + ?Sized>(&self, stream: &mut S) -> Result<()> {
        self.info.encode(stream)?;
        self.shapes.encode_list(stream)
    }
}
