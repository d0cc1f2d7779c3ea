use serde::{Deserialize, Serialize};
use std::fmt;

/// Canvas aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[default]
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "4:5")]
    Portrait4x5,
    #[serde(rename = "5:4")]
    Landscape5x4,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait4x5 => "4:5",
            AspectRatio::Landscape5x4 => "5:4",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Ultrawide => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered element of an outgoing generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPart {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

/// One unit of the streamed service response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
    /// Structurally valid event that carried no payload.
    Empty,
}

impl StreamChunk {
    pub fn text(fragment: impl Into<String>) -> Self {
        StreamChunk::Text(fragment.into())
    }

    pub fn image(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        StreamChunk::Image {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StreamChunk::Text(text) => text.is_empty(),
            StreamChunk::Image { data, .. } => data.is_empty(),
            StreamChunk::Empty => true,
        }
    }
}

/// Service-side settings shared by every generation mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGenerationConfig {
    pub aspect_ratio: AspectRatio,
    pub image_size: String,
}
