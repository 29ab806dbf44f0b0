use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{Result, StudioError},
    styles::{DEFAULT_STYLE_ID, StylePreset},
    util::now_utc,
};

pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Square,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    /// Screen the ratio is meant for.
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "Desktop",
            AspectRatio::Portrait => "Phone",
            AspectRatio::Square => "Square",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single generate action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    #[serde(default, alias = "aspectRatio")]
    pub aspect_ratio: AspectRatio,
    #[serde(default = "default_style_preset", alias = "stylePreset")]
    pub style_preset: String,
    #[serde(default = "default_enhance_prompt", alias = "enhancePrompt")]
    pub enhance_prompt: bool,
}

fn default_style_preset() -> String {
    DEFAULT_STYLE_ID.to_string()
}

fn default_enhance_prompt() -> bool {
    true
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into().trim().to_string(),
            aspect_ratio: AspectRatio::default(),
            style_preset: default_style_preset(),
            enhance_prompt: default_enhance_prompt(),
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.style_preset = style_id.into();
        self
    }

    pub fn with_enhancement(mut self, enabled: bool) -> Self {
        self.enhance_prompt = enabled;
        self
    }

    /// Checks the request and resolves its style against the catalog.
    ///
    /// Requests arriving over the wire are not trimmed by `new`, so the
    /// prompt is trimmed here as well before the emptiness check.
    pub fn validate(mut self) -> Result<(Self, &'static StylePreset)> {
        let trimmed = self.prompt.trim();
        if trimmed.is_empty() {
            return Err(StudioError::invalid("prompt must not be empty"));
        }
        if trimmed.len() != self.prompt.len() {
            self.prompt = trimmed.to_string();
        }

        let style = StylePreset::find(&self.style_preset).ok_or_else(|| {
            StudioError::invalid(format!("unknown style preset: {}", self.style_preset))
        })?;

        Ok((self, style))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn from_base64(encoded: &str, mime_type: Option<&str>) -> Result<Self> {
        let data = BASE64_STANDARD.decode(encoded.trim())?;
        let mime_type = mime_type
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);
        Ok(Self::new(data, mime_type))
    }

    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64_STANDARD.encode(&self.data)
        )
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Prompt handed to the image model, and whether enhancement produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePrompt {
    pub text: String,
    pub enhanced: bool,
}

impl EffectivePrompt {
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            enhanced: false,
        }
    }

    pub fn enhanced(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            enhanced: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Wallpaper {
    pub id: Uuid,
    pub image: ImageData,
    /// Prompt actually sent to the image model.
    pub prompt: String,
    pub original_prompt: String,
    pub enhanced: bool,
    pub style_preset: String,
    pub aspect_ratio: AspectRatio,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
}

impl Wallpaper {
    pub fn assemble(params: &GenerationParams, prompt: EffectivePrompt, image: ImageData) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            enhanced: prompt.enhanced,
            prompt: prompt.text,
            original_prompt: params.prompt.clone(),
            style_preset: params.style_preset.clone(),
            aspect_ratio: params.aspect_ratio,
            favorite: false,
            created_at: now_utc(),
        }
    }

    pub fn download_name(&self) -> String {
        format!("pixel-wall-{}.{}", self.id, self.image.file_extension())
    }

    pub fn view(&self) -> WallpaperView {
        WallpaperView {
            id: self.id,
            url: self.image.data_url(),
            mime_type: self.image.mime_type.clone(),
            prompt: self.prompt.clone(),
            original_prompt: self.original_prompt.clone(),
            enhanced: self.enhanced,
            style_preset: self.style_preset.clone(),
            aspect_ratio: self.aspect_ratio,
            favorite: self.favorite,
            created_at: self.created_at,
        }
    }

    /// Same as [`Wallpaper::view`] without the encoded image, for events.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "prompt": self.prompt,
            "enhanced": self.enhanced,
            "style_preset": self.style_preset,
            "aspect_ratio": self.aspect_ratio,
            "favorite": self.favorite,
            "created_at": self.created_at,
        })
    }
}

/// Wire form of a wallpaper; the image travels as a `data:` URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallpaperView {
    pub id: Uuid,
    pub url: String,
    pub mime_type: String,
    pub prompt: String,
    pub original_prompt: String,
    pub enhanced: bool,
    pub style_preset: String,
    pub aspect_ratio: AspectRatio,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
}
