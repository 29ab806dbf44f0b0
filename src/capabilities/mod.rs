mod enhance;
mod image;

pub use enhance::{GeminiTextModel, PromptEnhancer};
pub use image::ImageGenerator;

use async_trait::async_trait;

use crate::{
    errors::Result,
    models::{AspectRatio, ImageData},
};

/// Text generation backend used by the enhancement step.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Sends `prompt` as a single user-role text part and returns the reply.
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Image generation backend used by the synthesis step.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageData>;

    fn model_name(&self) -> &str;
}
