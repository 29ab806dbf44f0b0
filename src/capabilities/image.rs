use async_trait::async_trait;
use tracing::info;

use crate::{
    capabilities::ImageModel,
    errors::Result,
    models::{AspectRatio, ImageData},
    providers::gemini::{GenerateContentRequest, GeminiRestClient},
};

pub struct ImageGenerator {
    client: GeminiRestClient,
    model_name: String,
}

impl ImageGenerator {
    pub fn new(client: GeminiRestClient, model_name: &str) -> Self {
        Self {
            client,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl ImageModel for ImageGenerator {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageData> {
        let request = GenerateContentRequest::image(prompt, aspect_ratio);
        let response = self
            .client
            .generate_content(&self.model_name, &request)
            .await?;
        let image = response.into_image()?;

        info!(
            target: "image_generator",
            model = %self.model_name,
            %aspect_ratio,
            mime_type = %image.mime_type,
            bytes = image.data.len(),
            "image synthesized"
        );

        Ok(image)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
