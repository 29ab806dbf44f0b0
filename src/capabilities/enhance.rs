use std::sync::Arc;

use async_trait::async_trait;
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::gemini,
};
use tracing::{debug, warn};

use crate::{
    capabilities::TextModel,
    config::GeminiConfig,
    errors::{Result, StudioError},
    models::EffectivePrompt,
    styles::StylePreset,
};

type GeminiCompletionModel = <gemini::Client as CompletionClient>::CompletionModel;

/// Gemini text model driven through a bare rig agent.
///
/// No preamble is set so the request carries exactly one user-role text
/// part; the whole directive lives in that part.
pub struct GeminiTextModel {
    agent: Agent<GeminiCompletionModel>,
    model_name: String,
}

impl GeminiTextModel {
    /// Text model on the configured API root, sharing the caller's HTTP
    /// transport so the configured timeout bounds enhancement too.
    pub fn from_config(config: &GeminiConfig, http_client: reqwest::Client) -> Result<Self> {
        let base_url = crate::providers::gemini::base_url(config);
        let client = gemini::Client::builder(&config.api_key)
            .base_url(&base_url)
            .custom_client(http_client)
            .build()
            .map_err(|err| StudioError::other(format!("failed to build Gemini client: {err}")))?;
        Ok(Self::new(&client, &config.text_model))
    }

    pub fn new(client: &gemini::Client, model_name: &str) -> Self {
        let agent = client.agent(model_name).name("prompt-enhancer").build();
        Self {
            agent,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl TextModel for GeminiTextModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(self.agent.prompt(prompt).await?)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Builds the art-director instruction sent to the text model.
pub fn enhancement_directive(concept: &str, style: &StylePreset) -> String {
    let mut lines = vec![
        "You are an expert AI art director.".to_string(),
        "Rewrite the user's concept into a descriptive, high-quality image generation prompt."
            .to_string(),
        String::new(),
        format!("User Concept: \"{concept}\""),
    ];

    if style.is_active() {
        lines.push(format!(
            "Style Context: {} ({})",
            style.label, style.description
        ));
        lines.push(format!(
            "Visual Elements to Integrate: {}",
            style.prompt_suffix
        ));
    } else {
        lines.push("Style Context: Neutral / Faithful to User Concept".to_string());
    }

    lines.push(String::new());
    lines.push("Instructions:".to_string());
    lines.push("1. Describe the scene, lighting, and composition in detail.".to_string());
    if style.is_active() {
        lines.push("2. Integrate the style's visual elements naturally.".to_string());
    } else {
        lines.push("2. Stay faithful to the concept without imposing a style.".to_string());
    }
    lines.push("3. Output ONLY the final prompt text.".to_string());

    lines.join("\n")
}

/// Best-effort prompt rewriting.
pub struct PromptEnhancer {
    model: Arc<dyn TextModel>,
}

impl PromptEnhancer {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Returns the enhanced prompt, or the concept unchanged when the model
    /// call fails or comes back empty. Never returns an error.
    pub async fn enhance(&self, concept: &str, style: &StylePreset) -> EffectivePrompt {
        match self.try_enhance(concept, style).await {
            Ok(text) => {
                debug!(
                    target: "prompt_enhancer",
                    model = self.model.model_name(),
                    style = style.id,
                    enhanced = %text,
                    "prompt enhanced"
                );
                EffectivePrompt::enhanced(text)
            }
            Err(err) => {
                warn!(
                    target: "prompt_enhancer",
                    error = %err,
                    model = self.model.model_name(),
                    "prompt enhancement failed, proceeding with original prompt"
                );
                EffectivePrompt::original(concept)
            }
        }
    }

    async fn try_enhance(&self, concept: &str, style: &StylePreset) -> Result<String> {
        let directive = enhancement_directive(concept, style);
        let response = self.model.complete(&directive).await?;
        let text = response.trim();
        if text.is_empty() {
            return Err(StudioError::EmptyEnhancement);
        }
        Ok(text.to_string())
    }
}
