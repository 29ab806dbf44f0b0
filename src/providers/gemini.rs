use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::GeminiConfig,
    errors::{Result, StudioError},
    models::{AspectRatio, ImageData},
};

/// Thin REST client for the Gemini `generateContent` endpoint.
///
/// Used for image synthesis, where the image config (aspect ratio) is not
/// expressible through the rig completion API.
#[derive(Clone)]
pub struct GeminiRestClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

/// HTTP transport shared by every Gemini call: one user agent, one timeout.
pub fn http_client(config: &GeminiConfig) -> Result<HttpClient> {
    Ok(HttpClient::builder()
        .user_agent(concat!("pixel-wall/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout)
        .build()?)
}

impl GeminiRestClient {
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        Ok(Self::with_http_client(config, http_client(config)?))
    }

    pub fn with_http_client(config: &GeminiConfig, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: base_url(config),
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse> {
        let endpoint = self.endpoint(model);
        debug!(target: "gemini", %endpoint, "sending generateContent request");

        let response = self
            .http_client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudioError::Api { status, body });
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

/// Configured API root without a trailing slash.
pub fn base_url(config: &GeminiConfig) -> String {
    config.base_url.trim_end_matches('/').to_string()
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn image(prompt: &'a str, aspect_ratio: AspectRatio) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: Some(GenerationConfig {
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str(),
                },
            }),
        }
    }
}

#[derive(Serialize, Debug)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    image_config: ImageConfig,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

impl GenerateContentResponse {
    /// Pulls the first inline image out of the first candidate.
    pub fn into_image(self) -> Result<ImageData> {
        let candidate = self
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or(StudioError::NoCandidates)?;

        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .filter(|parts| !parts.is_empty())
            .ok_or(StudioError::NoContentParts)?;

        let inline = parts
            .into_iter()
            .filter_map(|part| part.inline_data)
            .find(|inline| inline.data.as_deref().is_some_and(|data| !data.is_empty()))
            .ok_or(StudioError::NoImageData)?;

        let data = inline.data.ok_or(StudioError::NoImageData)?;
        ImageData::from_base64(&data, inline.mime_type.as_deref())
    }
}
