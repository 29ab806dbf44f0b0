use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    capabilities::{GeminiTextModel, ImageGenerator, ImageModel, PromptEnhancer, TextModel},
    config::GeminiConfig,
    errors::{Result, StudioError},
    gallery::Gallery,
    models::{EffectivePrompt, GenerationParams, Wallpaper},
    providers::gemini::{self, GeminiRestClient},
    sse::BroadcastSender,
    styles::StylePreset,
};

/// Runs the generation pipeline and owns the session gallery.
pub struct WallpaperStudio {
    enhancer: PromptEnhancer,
    image: Arc<dyn ImageModel>,
    gallery: RwLock<Gallery>,
    generating: AtomicBool,
    broadcaster: Option<BroadcastSender>,
}

impl WallpaperStudio {
    pub fn new(
        text: Arc<dyn TextModel>,
        image: Arc<dyn ImageModel>,
        broadcaster: Option<BroadcastSender>,
    ) -> Self {
        Self {
            enhancer: PromptEnhancer::new(text),
            image,
            gallery: RwLock::new(Gallery::new()),
            generating: AtomicBool::new(false),
            broadcaster,
        }
    }

    pub fn from_config(config: &GeminiConfig, broadcaster: Option<BroadcastSender>) -> Result<Self> {
        let http_client = gemini::http_client(config)?;
        let text = GeminiTextModel::from_config(config, http_client.clone())?;

        let rest_client = GeminiRestClient::with_http_client(config, http_client);
        let image = ImageGenerator::new(rest_client, &config.image_model);

        info!(
            target: "studio",
            text_model = %config.text_model,
            image_model = %config.image_model,
            "wallpaper studio configured"
        );

        Ok(Self::new(Arc::new(text), Arc::new(image), broadcaster))
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Enhances (optionally) and synthesizes one wallpaper, then adds it to
    /// the gallery. Only one generation may be in flight at a time.
    pub async fn generate(&self, params: GenerationParams) -> Result<Wallpaper> {
        let (params, style) = params.validate()?;
        let _guard = GeneratingGuard::acquire(&self.generating).ok_or(StudioError::Busy)?;

        info!(
            target: "studio",
            style = style.id,
            aspect_ratio = %params.aspect_ratio,
            enhance = params.enhance_prompt,
            "generation started"
        );
        self.broadcast(
            "generation.started",
            json!({
                "prompt": params.prompt,
                "style_preset": style.id,
                "aspect_ratio": params.aspect_ratio,
                "enhance_prompt": params.enhance_prompt,
            }),
        );

        match self.run_pipeline(&params, style).await {
            Ok(wallpaper) => {
                let gallery_size = {
                    let mut gallery = self.gallery.write().await;
                    gallery.add(wallpaper.clone());
                    gallery.len()
                };
                info!(
                    target: "studio",
                    id = %wallpaper.id,
                    enhanced = wallpaper.enhanced,
                    gallery_size,
                    "wallpaper created"
                );
                // Announced only once the gallery can serve it.
                self.broadcast("wallpaper.created", wallpaper.summary());
                Ok(wallpaper)
            }
            Err(err) => {
                error!(target: "studio", error = %err, "wallpaper generation failed");
                self.broadcast(
                    "generation.failed",
                    json!({
                        "prompt": params.prompt,
                        "message": err.to_string(),
                    }),
                );
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        params: &GenerationParams,
        style: &'static StylePreset,
    ) -> Result<Wallpaper> {
        let prompt = if params.enhance_prompt {
            let prompt = self.enhancer.enhance(&params.prompt, style).await;
            if prompt.enhanced {
                self.broadcast("prompt.enhanced", json!({ "prompt": prompt.text }));
            } else {
                self.broadcast(
                    "prompt.enhancement_skipped",
                    json!({ "prompt": prompt.text }),
                );
            }
            prompt
        } else {
            EffectivePrompt::original(params.prompt.clone())
        };

        let image = self
            .image
            .generate_image(&prompt.text, params.aspect_ratio)
            .await?;

        Ok(Wallpaper::assemble(params, prompt, image))
    }

    pub async fn wallpapers(&self, favorites_only: bool) -> Vec<Wallpaper> {
        let gallery = self.gallery.read().await;
        if favorites_only {
            gallery.favorites().cloned().collect()
        } else {
            gallery.iter().cloned().collect()
        }
    }

    pub async fn wallpaper(&self, id: Uuid) -> Result<Wallpaper> {
        self.gallery
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::NotFound(id.to_string()))
    }

    pub async fn toggle_favorite(&self, id: Uuid) -> Result<Wallpaper> {
        let mut gallery = self.gallery.write().await;
        let favorite = gallery
            .toggle_favorite(id)
            .ok_or_else(|| StudioError::NotFound(id.to_string()))?;
        self.broadcast(
            "wallpaper.favorite",
            json!({ "id": id, "favorite": favorite }),
        );
        gallery
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::NotFound(id.to_string()))
    }

    pub async fn select(&self, id: Uuid) -> Result<Wallpaper> {
        self.gallery
            .write()
            .await
            .select(id)
            .cloned()
            .ok_or_else(|| StudioError::NotFound(id.to_string()))
    }

    pub async fn clear_selection(&self) {
        self.gallery.write().await.clear_selection();
    }

    pub async fn selected(&self) -> Option<Wallpaper> {
        self.gallery.read().await.selected().cloned()
    }

    fn broadcast(&self, event: &str, payload: Value) {
        if let Some(broadcaster) = &self.broadcaster {
            crate::sse::broadcast_json(broadcaster, event, payload);
        }
    }
}

/// Holds the generating flag for the lifetime of one request.
struct GeneratingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> GeneratingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::AspectRatio,
        testing::{ImageOutcome, MockImage, MockText, PNG_BYTES},
    };

    const APPLE: &str = "A transparent glass apple filled with a galaxy";

    fn studio(text: Arc<MockText>, image: Arc<MockImage>) -> WallpaperStudio {
        WallpaperStudio::new(text, image, None)
    }

    #[tokio::test]
    async fn literal_concept_without_enhancement() {
        let text = MockText::replying("should not be used");
        let image = MockImage::with(ImageOutcome::Image);
        let studio = studio(text.clone(), image.clone());

        let params = GenerationParams::new(APPLE)
            .with_style("none")
            .with_aspect_ratio(AspectRatio::Square)
            .with_enhancement(false);
        let wallpaper = studio.generate(params).await.unwrap();

        assert_eq!(text.call_count(), 0);
        assert_eq!(
            image.recorded_inputs(),
            vec![(APPLE.to_string(), AspectRatio::Square)]
        );
        assert_eq!(wallpaper.prompt, APPLE);
        assert!(!wallpaper.enhanced);
        assert_eq!(wallpaper.aspect_ratio, AspectRatio::Square);
        assert_eq!(wallpaper.image.data, PNG_BYTES);
        assert_eq!(studio.wallpapers(false).await.len(), 1);
    }

    #[tokio::test]
    async fn enhanced_prompt_feeds_synthesis() {
        let text = MockText::replying("  A swirling nebula sealed inside a crystal apple  ");
        let image = MockImage::with(ImageOutcome::Image);
        let studio = studio(text.clone(), image.clone());

        let wallpaper = studio
            .generate(GenerationParams::new(APPLE).with_style("fantasy"))
            .await
            .unwrap();

        let enhanced = "A swirling nebula sealed inside a crystal apple";
        assert_eq!(wallpaper.prompt, enhanced);
        assert_eq!(wallpaper.original_prompt, APPLE);
        assert!(wallpaper.enhanced);
        assert_eq!(image.recorded_inputs()[0].0, enhanced);
        assert!(text.recorded_inputs()[0].contains(APPLE));
    }

    #[tokio::test]
    async fn failed_enhancement_still_synthesizes_original() {
        let text = MockText::failing();
        let image = MockImage::with(ImageOutcome::Image);
        let studio = studio(text.clone(), image.clone());

        let wallpaper = studio.generate(GenerationParams::new(APPLE)).await.unwrap();

        assert_eq!(text.call_count(), 1);
        assert_eq!(image.call_count(), 1);
        assert_eq!(wallpaper.prompt, APPLE);
        assert!(!wallpaper.enhanced);
    }

    #[tokio::test]
    async fn stalled_text_model_times_out_and_falls_back() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = GeminiConfig {
            api_key: "test-key".to_string(),
            base_url: format!("http://{addr}/"),
            text_model: "text".to_string(),
            image_model: "image".to_string(),
            timeout: std::time::Duration::from_millis(200),
        };
        let http_client = gemini::http_client(&config).unwrap();
        let text = GeminiTextModel::from_config(&config, http_client).unwrap();
        let image = MockImage::with(ImageOutcome::Image);
        let studio = WallpaperStudio::new(Arc::new(text), image.clone(), None);

        let wallpaper = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            studio.generate(GenerationParams::new(APPLE)),
        )
        .await
        .expect("enhancement must be bounded by the configured timeout")
        .unwrap();

        assert!(!wallpaper.enhanced);
        assert_eq!(wallpaper.prompt, APPLE);
        assert_eq!(image.call_count(), 1);
        assert!(!studio.is_generating());
    }

    #[tokio::test]
    async fn synthesis_failure_produces_no_wallpaper() {
        let image = MockImage::with(ImageOutcome::NoCandidates);
        let studio = studio(MockText::failing(), image.clone());

        let err = studio
            .generate(GenerationParams::new(APPLE).with_enhancement(false))
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::NoCandidates));
        assert_eq!(image.call_count(), 1);
        assert!(studio.wallpapers(false).await.is_empty());
        assert!(!studio.is_generating());
    }

    #[tokio::test]
    async fn missing_inline_image_is_fatal() {
        let studio = studio(MockText::failing(), MockImage::with(ImageOutcome::NoImageData));
        let err = studio
            .generate(GenerationParams::new(APPLE).with_enhancement(false))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::NoImageData));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_models() {
        let text = MockText::replying("unused");
        let image = MockImage::with(ImageOutcome::Image);
        let studio = studio(text.clone(), image.clone());

        let err = studio.generate(GenerationParams::new("  ")).await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidRequest(_)));
        assert_eq!(text.call_count() + image.call_count(), 0);
    }

    #[tokio::test]
    async fn second_generation_while_busy_is_rejected() {
        let image = MockImage::gated();
        let studio = Arc::new(studio(MockText::failing(), image.clone()));

        let first = {
            let studio = studio.clone();
            tokio::spawn(async move {
                studio
                    .generate(GenerationParams::new(APPLE).with_enhancement(false))
                    .await
            })
        };

        image.gate().entered.notified().await;
        assert!(studio.is_generating());
        let err = studio
            .generate(GenerationParams::new("another idea").with_enhancement(false))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Busy));

        image.gate().release.notify_one();
        first.await.unwrap().unwrap();
        assert!(!studio.is_generating());
        assert_eq!(image.call_count(), 1);
    }

    #[tokio::test]
    async fn favorites_and_selection_round_trip() {
        let studio = studio(MockText::failing(), MockImage::with(ImageOutcome::Image));
        let wallpaper = studio
            .generate(GenerationParams::new(APPLE).with_enhancement(false))
            .await
            .unwrap();

        assert!(studio.toggle_favorite(wallpaper.id).await.unwrap().favorite);
        assert_eq!(studio.wallpapers(true).await.len(), 1);
        assert!(!studio.toggle_favorite(wallpaper.id).await.unwrap().favorite);
        assert!(studio.wallpapers(true).await.is_empty());

        assert!(matches!(
            studio.toggle_favorite(Uuid::new_v4()).await,
            Err(StudioError::NotFound(_))
        ));

        studio.select(wallpaper.id).await.unwrap();
        assert_eq!(studio.selected().await.map(|w| w.id), Some(wallpaper.id));
        studio.clear_selection().await;
        assert!(studio.selected().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pipeline_events_are_broadcast() {
        let (broadcaster, mut rx) = crate::sse::message_bus();
        let studio = Arc::new(WallpaperStudio::new(
            MockText::replying("a richer prompt"),
            MockImage::with(ImageOutcome::Image),
            Some(broadcaster),
        ));

        let listener = {
            let studio = studio.clone();
            tokio::spawn(async move {
                let mut events = Vec::new();
                loop {
                    let message = rx.recv().await.unwrap();
                    let value: Value = serde_json::from_str(&message).unwrap();
                    let event = value["event"].as_str().unwrap().to_string();
                    events.push(event.clone());
                    if event == "wallpaper.created" {
                        let id: Uuid = value["payload"]["id"].as_str().unwrap().parse().unwrap();
                        return (events, studio.wallpaper(id).await.map(|w| w.id));
                    }
                }
            })
        };

        let wallpaper = studio.generate(GenerationParams::new(APPLE)).await.unwrap();

        let (events, announced) = listener.await.unwrap();
        assert_eq!(
            events,
            ["generation.started", "prompt.enhanced", "wallpaper.created"]
        );
        assert_eq!(announced.unwrap(), wallpaper.id);
    }
}
