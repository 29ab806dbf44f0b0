use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    errors::{Result, StudioError},
    models::{AspectRatio, GenerationParams, WallpaperView},
    orchestrator::WallpaperStudio,
    sse::BroadcastSender,
    styles::{STYLE_PRESETS, StylePreset},
    surprise::{SurprisePick, surprise},
};

#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<WallpaperStudio>,
    pub broadcaster: BroadcastSender,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/styles", get(styles_handler))
        .route("/api/surprise", get(surprise_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/wallpapers", get(list_handler))
        .route("/api/wallpapers/{id}", get(wallpaper_handler))
        .route("/api/wallpapers/{id}/favorite", post(favorite_handler))
        .route("/api/wallpapers/{id}/download", get(download_handler))
        .route(
            "/api/selection",
            get(selected_handler)
                .put(select_handler)
                .delete(clear_selection_handler),
        )
        .route("/events", get(events_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "api", %addr, "HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| StudioError::other(format!("HTTP server error: {err}")))?;

    Ok(())
}

/// Maps studio failures onto HTTP statuses with a JSON body.
pub struct ApiError(StudioError);

impl From<StudioError> for ApiError {
    fn from(value: StudioError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            StudioError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            StudioError::NotFound(_) => StatusCode::NOT_FOUND,
            StudioError::Busy => StatusCode::CONFLICT,
            err if err.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            StudioError::InvalidRequest(_) => "invalid_request",
            StudioError::NotFound(_) => "not_found",
            StudioError::Busy => "busy",
            StudioError::NoCandidates => "no_candidates",
            StudioError::NoContentParts => "no_content_parts",
            StudioError::NoImageData => "no_image_data",
            err if err.is_upstream() => "upstream_failure",
            _ => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code(),
            "message": self.0.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(StudioError::invalid(rejection.body_text()))
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct AspectRatioOption {
    id: AspectRatio,
    label: &'static str,
}

#[derive(Serialize)]
struct StylesResponse {
    styles: &'static [StylePreset],
    aspect_ratios: Vec<AspectRatioOption>,
}

async fn styles_handler() -> Json<StylesResponse> {
    let aspect_ratios = AspectRatio::ALL
        .iter()
        .map(|ratio| AspectRatioOption {
            id: *ratio,
            label: ratio.label(),
        })
        .collect();

    Json(StylesResponse {
        styles: STYLE_PRESETS,
        aspect_ratios,
    })
}

async fn surprise_handler() -> Json<SurprisePick> {
    Json(surprise())
}

async fn generate_handler(
    State(state): State<AppState>,
    params: std::result::Result<Json<GenerationParams>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WallpaperView>)> {
    let Json(params) = params?;
    let wallpaper = state.studio.generate(params).await?;
    Ok((StatusCode::CREATED, Json(wallpaper.view())))
}

#[derive(Debug, Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    favorites: bool,
}

async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<WallpaperView>> {
    let wallpapers = state.studio.wallpapers(query.favorites).await;
    Json(wallpapers.iter().map(|wallpaper| wallpaper.view()).collect())
}

async fn wallpaper_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WallpaperView>> {
    Ok(Json(state.studio.wallpaper(id).await?.view()))
}

async fn favorite_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WallpaperView>> {
    Ok(Json(state.studio.toggle_favorite(id).await?.view()))
}

async fn download_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let wallpaper = state.studio.wallpaper(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", wallpaper.download_name());

    let content_type = HeaderValue::from_str(&wallpaper.image.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(crate::models::DEFAULT_MIME_TYPE));
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|err| StudioError::other(format!("invalid download header: {err}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        wallpaper.image.data,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    id: Uuid,
}

async fn selected_handler(State(state): State<AppState>) -> Json<Value> {
    let selected = state.studio.selected().await.map(|wallpaper| wallpaper.view());
    Json(json!({ "selected": selected }))
}

async fn select_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<SelectRequest>, JsonRejection>,
) -> ApiResult<Json<WallpaperView>> {
    let Json(request) = request?;
    Ok(Json(state.studio.select(request.id).await?.view()))
}

async fn clear_selection_handler(State(state): State<AppState>) -> StatusCode {
    state.studio.clear_selection().await;
    StatusCode::NO_CONTENT
}

async fn events_handler(State(state): State<AppState>) -> impl IntoResponse {
    crate::sse::event_stream(&state.broadcaster)
}
