mod api;
mod capabilities;
mod config;
mod errors;
mod gallery;
mod models;
mod orchestrator;
mod providers;
mod sse;
mod styles;
mod surprise;
#[cfg(test)]
mod testing;
mod util;

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

use crate::{
    api::AppState,
    errors::Result,
    orchestrator::WallpaperStudio,
    styles::STYLE_PRESETS,
    util::{format_local, now_utc},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = config::AppConfig::load()?;
    let bind_addr = config.server.bind_addr;

    let (broadcaster, _bus_rx) = crate::sse::message_bus();
    let studio = Arc::new(WallpaperStudio::from_config(
        &config.gemini,
        Some(broadcaster.clone()),
    )?);

    let state = AppState {
        studio,
        broadcaster: broadcaster.clone(),
    };

    let mut server_task = tokio::spawn(async move {
        if let Err(err) = crate::api::run_server(bind_addr, state).await {
            error!(target: "api", error = ?err, "HTTP server exited with an error");
        }
    });

    crate::sse::broadcast_json(
        &broadcaster,
        "system.ready",
        json!({
            "message": "pixel-wall is ready",
            "text_model": config.gemini.text_model,
            "image_model": config.gemini.image_model,
            "styles": STYLE_PRESETS.len(),
        }),
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!(target: "studio", "shutdown signal received");
            server_task.abort();
        }
        _ = &mut server_task => {
            error!(target: "studio", "HTTP server stopped unexpectedly");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_timer(LocalTimer)
        .init();

    info!("tracing initialized");
}

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", format_local(&now_utc(), "%Y-%m-%d %H:%M:%S%:z"))
    }
}
