use std::{env, net::SocketAddr, path::Path, time::Duration};

use anyhow::{Context, anyhow};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/pixel_wall.toml";
const ENV_PREFIX: &str = "PIXEL_WALL";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_TIMEOUT_SECONDS: u64 = 120;
const MIN_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Loads `PIXEL_WALL_CONFIG` (or the default path) layered under
    /// `PIXEL_WALL__SECTION__KEY` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            env::var("PIXEL_WALL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path), fallback_api_key())
    }

    pub fn load_from(config_path: &Path, fallback_api_key: Option<String>) -> anyhow::Result<Self> {
        Self::load_layered(config_path, None, fallback_api_key)
    }

    /// `env_vars` replaces the process environment when given.
    fn load_layered(
        config_path: &Path,
        env_vars: Option<::config::Map<String, String>>,
        fallback_api_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(config_path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .build()
            .with_context(|| format!("failed to read configuration {:?}", config_path))?;

        let file_config: FileConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {:?}", config_path))?;

        let gemini = file_config
            .gemini
            .unwrap_or_default()
            .into_domain(fallback_api_key)?;
        let server = file_config.server.unwrap_or_default().into_domain()?;

        Ok(Self { gemini, server })
    }
}

/// Credential from the environment when the config does not carry one.
fn fallback_api_key() -> Option<String> {
    ["GEMINI_API_KEY", "API_KEY"]
        .iter()
        .find_map(|name| env::var(name).ok())
        .filter(|key| !key.trim().is_empty())
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    gemini: Option<FileGeminiConfig>,
    #[serde(default)]
    server: Option<FileServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct FileGeminiConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    text_model: Option<String>,
    #[serde(default)]
    image_model: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

impl FileGeminiConfig {
    fn into_domain(self, fallback_api_key: Option<String>) -> anyhow::Result<GeminiConfig> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or(fallback_api_key)
            .ok_or_else(|| {
                anyhow!("gemini.api_key is not configured (set GEMINI_API_KEY or API_KEY)")
            })?;

        let timeout_seconds = self
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
            .max(MIN_TIMEOUT_SECONDS);

        Ok(GeminiConfig {
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            text_model: self
                .text_model
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: self
                .image_model
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_seconds),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
struct FileServerConfig {
    #[serde(default)]
    bind_addr: Option<String>,
}

impl FileServerConfig {
    fn into_domain(self) -> anyhow::Result<ServerConfig> {
        let bind_addr_str = self
            .bind_addr
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .with_context(|| format!("failed to parse server.bind_addr: {}", bind_addr_str))?;

        Ok(ServerConfig { bind_addr })
    }
}
