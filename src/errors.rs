use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudioError>;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("a wallpaper is already being generated")]
    Busy,

    #[error("wallpaper not found: {0}")]
    NotFound(String),

    #[error("no candidates returned from the image model")]
    NoCandidates,

    #[error("no content parts returned from the image model")]
    NoContentParts,

    #[error("no image data found in the image model response")]
    NoImageData,

    #[error("image payload could not be decoded: {0}")]
    InvalidImageData(#[from] base64::DecodeError),

    #[error("model service returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("text model returned an empty response")]
    EmptyEnhancement,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("LLM request failed: {0}")]
    Prompt(#[from] rig::completion::PromptError),

    #[error("internal error: {0}")]
    Other(String),
}

impl StudioError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Failures raised by the synthesis call or its transport.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::NoCandidates
                | Self::NoContentParts
                | Self::NoImageData
                | Self::InvalidImageData(_)
                | Self::Api { .. }
                | Self::Reqwest(_)
                | Self::Prompt(_)
                | Self::EmptyEnhancement
        )
    }
}

impl From<anyhow::Error> for StudioError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}
