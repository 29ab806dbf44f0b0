//! Scripted model doubles shared by the studio and API tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    capabilities::{ImageModel, TextModel},
    errors::{Result, StudioError},
    models::{AspectRatio, ImageData},
};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G'];

pub struct MockText {
    reply: Option<String>,
    call_count: AtomicU32,
    recorded_inputs: Mutex<Vec<String>>,
}

impl MockText {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            call_count: AtomicU32::new(0),
            recorded_inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            call_count: AtomicU32::new(0),
            recorded_inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn recorded_inputs(&self) -> Vec<String> {
        self.recorded_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextModel for MockText {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.recorded_inputs.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| StudioError::other("text model unavailable"))
    }

    fn model_name(&self) -> &str {
        "mock-text"
    }
}

#[derive(Clone, Copy)]
pub enum ImageOutcome {
    Image,
    NoCandidates,
    NoContentParts,
    NoImageData,
}

pub struct MockImage {
    outcome: ImageOutcome,
    gate: Option<Gate>,
    call_count: AtomicU32,
    recorded_inputs: Mutex<Vec<(String, AspectRatio)>>,
}

/// Holds a call open until the test releases it.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl MockImage {
    pub fn with(outcome: ImageOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            gate: None,
            call_count: AtomicU32::new(0),
            recorded_inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            outcome: ImageOutcome::Image,
            gate: Some(Gate {
                entered: Notify::new(),
                release: Notify::new(),
            }),
            call_count: AtomicU32::new(0),
            recorded_inputs: Mutex::new(Vec::new()),
        })
    }

    pub fn gate(&self) -> &Gate {
        self.gate.as_ref().unwrap()
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn recorded_inputs(&self) -> Vec<(String, AspectRatio)> {
        self.recorded_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageModel for MockImage {
    async fn generate_image(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<ImageData> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.recorded_inputs
            .lock()
            .unwrap()
            .push((prompt.to_string(), aspect_ratio));

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match self.outcome {
            ImageOutcome::Image => Ok(ImageData::new(PNG_BYTES.to_vec(), "image/png")),
            ImageOutcome::NoCandidates => Err(StudioError::NoCandidates),
            ImageOutcome::NoContentParts => Err(StudioError::NoContentParts),
            ImageOutcome::NoImageData => Err(StudioError::NoImageData),
        }
    }

    fn model_name(&self) -> &str {
        "mock-image"
    }
}
