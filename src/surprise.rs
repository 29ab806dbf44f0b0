use rand::seq::SliceRandom;
use serde::Serialize;

use crate::styles::StylePreset;

const IDEAS: &[&str] = &[
    "A transparent glass apple filled with a galaxy",
    "A cozy reading nook inside a hollow giant oak tree",
    "A futuristic train traveling through an underwater tunnel",
    "A samurai standing on a neon rooftop in rain",
    "A calm zen garden with floating rocks",
    "A majestic white owl with golden feathers",
];

#[derive(Debug, Clone, Serialize)]
pub struct SurprisePick {
    pub prompt: &'static str,
    pub style_preset: &'static str,
}

/// Random concept paired with a random active style.
pub fn surprise() -> SurprisePick {
    let mut rng = rand::thread_rng();
    let prompt = IDEAS.choose(&mut rng).copied().unwrap_or(IDEAS[0]);
    let styles: Vec<_> = StylePreset::active().collect();
    let style_preset = styles
        .choose(&mut rng)
        .map(|style| style.id)
        .unwrap_or(crate::styles::DEFAULT_STYLE_ID);

    SurprisePick {
        prompt,
        style_preset,
    }
}
