use serde::Serialize;

/// Style id that disables style injection during enhancement.
pub const NO_STYLE_ID: &str = "none";

pub const DEFAULT_STYLE_ID: &str = "photorealistic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StylePreset {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub prompt_suffix: &'static str,
    pub gradient: &'static str,
}

impl StylePreset {
    pub fn find(id: &str) -> Option<&'static StylePreset> {
        STYLE_PRESETS.iter().find(|style| style.id == id)
    }

    /// Styles that actually bias the prompt, i.e. everything except `none`.
    pub fn active() -> impl Iterator<Item = &'static StylePreset> {
        STYLE_PRESETS.iter().filter(|style| style.is_active())
    }

    pub fn is_active(&self) -> bool {
        self.id != NO_STYLE_ID
    }
}

pub static STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        id: NO_STYLE_ID,
        label: "No Style",
        description: "Faithful to your concept, no extra styling",
        prompt_suffix: "",
        gradient: "from-zinc-700 to-zinc-900",
    },
    StylePreset {
        id: "photorealistic",
        label: "Photorealistic",
        description: "Crisp detail, natural light, shot on a full-frame camera",
        prompt_suffix: "photorealistic, 8k, ultra detailed, natural lighting, shallow depth of field, shot on 35mm lens",
        gradient: "from-sky-500 to-emerald-500",
    },
    StylePreset {
        id: "anime",
        label: "Anime",
        description: "Vibrant cel-shaded scenes in a Japanese animation style",
        prompt_suffix: "anime style, cel shading, vibrant colors, detailed background art, studio quality key visual",
        gradient: "from-pink-500 to-rose-500",
    },
    StylePreset {
        id: "cyberpunk",
        label: "Cyberpunk",
        description: "Neon-drenched futuristic cityscapes",
        prompt_suffix: "cyberpunk, neon lights, rain-soaked streets, holographic signs, high contrast magenta and cyan",
        gradient: "from-fuchsia-600 to-cyan-500",
    },
    StylePreset {
        id: "watercolor",
        label: "Watercolor",
        description: "Soft washes of pigment on textured paper",
        prompt_suffix: "watercolor painting, soft washes, bleeding edges, textured paper, delicate pastel palette",
        gradient: "from-amber-300 to-teal-400",
    },
    StylePreset {
        id: "minimalist",
        label: "Minimalist",
        description: "Clean shapes and generous negative space",
        prompt_suffix: "minimalist, flat design, clean geometric shapes, generous negative space, limited color palette",
        gradient: "from-slate-400 to-slate-600",
    },
    StylePreset {
        id: "fantasy",
        label: "Fantasy",
        description: "Epic, magical worlds with painterly lighting",
        prompt_suffix: "epic fantasy art, magical atmosphere, volumetric god rays, painterly, highly detailed matte painting",
        gradient: "from-purple-600 to-indigo-600",
    },
    StylePreset {
        id: "3d-render",
        label: "3D Render",
        description: "Glossy materials and studio lighting",
        prompt_suffix: "3d render, octane render, glossy materials, soft global illumination, studio lighting, clay-like forms",
        gradient: "from-orange-500 to-red-500",
    },
];
