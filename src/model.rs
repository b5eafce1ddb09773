use serde::{Deserialize, Serialize};

/// User-facing model choice. `DeepThink` is not a distinct backend model:
/// it resolves to the Pro model plus an extended thinking budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiModel {
    Flash,
    Pro,
    DeepThink,
}

/// Generation parameters layered on top of the backend model id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationConfig {
    pub thinking_budget: Option<u32>,
}

const FLASH_MODEL_ID: &str = "gemini-3-flash-preview";
const PRO_MODEL_ID: &str = "gemini-3-pro-preview";

/// Thinking budget applied when the deep-reasoning variant is selected.
const DEEP_THINK_BUDGET: u32 = 16000;

impl AiModel {
    pub fn all() -> Vec<AiModel> {
        vec![AiModel::Flash, AiModel::Pro, AiModel::DeepThink]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::Flash => "flash",
            AiModel::Pro => "pro",
            AiModel::DeepThink => "deep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flash" | "fast" => Some(AiModel::Flash),
            "pro" | "capable" => Some(AiModel::Pro),
            "deep" | "think" | "deepthink" => Some(AiModel::DeepThink),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AiModel::Flash => "Gemini 3 Flash",
            AiModel::Pro => "Gemini 3 Pro",
            AiModel::DeepThink => "Gemini 3 Deep Think",
        }
    }

    /// Map this logical selection to `(backend_model_id, generation_config)`.
    ///
    /// The only place this mapping lives. Pure and total: every variant has
    /// a resolution, so there is no failure mode.
    pub fn resolve(&self) -> (&'static str, GenerationConfig) {
        match self {
            AiModel::Flash => (FLASH_MODEL_ID, GenerationConfig::default()),
            AiModel::Pro => (PRO_MODEL_ID, GenerationConfig::default()),
            AiModel::DeepThink => (
                PRO_MODEL_ID,
                GenerationConfig {
                    thinking_budget: Some(DEEP_THINK_BUDGET),
                },
            ),
        }
    }
}
