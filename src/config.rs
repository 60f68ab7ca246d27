use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash-preview-04-17";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Process-wide Gemini configuration, built once at startup and passed
/// explicitly to the gateway and the TUI.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
}

impl GeminiConfig {
    /// Read configuration from the process environment. The API key is
    /// required; everything else has production defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.is_empty())
            .context("GEMINI_API_KEY environment variable not set")?;

        let api_base = lookup("GEMINI_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let text_model =
            lookup("GEMINI_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string());
        let image_model =
            lookup("GEMINI_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());

        Ok(Self {
            api_key,
            api_base,
            text_model,
            image_model,
        })
    }
}
