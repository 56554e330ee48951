use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Chartsmith";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of recommended charts synthesized when the caller does not say.
pub const DEFAULT_MAX_CHARTS: usize = 3;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Extraction reads numbers out of free text: low temperature, generous budget.
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;
pub const EXTRACTION_MAX_TOKENS: u32 = 3000;

/// Spec synthesis must copy numbers verbatim, so it runs colder than extraction.
pub const SYNTHESIS_TEMPERATURE: f32 = 0.2;
pub const SYNTHESIS_MAX_TOKENS: u32 = 2000;

pub const ANALYSIS_TEMPERATURE: f32 = 0.7;
pub const ANALYSIS_MAX_TOKENS: u32 = 3000;

/// Output raster size in pixels (10×6 aspect at print resolution).
pub const CHART_WIDTH_PX: u32 = 2000;
pub const CHART_HEIGHT_PX: u32 = 1200;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "chartsmith=info,chartsmith_lib=info,warn"
}

/// Which completion backend the pipeline talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_URL,
            Self::Ollama => DEFAULT_OLLAMA_URL,
        }
    }
}

/// Immutable client settings. The only state shared between pipeline runs.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: DEFAULT_OPENAI_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmSettings {
    /// Build settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("CHARTSMITH_PROVIDER") {
            Some(raw) => LlmProvider::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown CHARTSMITH_PROVIDER, using openai");
                LlmProvider::OpenAi
            }),
            None => LlmProvider::OpenAi,
        };

        let base_url = lookup("CHARTSMITH_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let timeout_secs = match lookup("CHARTSMITH_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid CHARTSMITH_TIMEOUT_SECS, using default");
                DEFAULT_TIMEOUT_SECS
            }),
            None => DEFAULT_TIMEOUT_SECS,
        };

        Self {
            provider,
            base_url,
            api_key: lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()),
            model: lookup("CHARTSMITH_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_name_is_chartsmith() {
        assert_eq!(APP_NAME, "Chartsmith");
    }

    #[test]
    fn synthesis_runs_colder_than_extraction() {
        assert!(SYNTHESIS_TEMPERATURE < EXTRACTION_TEMPERATURE);
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = LlmSettings::from_lookup(lookup_from(&[]));
        assert_eq!(settings.provider, LlmProvider::OpenAi);
        assert_eq!(settings.base_url, DEFAULT_OPENAI_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert!(settings.api_key.is_none());
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn ollama_provider_switches_default_url() {
        let settings = LlmSettings::from_lookup(lookup_from(&[
            ("CHARTSMITH_PROVIDER", "Ollama"),
            ("CHARTSMITH_MODEL", "llama3:8b"),
        ]));
        assert_eq!(settings.provider, LlmProvider::Ollama);
        assert_eq!(settings.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(settings.model, "llama3:8b");
    }

    #[test]
    fn invalid_values_fall_back() {
        let settings = LlmSettings::from_lookup(lookup_from(&[
            ("CHARTSMITH_PROVIDER", "azure"),
            ("CHARTSMITH_TIMEOUT_SECS", "soon"),
            ("OPENAI_API_KEY", "   "),
        ]));
        assert_eq!(settings.provider, LlmProvider::OpenAi);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn explicit_values_win() {
        let settings = LlmSettings::from_lookup(lookup_from(&[
            ("CHARTSMITH_BASE_URL", "http://proxy:8080/v1"),
            ("CHARTSMITH_TIMEOUT_SECS", "30"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));
        assert_eq!(settings.base_url, "http://proxy:8080/v1");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
    }
}
