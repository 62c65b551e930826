// src/config.rs
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "pharmacist-chat.toml";
pub const CONFIG_PATH_ENV: &str = "PHARMACIST_CHAT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

/// Parameters for the hosted Gemini model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// What the assistant is told to be, and the strings the page shows.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_subtitle")]
    pub subtitle: String,
    #[serde(default = "default_input_placeholder")]
    pub input_placeholder: String,
    #[serde(default = "default_pending_text")]
    pub pending_text: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_acknowledgement")]
    pub acknowledgement: String,
    /// Show the two seed entries in the rendered transcript.
    #[serde(default)]
    pub show_seed: bool,
    #[serde(default = "default_call_error_prefix")]
    pub call_error_prefix: String,
    #[serde(default = "default_empty_reply_message")]
    pub empty_reply_message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    #[serde(default = "default_secret_files")]
    pub files: Vec<PathBuf>,
    #[serde(default = "default_secret_keys")]
    pub keys: Vec<String>,
}

// Defaults
fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}
fn default_session_ttl_secs() -> u64 {
    3600
}
fn default_model_name() -> String {
    "gemini-1.5-flash".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_title() -> String {
    "💊 Asisten Apoteker Gemini".into()
}
fn default_subtitle() -> String {
    "Aplikasi chatbot ini menggunakan Google Gemini untuk memberikan informasi seputar obat-obatan. \
     Penting: Informasi ini bukan pengganti nasihat medis profesional."
        .into()
}
fn default_input_placeholder() -> String {
    "Tanyakan tentang obat...".into()
}
fn default_pending_text() -> String {
    "Sedang mencari informasi...".into()
}
fn default_system_prompt() -> String {
    "Kamu adalah seorang apoteker. Tuliskan obat apa yang diinginkan untuk menyembuhkan penyakit. \
     Jawaban singkat dan faktual. Tolak pertanyaan non-apoteker."
        .into()
}
fn default_acknowledgement() -> String {
    "Baik! Sebutkan nama penyakit atau gejala yang Anda alami, dan saya akan memberikan \
     informasi singkat tentang obat yang relevan."
        .into()
}
fn default_call_error_prefix() -> String {
    "Terjadi kesalahan saat berkomunikasi dengan Gemini".into()
}
fn default_empty_reply_message() -> String {
    "Maaf, terjadi kesalahan saat menerima respons.".into()
}
fn default_secret_files() -> Vec<PathBuf> {
    vec![".streamlit/secrets.toml".into(), "secrets.toml".into()]
}
fn default_secret_keys() -> Vec<String> {
    vec!["gemini_api_key".into(), "GEMINI_API_KEY".into()]
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            input_placeholder: default_input_placeholder(),
            pending_text: default_pending_text(),
            system_prompt: default_system_prompt(),
            acknowledgement: default_acknowledgement(),
            show_seed: false,
            call_error_prefix: default_call_error_prefix(),
            empty_reply_message: default_empty_reply_message(),
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            files: default_secret_files(),
            keys: default_secret_keys(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            session_ttl_secs: default_session_ttl_secs(),
            model: ModelConfig::default(),
            persona: PersonaConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from an explicit path, or from the default file when present,
    /// falling back to built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.name.trim().is_empty() {
            return Err(ConfigError::Invalid("model.name must not be empty".into()));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid("model.timeout_secs must be positive".into()));
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "model.temperature {t} outside 0.0..=2.0"
                )));
            }
        }
        if self.secrets.keys.is_empty() {
            return Err(ConfigError::Invalid("secrets.keys must name at least one key".into()));
        }
        Ok(())
    }
}
