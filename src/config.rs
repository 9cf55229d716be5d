use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs, path::Path};

/// Env var that overrides the config file location.
pub const CONFIG_ENV: &str = "QC_SCANNER_CONFIG";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub llm: LlmSection,
    pub sheets: SheetsSection,
    #[serde(default)]
    pub image: ImageSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_upload_mb: default_max_upload_mb(),
            session_idle_minutes: default_session_idle_minutes(),
        }
    }
}

impl ServerSection {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn default_listen() -> String {
    "0.0.0.0:8501".to_string()
}

fn default_max_upload_mb() -> usize {
    15
}

fn default_session_idle_minutes() -> u64 {
    240
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Hosted OpenAI-compatible endpoint (Gemini by default).
    #[default]
    Remote,
    /// Local Ollama server with a vision model.
    Ollama,
}

#[derive(Debug, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub backend: LlmBackend,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub remote: RemoteEndpoint,
    #[serde(default)]
    pub ollama: OllamaEndpoint,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
            remote: RemoteEndpoint::default(),
            ollama: OllamaEndpoint::default(),
        }
    }
}

fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize)]
pub struct RemoteEndpoint {
    #[serde(default = "default_remote_url")]
    pub base_url: String,
    #[serde(default = "default_remote_model")]
    pub model: String,
    /// Name of the env var holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for RemoteEndpoint {
    fn default() -> Self {
        Self {
            base_url: default_remote_url(),
            model: default_remote_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_remote_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
}

fn default_remote_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

#[derive(Debug, Deserialize)]
pub struct OllamaEndpoint {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaEndpoint {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5vl".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SheetsSection {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Path to the Google service-account JSON key.
    pub service_account_key: PathBuf,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSection {
    /// Photos are shrunk to fit a square of this size before extraction.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_max_dimension() -> u32 {
    2000
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// `$QC_SCANNER_CONFIG`, else `.config/qc_scanner.toml`.
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".config").join("qc_scanner.toml"))
    }
}
