use crate::error::{GenerationError, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub image_size: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub char_refs_dir: PathBuf,
    pub layout_refs_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_url_prefix: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_size: "2K".to_string(),
            timeout_secs: 300,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"));
        let model = non_empty_env("GEMINI_MODEL").unwrap_or(defaults.model);
        let api_base = non_empty_env("GEMINI_API_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base);
        let image_size = non_empty_env("GEMINI_IMAGE_SIZE").unwrap_or(defaults.image_size);
        let timeout_secs = non_empty_env("GEMINI_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        GeminiConfig {
            api_key,
            model,
            api_base,
            image_size,
            timeout_secs,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_image_size(mut self, image_size: impl Into<String>) -> Self {
        self.image_size = image_size.into();
        self
    }

    /// Returns the API key, or a configuration error when it is unset or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GenerationError::ConfigError("GEMINI_API_KEY is not configured".into()))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            char_refs_dir: PathBuf::from("static/char_refs"),
            layout_refs_dir: PathBuf::from("static/layout_refs"),
            output_dir: PathBuf::from("static/outputs"),
            output_url_prefix: "/static/outputs".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        StorageConfig {
            char_refs_dir: non_empty_env("CHAR_REFS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.char_refs_dir),
            layout_refs_dir: non_empty_env("LAYOUT_REFS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.layout_refs_dir),
            output_dir: non_empty_env("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            output_url_prefix: non_empty_env("OUTPUT_URL_PREFIX")
                .map(|prefix| prefix.trim_end_matches('/').to_string())
                .unwrap_or(defaults.output_url_prefix),
        }
    }

    /// Points all three directories below one root, keeping the default layout.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.char_refs_dir = root.join("char_refs");
        self.layout_refs_dir = root.join("layout_refs");
        self.output_dir = root.join("outputs");
        self
    }

    pub fn with_output_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            debug: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        ServerConfig {
            host: non_empty_env("HOST").unwrap_or(defaults.host),
            port: non_empty_env("PORT")
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            debug: non_empty_env("DEBUG").map_or(defaults.debug, |val| {
                matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            }),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            gemini: GeminiConfig::from_env(),
            storage: StorageConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_is_a_config_error() {
        let config = GeminiConfig::new().with_api_key("   ");
        assert!(matches!(
            config.require_api_key(),
            Err(GenerationError::ConfigError(_))
        ));
        assert!(GeminiConfig::new().require_api_key().is_err());
    }

    #[test]
    fn test_api_key_is_trimmed() {
        let config = GeminiConfig::new().with_api_key(" secret ");
        assert_eq!(config.require_api_key().unwrap(), "secret");
    }

    #[test]
    fn test_storage_root_layout() {
        let storage = StorageConfig::new()
            .with_root("/tmp/panels")
            .with_output_url_prefix("/files/");
        assert_eq!(storage.char_refs_dir, PathBuf::from("/tmp/panels/char_refs"));
        assert_eq!(storage.layout_refs_dir, PathBuf::from("/tmp/panels/layout_refs"));
        assert_eq!(storage.output_dir, PathBuf::from("/tmp/panels/outputs"));
        assert_eq!(storage.output_url_prefix, "/files");
    }

    #[test]
    fn test_defaults() {
        let config = Config::new().with_port(9000);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.gemini.image_size, "2K");
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
    }
}
