use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub detector: DetectorSettings,
    pub server: ServerConfig,
}

/// Audio capture and segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub block_size: usize,
    pub voice_threshold: f32,
    pub silence_patience: u32,
    pub min_utterance_ms: u32,
}

/// Repeat-detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    pub similarity_threshold: f32,
    pub time_window_secs: u64,
    pub stop_words: Vec<String>,
}

/// Verify/transcribe server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            block_size: defaults::BLOCK_SIZE,
            voice_threshold: defaults::VOICE_THRESHOLD,
            silence_patience: defaults::SILENCE_PATIENCE,
            min_utterance_ms: defaults::MIN_UTTERANCE_MS,
        }
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            time_window_secs: defaults::TIME_WINDOW_SECS,
            stop_words: defaults::STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::SERVER_URL.to_string(),
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML or invalid values.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e.context(format!("failed to load config from {}", path.display())))
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - DEJA_SERVER_URL → server.base_url
    /// - DEJA_AUDIO_DEVICE → audio.device
    /// - DEJA_VOICE_THRESHOLD → audio.voice_threshold
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DEJA_SERVER_URL")
            && !url.is_empty()
        {
            self.server.base_url = url;
        }

        if let Ok(device) = std::env::var("DEJA_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(threshold) = std::env::var("DEJA_VOICE_THRESHOLD")
            && let Ok(value) = threshold.parse::<f32>()
        {
            self.audio.voice_threshold = value;
        }

        self
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.audio.voice_threshold) {
            anyhow::bail!(
                "audio.voice_threshold must be within 0.0..=1.0, got {}",
                self.audio.voice_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.detector.similarity_threshold) {
            anyhow::bail!(
                "detector.similarity_threshold must be within 0.0..=1.0, got {}",
                self.detector.similarity_threshold
            );
        }
        if self.audio.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be non-zero");
        }
        if self.audio.block_size == 0 {
            anyhow::bail!("audio.block_size must be non-zero");
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/deja/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deja").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_deja_env() {
        remove_env("DEJA_SERVER_URL");
        remove_env("DEJA_AUDIO_DEVICE");
        remove_env("DEJA_VOICE_THRESHOLD");
    }

    #[test]
    fn default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.audio.device, None);
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.block_size, 1024);
        assert_eq!(config.audio.voice_threshold, 0.02);
        assert_eq!(config.audio.silence_patience, 30);
        assert_eq!(config.audio.min_utterance_ms, 500);

        assert_eq!(config.detector.similarity_threshold, 0.45);
        assert_eq!(config.detector.time_window_secs, 45);
        assert!(config.detector.stop_words.contains(&"the".to_string()));

        assert_eq!(config.server.base_url, "http://127.0.0.1:5001");
        assert_eq!(config.server.request_timeout_secs, 15);
    }

    #[test]
    fn load_from_toml_file() {
        let toml_content = r#"
            [audio]
            device = "hw:0,0"
            sample_rate = 48000
            voice_threshold = 0.05
            silence_patience = 50

            [detector]
            similarity_threshold = 0.2
            time_window_secs = 60

            [server]
            base_url = "http://192.168.1.10:5001"
            request_timeout_secs = 30
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.audio.device, Some("hw:0,0".to_string()));
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.audio.voice_threshold, 0.05);
        assert_eq!(config.audio.silence_patience, 50);

        assert_eq!(config.detector.similarity_threshold, 0.2);
        assert_eq!(config.detector.time_window_secs, 60);

        assert_eq!(config.server.base_url, "http://192.168.1.10:5001");
        assert_eq!(config.server.request_timeout_secs, 30);
    }

    #[test]
    fn load_partial_config_uses_defaults() {
        let toml_content = r#"
            [server]
            base_url = "http://10.0.0.5:5001"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.server.base_url, "http://10.0.0.5:5001");

        // Everything else should be defaults
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.detector.similarity_threshold, 0.45);
        assert_eq!(config.server.request_timeout_secs, 15);
    }

    #[test]
    fn env_override_server_url() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_deja_env();

        set_env("DEJA_SERVER_URL", "http://example.com:5001");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.server.base_url, "http://example.com:5001");
        assert_eq!(config.audio.device, None); // Not overridden

        clear_deja_env();
    }

    #[test]
    fn env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_deja_env();

        set_env("DEJA_SERVER_URL", "http://host:5001");
        set_env("DEJA_AUDIO_DEVICE", "pulse");
        set_env("DEJA_VOICE_THRESHOLD", "0.08");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.server.base_url, "http://host:5001");
        assert_eq!(config.audio.device, Some("pulse".to_string()));
        assert_eq!(config.audio.voice_threshold, 0.08);

        clear_deja_env();
    }

    #[test]
    fn env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_deja_env();

        set_env("DEJA_SERVER_URL", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.server.base_url, "http://127.0.0.1:5001");

        clear_deja_env();
    }

    #[test]
    fn env_override_unparseable_threshold_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_deja_env();

        set_env("DEJA_VOICE_THRESHOLD", "loud");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.voice_threshold, 0.02);

        clear_deja_env();
    }

    #[test]
    fn invalid_toml_returns_error() {
        let invalid_toml = r#"
            [audio
            device = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());

        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let toml_content = r#"
            [audio]
            voice_threshold = 1.5
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn default_path_is_xdg_compliant() {
        let path = Config::default_path().unwrap();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("deja"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_deja_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_or_default_errors_on_invalid_toml() {
        let invalid_toml = r#"
            [audio
            device = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        assert!(Config::load_or_default(temp_file.path()).is_err());
    }
}
