use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_PORT: u16 = 8770;
const DEFAULT_LANGUAGE: &str = "ja";
const DEFAULT_SERVER_HOST: &str = "https://forvo.com";
const DEFAULT_AUDIO_HOST: &str = "https://audio12.forvo.com";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Site language code, selects `#language-container-<language>` on word pages
    #[serde(default = "default_language")]
    pub language: String,

    /// Speakers to list first, highest priority first
    #[serde(default)]
    pub preferred_usernames: Vec<String>,

    /// Countries to list after preferred speakers, stored lower-cased
    #[serde(default)]
    pub preferred_countries: Vec<String>,

    #[serde(default = "default_true")]
    pub show_gender: bool,

    #[serde(default)]
    pub show_country: bool,

    #[serde(default = "default_server_host")]
    pub server_host: String,

    #[serde(default = "default_audio_host")]
    pub audio_host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            language: DEFAULT_LANGUAGE.to_string(),
            preferred_usernames: vec![],
            preferred_countries: vec![],
            show_gender: true,
            show_country: false,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            audio_host: DEFAULT_AUDIO_HOST.to_string(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

fn default_audio_host() -> String {
    DEFAULT_AUDIO_HOST.to_string()
}

/// Values a single request (or the command line) may replace.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub language: Option<String>,
    pub port: Option<u16>,
}

impl Config {
    fn validate(&mut self) -> Result<()> {
        if self.port == 0 {
            bail!("port cannot be 0");
        }

        self.language = self.language.trim().to_string();
        if self.language.is_empty() {
            bail!("language cannot be empty");
        }

        self.preferred_usernames = self
            .preferred_usernames
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        self.preferred_countries = self
            .preferred_countries
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        for (name, host) in [
            ("server_host", &mut self.server_host),
            ("audio_host", &mut self.audio_host),
        ] {
            let parsed = url::Url::parse(host)
                .with_context(|| format!("{name} is not a valid url: {host:?}"))?;
            if !["http", "https"].contains(&parsed.scheme()) {
                bail!("{name} must be an http(s) url, got {host:?}");
            }
            *host = host.trim_end_matches('/').to_string();
        }

        Ok(())
    }

    /// Returns a snapshot with `overrides` applied. `self` is left untouched so
    /// concurrent requests never observe each other's overrides.
    pub fn with_overrides(&self, overrides: &Overrides) -> Config {
        let mut config = self.clone();

        if let Some(language) = overrides
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
        {
            config.language = language.to_string();
        }

        if let Some(port) = overrides.port.filter(|p| *p != 0) {
            config.port = port;
        }

        config
    }

    pub fn load_with(base_path: &str) -> Result<Self> {
        let base = PathBuf::from(base_path);
        std::fs::create_dir_all(&base)
            .with_context(|| format!("failed to create config directory {base_path}"))?;

        let path = base.join(CONFIG_FILE);

        // create new if does not exist
        if !path.exists() {
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.validate()?;

        // resave in case config needs normalizing
        let normalized = serde_yml::to_string(&config)?;
        if config_str != normalized {
            std::fs::write(&path, normalized)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        Ok(config)
    }

    pub fn base_path() -> Result<String> {
        if let Ok(path) = std::env::var("FORVO_AUDIO_BASE_PATH") {
            return Ok(path);
        }

        let home = homedir::my_home()
            .context("could not determine home directory")?
            .context("home directory path is empty")?;
        Ok(format!("{}/.local/share/forvo_audio", home.to_string_lossy()))
    }
}
