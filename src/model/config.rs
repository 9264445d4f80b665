use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    /// Overrides the OS hostname lookup.
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            dry_run: default_dry_run(),
            hostname: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_data_dir() -> String {
    "data".into()
}

fn default_dry_run() -> bool {
    true
}

fn default_level() -> String {
    "info".into()
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// `explicit` must exist when given; otherwise the per-user config file is
    /// used if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_toml(DEFAULTS).context("parsing built-in defaults")?;

        let user_path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => user_config_path().filter(|path| path.exists()),
        };

        if let Some(path) = user_path {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            config = Self::from_toml(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?;
            tracing::info!("using config {}", path.display());
        }

        if config.general.data_dir == "~" || config.general.data_dir.starts_with("~/") {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.general.data_dir = expand_home(&config.general.data_dir, &home);
        }

        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Data directory for a logic rooted at `root`.
    pub fn data_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.general.data_dir)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "logicbase")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Expands a leading `~` or `~/` only; `~user/...` is left untouched.
fn expand_home(path: &str, home: &Path) -> String {
    match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{rest}", home.to_string_lossy())
        }
        _ => path.to_string(),
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
