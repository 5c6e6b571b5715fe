use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::source::Fallback;

pub fn default_session_hours() -> i64 {
    12
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub fallback: Fallback,
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Local development backends usually run with a self-signed certificate.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => {
                let api_url = std::env::var("KIND_HEARTS_API_URL").with_context(|| {
                    "KIND_HEARTS_API_URL not set. Create a config file or set the env var."
                })?;
                Self::with_url(api_url)
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")
    }

    fn with_url(api_url: String) -> Self {
        Self {
            api_url,
            student_id: None,
            teacher_id: None,
            fallback: Fallback::default(),
            session_hours: default_session_hours(),
            log_level: default_log_level(),
            accept_invalid_certs: false,
        }
    }

    /// Environment values win over the file.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("KIND_HEARTS_API_URL") {
            self.api_url = url;
        }
        if let Some(id) = var("KIND_HEARTS_STUDENT_ID") {
            self.student_id = Some(id);
        }
        if let Some(id) = var("KIND_HEARTS_TEACHER_ID") {
            self.teacher_id = Some(id);
        }
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path().with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            student_id: Some("your-student-id".into()),
            teacher_id: Some("your-teacher-id".into()),
            accept_invalid_certs: true,
            ..Self::with_url("https://localhost:44361/api".into())
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("kind-hearts").join("config.toml"))
    }
}
