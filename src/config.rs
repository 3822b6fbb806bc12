// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::IngestError;

pub const API_KEY_ENV: &str = "BARRIER_API_KEY";
pub const FORM_ID_ENV: &str = "BARRIER_FORM_ID";

/// Forms API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub form_id: Option<String>,
    pub api_key: Option<String>,
    /// Submissions requested per call.
    pub limit: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hipaa-api.jotform.com".into(),
            form_id: None,
            api_key: None,
            limit: 1000,
            timeout_secs: 30,
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns `(form_id, api_key)`, failing before any network call if either is unset.
    pub fn credentials(&self) -> Result<(&str, &str), IngestError> {
        let form_id = self
            .form_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| IngestError::Config(format!("form id not set (use {})", FORM_ID_ENV)))?;
        let api_key = self
            .api_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| IngestError::Config(format!("API key not set (use {})", API_KEY_ENV)))?;
        Ok((form_id, api_key))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    /// Where the normalized table is persisted between runs.
    pub table_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            table_path: PathBuf::from("barrierReferralData.csv"),
        }
    }
}

impl Config {
    /// Read the YAML file at `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text = fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                Self::from_yaml(&text).with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Self::default(),
        };
        cfg.apply_env_overrides(|k| env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(FORM_ID_ENV) {
            self.api.form_id = Some(v);
        }
        if let Some(v) = lookup(API_KEY_ENV) {
            self.api.api_key = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = Config::from_yaml(
            r#"
api:
  form_id: "231234"
  timeout_secs: 5
table_path: data/barriers.csv
"#,
        )
        .unwrap();
        assert_eq!(cfg.api.form_id.as_deref(), Some("231234"));
        assert_eq!(cfg.api.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.api.limit, 1000);
        assert_eq!(cfg.api.base_url, "https://hipaa-api.jotform.com");
        assert_eq!(cfg.table_path, PathBuf::from("data/barriers.csv"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::from_yaml("api:\n  api_key: from-file\n").unwrap();
        let vars: HashMap<&str, &str> = [(API_KEY_ENV, "from-env"), (FORM_ID_ENV, "42")].into();
        cfg.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api.credentials().unwrap(), ("42", "from-env"));
    }

    #[test]
    fn example_config_parses() {
        let cfg = Config::from_yaml(include_str!("../barrierlog.example.yaml")).unwrap();
        assert_eq!(cfg.api.api_key, None);
        assert_eq!(cfg.api.max_retries, 3);
        assert_eq!(cfg.table_path, PathBuf::from("barrierReferralData.csv"));
    }

    #[test]
    fn missing_credentials_is_config_error() {
        let cfg = Config::default();
        assert!(matches!(cfg.api.credentials(), Err(IngestError::Config(_))));
    }
}
