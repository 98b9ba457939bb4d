use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_BACKEND_BASE_URL, DEFAULT_DATA_BASE_URL, DEFAULT_DATA_DIR};
use crate::models::RevisionPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub api_key: String,
    pub client_id: String,
    pub user_agent: String,
    pub backend_base_url: String,
    pub data_base_url: String,
    pub revision_policy: RevisionPolicy,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            api_key: String::new(),
            client_id: String::new(),
            user_agent: String::new(),
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            data_base_url: DEFAULT_DATA_BASE_URL.to_string(),
            revision_policy: RevisionPolicy::default(),
        }
    }

    /// Start-up flags handed over by the host; missing or non-string values become `""`.
    pub fn from_flags(flags: &Value) -> Self {
        let flag = |key: &str| {
            flags
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            api_key: flag("apiKey"),
            client_id: flag("clientId"),
            user_agent: flag("userAgent"),
            ..Self::default()
        }
    }

    /// Overlay the non-empty start-up flags onto this config.
    pub fn with_flags(mut self, flags: &Value) -> Self {
        let flags = Self::from_flags(flags);
        if !flags.api_key.is_empty() {
            self.api_key = flags.api_key;
        }
        if !flags.client_id.is_empty() {
            self.client_id = flags.client_id;
        }
        if !flags.user_agent.is_empty() {
            self.user_agent = flags.user_agent;
        }
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Let `SHOPLIST_API_KEY`, `SHOPLIST_CLIENT_ID` and `SHOPLIST_DATA_DIR` override the file.
    pub fn apply_env(mut self) -> Self {
        if let Ok(api_key) = std::env::var("SHOPLIST_API_KEY") {
            self.api_key = api_key;
        }
        if let Ok(client_id) = std::env::var("SHOPLIST_CLIENT_ID") {
            self.client_id = client_id;
        }
        if let Ok(data_dir) = std::env::var("SHOPLIST_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        self
    }

    /// Echo suppression needs a stable, non-empty client id.
    pub fn ensure_client_id(mut self) -> Self {
        if self.client_id.is_empty() {
            self.client_id = uuid::Uuid::new_v4().to_string();
            tracing::info!("No client id configured, using {}", self.client_id);
        }
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|dir| dir.join("shoplist"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self::new(data_dir)
    }
}
