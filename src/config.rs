use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    fs::{read_to_string, write},
    path::PathBuf,
};
use url::Url;

use crate::error::TocError;

/// Portal-level settings the embedding application injects into its services.
/// There is deliberately no global provider: construct one and pass it to the
/// components that need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the content/navigation service.
    pub content_service_url: String,
    /// Publication opened when none is present in the route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_publication: Option<String>,
    /// UI language tag, e.g. `"en"`.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl PortalConfig {
    pub fn content_service_url(&self) -> Result<Url, TocError> {
        Ok(Url::parse(&self.content_service_url)?)
    }
}

pub trait PortalConfigProvider: Send + Sync {
    fn get_portal(&self) -> Result<PortalConfig, TocError>;
    fn set_portal(&self, config: PortalConfig) -> Result<(), TocError>;
}

/// File-backed provider storing the config under a `[portal]` table.
#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }
}

impl PortalConfigProvider for TomlConfigProvider {
    fn get_portal(&self) -> Result<PortalConfig, TocError> {
        tracing::debug!("Attempting to read portal config from: {:?}", &self.path);
        let content = read_to_string(&self.path)?;
        let config: BTreeMap<String, PortalConfig> = toml::from_str(&content)?;
        config
            .get("portal")
            .cloned()
            .ok_or_else(|| TocError::NotFound("portal table not found in config".to_string()))
    }

    fn set_portal(&self, portal: PortalConfig) -> Result<(), TocError> {
        tracing::debug!("Attempting to write portal config to: {:?}", &self.path);
        let mut config = BTreeMap::new();
        config.insert("portal".to_string(), portal);
        let toml_string = toml::to_string(&config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}
