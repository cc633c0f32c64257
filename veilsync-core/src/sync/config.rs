//! Engine settings: cluster endpoints, cloud credentials, key seed.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, VectorSyncError};

/// Default local cluster endpoint.
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:6333";

/// Settings for the mirroring engine.
///
/// Loaded from a TOML file or from `VEILSYNC_*` environment variables. Cloud
/// mirroring requires all three of `cloud_url`, `cloud_api_key`, and
/// `cloud_enabled`; anything less makes every cloud-targeting operation fail
/// fast with a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Local cluster base URL.
    pub local_url: String,
    /// Cloud cluster base URL.
    pub cloud_url: Option<String>,
    /// API key sent in the `api-key` header on every cloud request.
    pub cloud_api_key: Option<String>,
    /// Master switch for cloud-targeting operations.
    pub cloud_enabled: bool,
    /// Base64-encoded 32-byte P-256 private scalar.
    pub sync_key: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            local_url: DEFAULT_LOCAL_URL.to_string(),
            cloud_url: None,
            cloud_api_key: None,
            cloud_enabled: false,
            sync_key: None,
        }
    }
}

impl SyncSettings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| VectorSyncError::InvalidInput(format!("Invalid settings file: {}", e)))
    }

    /// Build settings from `VEILSYNC_*` environment variables on top of the
    /// defaults. Unset and empty variables leave the default in place.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(url) = env_var("VEILSYNC_LOCAL_URL") {
            settings.local_url = url;
        }
        settings.cloud_url = env_var("VEILSYNC_CLOUD_URL");
        settings.cloud_api_key = env_var("VEILSYNC_CLOUD_API_KEY");
        settings.cloud_enabled = env_var("VEILSYNC_CLOUD_ENABLED")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        settings.sync_key = env_var("VEILSYNC_SYNC_KEY");
        settings
    }

    /// Cloud endpoint and API key, or the configuration error that blocks
    /// every cloud-targeting operation.
    pub fn require_cloud(&self) -> Result<(&str, &str)> {
        if !self.cloud_enabled {
            return Err(VectorSyncError::NotConfigured(
                "cloud mirroring is disabled".to_string(),
            ));
        }
        let url = self
            .cloud_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                VectorSyncError::NotConfigured("cloud endpoint URL is not set".to_string())
            })?;
        let key = self
            .cloud_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                VectorSyncError::NotConfigured("cloud API key is not set".to_string())
            })?;
        Ok((url, key))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = SyncSettings::default();
        assert_eq!(settings.local_url, DEFAULT_LOCAL_URL);
        assert!(settings.cloud_url.is_none());
        assert!(!settings.cloud_enabled);
        assert!(settings.sync_key.is_none());
    }

    #[test]
    fn require_cloud_rejects_disabled() {
        let settings = SyncSettings {
            cloud_url: Some("https://cloud.example.com:6333".into()),
            cloud_api_key: Some("secret".into()),
            cloud_enabled: false,
            ..SyncSettings::default()
        };
        assert!(matches!(
            settings.require_cloud(),
            Err(VectorSyncError::NotConfigured(_))
        ));
    }

    #[test]
    fn require_cloud_rejects_missing_url_or_key() {
        let no_url = SyncSettings {
            cloud_enabled: true,
            cloud_api_key: Some("secret".into()),
            ..SyncSettings::default()
        };
        assert!(no_url.require_cloud().is_err());

        let no_key = SyncSettings {
            cloud_enabled: true,
            cloud_url: Some("https://cloud.example.com:6333".into()),
            ..SyncSettings::default()
        };
        assert!(no_key.require_cloud().is_err());
    }

    #[test]
    fn require_cloud_accepts_complete_config() {
        let settings = SyncSettings {
            cloud_enabled: true,
            cloud_url: Some("https://cloud.example.com:6333".into()),
            cloud_api_key: Some("secret".into()),
            ..SyncSettings::default()
        };
        let (url, key) = settings.require_cloud().unwrap();
        assert_eq!(url, "https://cloud.example.com:6333");
        assert_eq!(key, "secret");
    }

    #[test]
    fn toml_roundtrip_with_partial_file() {
        let parsed: SyncSettings = toml::from_str(
            r#"
            cloud_url = "https://cloud.example.com:6333"
            cloud_api_key = "secret"
            cloud_enabled = true
            "#,
        )
        .unwrap();

        // Unlisted fields fall back to defaults.
        assert_eq!(parsed.local_url, DEFAULT_LOCAL_URL);
        assert!(parsed.cloud_enabled);
        assert!(parsed.require_cloud().is_ok());
    }
}
