//! cirrus.toml configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::bail;

/// Account id used when none is configured.
pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CirrusConfig {
    /// Twelve-digit account id embedded in every synthesized ARN.
    #[serde(default = "default_account_id")]
    pub account_id: String,
    /// Optional region allow-list. Any region is accepted when absent.
    #[serde(default)]
    pub regions: Option<Vec<String>>,
}

fn default_account_id() -> String {
    DEFAULT_ACCOUNT_ID.to_string()
}

impl Default for CirrusConfig {
    fn default() -> Self {
        Self {
            account_id: default_account_id(),
            regions: None,
        }
    }
}

impl CirrusConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: CirrusConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.account_id.len() != 12 || !self.account_id.bytes().all(|b| b.is_ascii_digit()) {
            bail!("account_id must be 12 digits, got '{}'", self.account_id);
        }
        if let Some(regions) = &self.regions {
            if regions.iter().any(|r| r.is_empty()) {
                bail!("regions must not contain empty names");
            }
        }
        Ok(())
    }

    pub fn allows_region(&self, region: &str) -> bool {
        match &self.regions {
            Some(regions) => regions.iter().any(|r| r == region),
            None => !region.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = CirrusConfig::from_toml_str("").unwrap();
        assert_eq!(config, CirrusConfig::default());
        assert!(config.allows_region("ap-south-1"));
    }

    #[test]
    fn region_allow_list() {
        let config = CirrusConfig::from_toml_str(
            r#"
account_id = "000000000042"
regions = ["us-east-1", "eu-west-1"]
"#,
        )
        .unwrap();
        assert_eq!(config.account_id, "000000000042");
        assert!(config.allows_region("eu-west-1"));
        assert!(!config.allows_region("us-west-2"));
    }

    #[test]
    fn rejects_malformed_account() {
        assert!(CirrusConfig::from_toml_str(r#"account_id = "12ab""#).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cirrus.toml");
        let config = CirrusConfig {
            account_id: "999999999999".to_string(),
            regions: Some(vec!["us-east-1".to_string()]),
        };
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(CirrusConfig::from_file(&path).unwrap(), config);
    }
}
