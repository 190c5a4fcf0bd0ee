//! Configuration for the MWC wallet

use mwc_core::Currency;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder replaced by the hex kernel excess in explorer URL templates
pub const KERNEL_EXCESS_PLACEHOLDER: &str = "$kernelExcess";

/// Wallet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Runtime capabilities
    pub runtime: RuntimeConfig,
    /// Broadcast configuration
    pub broadcast: BroadcastConfig,
    /// Signing device configuration
    pub device: DeviceConfig,
    /// Account history configuration
    pub history: HistoryConfig,
    /// Block explorer configuration
    pub explorer: ExplorerConfig,
    /// Listening recipient wallets
    pub recipient: RecipientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Kind of host the wallet runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeProfile {
    /// Full desktop runtime able to reach recipients over Tor
    Desktop,
    /// Constrained runtime that can only exchange slates as files
    Embedded,
}

impl RuntimeProfile {
    /// Whether slates can be exchanged with a Tor or Slatepack recipient directly
    pub fn supports_interactive_exchange(self) -> bool {
        matches!(self, RuntimeProfile::Desktop)
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub profile: RuntimeProfile,
}

/// Broadcast configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Minimum time the broadcasting state stays visible, in milliseconds
    pub minimum_duration_ms: u64,
}

/// Signing device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device application name per currency id
    pub app_names: BTreeMap<String, String>,
}

/// Account history configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of recent (height, hash) pairs kept per account
    pub recent_heights_capacity: usize,
}

/// Block explorer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// URL template per currency id, containing `$kernelExcess`
    pub transaction_url_templates: BTreeMap<String, String>,
}

/// Listening recipient wallet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientConfig {
    /// Foreign API request timeout, in milliseconds
    pub request_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter level
    pub level: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            broadcast: BroadcastConfig::default(),
            device: DeviceConfig::default(),
            history: HistoryConfig::default(),
            explorer: ExplorerConfig::default(),
            recipient: RecipientConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            profile: RuntimeProfile::Desktop,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            minimum_duration_ms: 3000,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            app_names: Currency::ALL
                .into_iter()
                .map(|currency| (currency.id().to_string(), currency.name().to_string()))
                .collect(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            recent_heights_capacity: 13,
        }
    }
}

impl Default for RecipientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BroadcastConfig {
    pub fn minimum_duration(&self) -> Duration {
        Duration::from_millis(self.minimum_duration_ms)
    }
}

impl RecipientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl DeviceConfig {
    /// Application to open on the device for `currency`
    pub fn app_name(&self, currency: Currency) -> String {
        self.app_names
            .get(currency.id())
            .cloned()
            .unwrap_or_else(|| currency.name().to_string())
    }
}

impl ExplorerConfig {
    pub fn template(&self, currency: Currency) -> Option<&str> {
        self.transaction_url_templates
            .get(currency.id())
            .map(String::as_str)
    }
}

impl WalletConfig {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: WalletConfig = toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    /// Get default configuration directory
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_default().join("mwc")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("wallet.toml")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.history.recent_heights_capacity == 0 {
            return Err("Recent heights capacity cannot be zero".to_string());
        }

        for (id, name) in &self.device.app_names {
            if id.parse::<Currency>().is_err() {
                return Err(format!("Unknown currency in device app names: {}", id));
            }
            if name.trim().is_empty() {
                return Err(format!("Device app name for {} cannot be empty", id));
            }
        }

        for (id, template) in &self.explorer.transaction_url_templates {
            if id.parse::<Currency>().is_err() {
                return Err(format!("Unknown currency in explorer templates: {}", id));
            }
            if !template.contains(KERNEL_EXCESS_PLACEHOLDER) {
                return Err(format!(
                    "Explorer template for {} must contain {}",
                    id, KERNEL_EXCESS_PLACEHOLDER
                ));
            }
        }

        if self.recipient.request_timeout_ms == 0 {
            return Err("Recipient request timeout cannot be zero".to_string());
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(format!("Invalid log level: {}", self.logging.level));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert!(config.runtime.profile.supports_interactive_exchange());
        assert_eq!(config.broadcast.minimum_duration(), Duration::from_secs(3));
        assert_eq!(config.history.recent_heights_capacity, 13);
        assert_eq!(config.device.app_name(Currency::GrinTestnet), "Grin Testnet");
        assert!(config.explorer.template(Currency::MimbleWimbleCoin).is_none());
        assert_eq!(config.recipient.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_validation() {
        let config = WalletConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = WalletConfig::default();
        invalid_config.history.recent_heights_capacity = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = WalletConfig::default();
        invalid_config
            .explorer
            .transaction_url_templates
            .insert("grin".to_string(), "https://explorer.example/kernel/".to_string());
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = WalletConfig::default();
        invalid_config.recipient.request_timeout_ms = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = WalletConfig::default();
        invalid_config.logging.level = "loud".to_string();
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("wallet.toml");

        let mut original_config = WalletConfig::default();
        original_config.runtime.profile = RuntimeProfile::Embedded;
        original_config.explorer.transaction_url_templates.insert(
            "epic_cash".to_string(),
            "https://explorer.example/kernel/$kernelExcess".to_string(),
        );
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = WalletConfig::load_from_file(&config_path).unwrap();
        assert_eq!(original_config, loaded_config);
        assert!(!loaded_config.runtime.profile.supports_interactive_exchange());
    }
}
