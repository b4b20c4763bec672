//! Site configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use dailyread_accounts::PasswordHashing;
use dailyread_types::PollingAlgorithm;
use dailyread_utils::LogFormat;
use dailyread_verification::{CaptchaStyle, ChallengeConfig, LedgerConfig};

use crate::NodeError;

/// Configuration for a dailyread site node.
///
/// Can be loaded from a TOML file via [`SiteConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// an empty file is a valid configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: u64,

    #[serde(default = "default_challenge_length")]
    pub challenge_length: usize,

    #[serde(default = "default_password_reset_ttl_secs")]
    pub password_reset_ttl_secs: u64,

    /// Lifetime of registration and email-change codes.
    #[serde(default = "default_email_verification_ttl_secs")]
    pub email_verification_ttl_secs: u64,

    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Used when neither a source override nor the stored setting says otherwise.
    #[serde(default)]
    pub source_polling_algorithm: PollingAlgorithm,

    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    #[serde(default)]
    pub password_hashing: PasswordHashing,

    /// Operator-supplied credential key. Never written back out.
    #[serde(default, skip_serializing)]
    pub secret_key: Option<String>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./dailyread_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_rpc_port() -> u16 {
    8080
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_challenge_ttl_secs() -> u64 {
    5 * 60
}

fn default_challenge_length() -> usize {
    4
}

fn default_password_reset_ttl_secs() -> u64 {
    10 * 60
}

fn default_email_verification_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_code_length() -> usize {
    6
}

fn default_source_timeout_secs() -> u64 {
    5
}

fn default_sweep_interval_secs() -> u64 {
    60 * 60
}

fn default_session_idle_secs() -> u64 {
    60 * 60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SiteConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string. The secret key is omitted.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format
            .parse::<LogFormat>()
            .map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            code_length: self.code_length,
            register_email_ttl_secs: self.email_verification_ttl_secs,
            change_email_ttl_secs: self.email_verification_ttl_secs,
            password_reset_ttl_secs: self.password_reset_ttl_secs,
        }
    }

    pub fn challenge_config(&self) -> ChallengeConfig {
        ChallengeConfig {
            ttl_secs: self.challenge_ttl_secs,
            code_length: self.challenge_length,
            style: CaptchaStyle::default(),
        }
    }

    /// Reject values the components cannot work with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.code_length == 0 || self.challenge_length == 0 {
            return Err(NodeError::Config("code lengths must be at least 1".into()));
        }
        let fits = CaptchaStyle::default().max_chars();
        if self.challenge_length > fits {
            return Err(NodeError::Config(format!(
                "challenge_length {} does not fit the captcha image (at most {fits})",
                self.challenge_length
            )));
        }
        if self.map_size_mb == 0 {
            return Err(NodeError::Config("map_size_mb must be at least 1".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(NodeError::Config("sweep_interval_secs must be at least 1".into()));
        }
        self.log_format()?;
        Ok(())
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            challenge_ttl_secs: default_challenge_ttl_secs(),
            challenge_length: default_challenge_length(),
            password_reset_ttl_secs: default_password_reset_ttl_secs(),
            email_verification_ttl_secs: default_email_verification_ttl_secs(),
            code_length: default_code_length(),
            source_polling_algorithm: PollingAlgorithm::default(),
            source_timeout_secs: default_source_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            session_idle_secs: default_session_idle_secs(),
            password_hashing: PasswordHashing::default(),
            secret_key: None,
        }
    }
}

impl std::fmt::Debug for SiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteConfig")
            .field("data_dir", &self.data_dir)
            .field("rpc_port", &self.rpc_port)
            .field("source_polling_algorithm", &self.source_polling_algorithm)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = SiteConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 8080);
        assert_eq!(config.data_dir, PathBuf::from("./dailyread_data"));
        assert_eq!(config.challenge_ttl_secs, 300);
        assert_eq!(config.password_reset_ttl_secs, 600);
        assert_eq!(config.email_verification_ttl_secs, 86_400);
        assert_eq!(config.source_polling_algorithm, PollingAlgorithm::Sequential);
        assert!(config.secret_key.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            source_polling_algorithm = "random"
            secret_key = "operator key"
        "#;
        let config = SiteConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_port, 9999);
        assert_eq!(config.source_polling_algorithm, PollingAlgorithm::Random);
        assert_eq!(config.secret_key.as_deref(), Some("operator key"));
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn secret_key_is_never_serialized() {
        let config = SiteConfig {
            secret_key: Some("do not write me".into()),
            ..SiteConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert!(!text.contains("do not write me"));
        assert!(!format!("{config:?}").contains("do not write me"));
        let parsed = SiteConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.rpc_port, config.rpc_port);
    }

    #[test]
    fn derived_component_configs() {
        let config = SiteConfig {
            email_verification_ttl_secs: 3_600,
            challenge_length: 5,
            ..SiteConfig::default()
        };
        let ledger = config.ledger_config();
        assert_eq!(ledger.register_email_ttl_secs, 3_600);
        assert_eq!(ledger.change_email_ttl_secs, 3_600);
        assert_eq!(ledger.password_reset_ttl_secs, 600);
        assert_eq!(config.challenge_config().code_length, 5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_format = SiteConfig {
            log_format: "xml".into(),
            ..SiteConfig::default()
        };
        assert!(matches!(bad_format.validate(), Err(NodeError::Config(_))));
        let zero = SiteConfig {
            code_length: 0,
            ..SiteConfig::default()
        };
        assert!(zero.validate().is_err());
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn challenge_longer_than_the_image_is_rejected() {
        let fits = SiteConfig {
            challenge_length: 20,
            ..SiteConfig::default()
        };
        assert!(fits.validate().is_ok());
        let too_long = SiteConfig::from_toml_str("challenge_length = 21").unwrap_err();
        assert!(matches!(too_long, NodeError::Config(ref m) if m.contains("challenge_length")));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = SiteConfig::from_toml_file("/nonexistent/dailyread.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
