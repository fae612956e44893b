use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::domain::validation;
use crate::backend::storage::db::DATABASE_URL;

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_EMAIL: &str = "no-reply@localhost";
const DEFAULT_OUTPUT_DIR: &str = ".";

#[derive(Debug, Parser)]
#[command(name = "shop", version, about = "Interactive product, client and order manager")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(long, short, env = "SHOP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long, env = "SHOP_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Directory that receives CSV exports and receipts
    #[arg(long, env = "SHOP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// SMTP password, kept out of the config file
    #[arg(long, env = "SHOP_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DATABASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (required)
    StartTls,
    /// Implicit TLS from the first byte
    Tls,
    /// No encryption, for local relays and test sinks
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host; empty disables email dispatch
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub security: SmtpSecurity,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SMTP_PORT,
            username: String::new(),
            password: String::new(),
            from: DEFAULT_FROM_EMAIL.to_string(),
            security: SmtpSecurity::StartTls,
        }
    }
}

impl SmtpConfig {
    pub fn is_enabled(&self) -> bool {
        !self.host.trim().is_empty()
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl AppConfig {
    /// Parse and validate TOML configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Build the effective configuration: command line and environment win
    /// over the file, which wins over the defaults.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            database_url,
            output_dir,
            smtp_password,
        } = args;

        let mut app_config = match config.as_deref() {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };

        if let Some(url) = database_url {
            app_config.database.url = url;
        }
        if let Some(directory) = output_dir {
            app_config.output.directory = directory;
        }
        if let Some(password) = smtp_password {
            app_config.smtp.password = password;
        }

        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.database.url.trim().is_empty(),
            "Database URL cannot be empty"
        );

        if self.smtp.is_enabled() {
            anyhow::ensure!(self.smtp.port != 0, "SMTP port must be non-zero");
            anyhow::ensure!(
                validation::is_valid_email(&self.smtp.from),
                "SMTP sender address is invalid: {}",
                self.smtp.from
            );
            if self.smtp.has_credentials() {
                anyhow::ensure!(
                    !self.smtp.password.is_empty(),
                    "SMTP password is required when a username is set"
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> CliArgs {
        CliArgs {
            config: None,
            database_url: None,
            output_dir: None,
            smtp_password: None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_args(no_args()).expect("Defaults must be valid");

        assert_eq!(config.database.url, DATABASE_URL);
        assert_eq!(config.output.directory, PathBuf::from("."));
        assert!(!config.smtp.is_enabled());
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.security, SmtpSecurity::StartTls);
    }

    #[test]
    fn test_parse_full_file() {
        let config = AppConfig::parse(
            r#"
            [database]
            url = "sqlite://data/shop.db"

            [smtp]
            host = "smtp.example.com"
            port = 2525
            username = "shop"
            password = "secret"
            from = "orders@example.com"
            security = "tls"

            [output]
            directory = "exports"
            "#,
        )
        .expect("Config should parse");

        assert_eq!(config.database.url, "sqlite://data/shop.db");
        assert!(config.smtp.is_enabled());
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.security, SmtpSecurity::Tls);
        assert_eq!(config.output.directory, PathBuf::from("exports"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::parse("[output]\ndirectory = \"out\"\n").unwrap();

        assert_eq!(config.database.url, DATABASE_URL);
        assert_eq!(config.smtp, SmtpConfig::default());
    }

    #[test]
    fn test_rejects_bad_sender_when_smtp_enabled() {
        let err = AppConfig::parse("[smtp]\nhost = \"relay\"\nfrom = \"nope\"\n").unwrap_err();
        assert!(err.to_string().contains("sender"));
    }

    #[test]
    fn test_rejects_username_without_password() {
        let result = AppConfig::parse(
            "[smtp]\nhost = \"relay\"\nusername = \"shop\"\nfrom = \"a@b.co\"\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.toml");
        fs::write(
            &path,
            "[database]\nurl = \"sqlite://file.db\"\n[smtp]\nhost = \"relay\"\nusername = \"shop\"\nfrom = \"a@b.co\"\n",
        )
        .unwrap();

        let config = AppConfig::from_args(CliArgs {
            config: Some(path),
            database_url: Some("sqlite::memory:".to_string()),
            output_dir: Some(PathBuf::from("/tmp/shop")),
            smtp_password: Some("from-env".to_string()),
        })
        .expect("Password from CLI should satisfy validation");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.output.directory, PathBuf::from("/tmp/shop"));
        assert_eq!(config.smtp.password, "from-env");
    }
}
