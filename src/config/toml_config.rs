use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SantaError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    pub matching: Option<MatchingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
    #[serde(default = "default_participants_file")]
    pub participants_file: String,
    #[serde(default = "default_history_file")]
    pub history_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Mail relay that accepts `{"from","to","subject","body"}` JSON posts.
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    #[serde(default = "default_sender")]
    pub sender_email: String,
    pub subject_prefix: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// When present, mail goes out over SMTP and `endpoint` is ignored.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    /// Defaults to 465 for implicit TLS, 587 for STARTTLS and 25 for plain.
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub tls: SmtpTls,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    #[default]
    Implicit,
    Starttls,
    /// Unencrypted. Only for a relay on localhost.
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fixed seed for reproducible draws. Leave unset in production.
    pub seed: Option<u64>,
}

fn default_directory() -> String {
    "data".to_string()
}

fn default_participants_file() -> String {
    "participants.json".to_string()
}

fn default_history_file() -> String {
    "pairings.csv".to_string()
}

fn default_sender() -> String {
    "santa@localhost".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            participants_file: default_participants_file(),
            history_file: default_history_file(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            sender_email: default_sender(),
            subject_prefix: None,
            timeout_seconds: None,
            smtp: None,
        }
    }
}

impl TomlConfig {
    /// Reads and parses a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SantaError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when it exists, otherwise falls back to the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SantaError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SantaError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("data.directory", &self.data.directory)?;
        validation::validate_path("data.participants_file", &self.data.participants_file)?;
        validation::validate_path("data.history_file", &self.data.history_file)?;
        validation::validate_non_empty_string("notifier.sender_email", &self.notifier.sender_email)?;

        if let Some(endpoint) = &self.notifier.endpoint {
            validation::validate_url("notifier.endpoint", endpoint)?;
        }

        if let Some(timeout) = self.notifier.timeout_seconds {
            validation::validate_positive_number("notifier.timeout_seconds", timeout, 1)?;
        }

        if let Some(token) = &self.notifier.api_token {
            check_substituted("notifier.api_token", token)?;
        }

        if let Some(smtp) = &self.notifier.smtp {
            validation::validate_non_empty_string("notifier.smtp.host", &smtp.host)?;
            if let Some(port) = smtp.port {
                validation::validate_positive_number("notifier.smtp.port", u64::from(port), 1)?;
            }
            if let Some(password) = &smtp.password {
                check_substituted("notifier.smtp.password", password)?;
            }
            if smtp.password.is_some() && smtp.username.is_none() {
                return Err(SantaError::MissingConfigError {
                    field: "notifier.smtp.username".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.notifier.timeout_seconds.unwrap_or(30))
    }

    pub fn subject_prefix(&self) -> &str {
        self.notifier
            .subject_prefix
            .as_deref()
            .unwrap_or(crate::adapters::notifier::DEFAULT_SUBJECT_PREFIX)
    }

    pub fn seed(&self) -> Option<u64> {
        self.matching.as_ref().and_then(|m| m.seed)
    }
}

fn check_substituted(field: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(SantaError::ConfigValidationError {
            field: field.to_string(),
            message: format!("environment variable in '{}' is not set", value),
        });
    }
    Ok(())
}

impl ConfigProvider for TomlConfig {
    fn participants_path(&self) -> String {
        Path::new(&self.data.directory)
            .join(&self.data.participants_file)
            .to_string_lossy()
            .into_owned()
    }

    fn history_path(&self) -> String {
        Path::new(&self.data.directory)
            .join(&self.data.history_file)
            .to_string_lossy()
            .into_owned()
    }

    fn relay_endpoint(&self) -> Option<&str> {
        self.notifier.endpoint.as_deref()
    }

    fn sender_email(&self) -> &str {
        &self.notifier.sender_email
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
