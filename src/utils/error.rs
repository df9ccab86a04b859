use thiserror::Error;

#[derive(Error, Debug)]
pub enum SantaError {
    #[error("No valid pairing exists: {reason}")]
    Infeasible { reason: String },

    #[error("Malformed roster: {message}")]
    MalformedRoster { message: String },

    #[error("No participant found with the name '{name}'")]
    UnknownParticipant { name: String },

    #[error("Failed to notify {participant}: {message}")]
    DeliveryError { participant: String, message: String },

    #[error("Notification failed for {} participant(s): {}", failed.len(), failed.join(", "))]
    PartialDelivery { failed: Vec<String> },

    #[error("Mail relay request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("SMTP error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Matching,
    Roster,
    Delivery,
    Configuration,
    Storage,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SantaError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SantaError::Infeasible { .. } => ErrorCategory::Matching,
            SantaError::MalformedRoster { .. } | SantaError::UnknownParticipant { .. } => {
                ErrorCategory::Roster
            }
            SantaError::DeliveryError { .. }
            | SantaError::PartialDelivery { .. }
            | SantaError::ApiError(_)
            | SantaError::SmtpError(_) => ErrorCategory::Delivery,
            SantaError::ConfigError { .. }
            | SantaError::ConfigValidationError { .. }
            | SantaError::InvalidConfigValueError { .. }
            | SantaError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SantaError::CsvError(_) | SantaError::IoError(_) | SantaError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            SantaError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Matching
            | ErrorCategory::Roster
            | ErrorCategory::Configuration
            | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// Process exit status for a run that ended in this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SantaError::Infeasible { reason } => {
                format!("Could not generate valid Secret Santa pairings: {}", reason)
            }
            SantaError::MalformedRoster { message } => {
                format!("The participants file is not usable: {}", message)
            }
            SantaError::UnknownParticipant { name } => {
                format!("No participant found with the name '{}'.", name)
            }
            SantaError::PartialDelivery { failed } => format!(
                "Some notifications could not be delivered ({})",
                failed.join(", ")
            ),
            SantaError::IoError(e) => format!("Could not read or write a data file: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Matching => {
                "Relax some participants' invalid_matches so that everyone has at least one possible recipient"
            }
            ErrorCategory::Roster => {
                "Check participant names and invalid_matches in the participants file"
            }
            ErrorCategory::Delivery => {
                "Check the [notifier] settings, then resend with `email --recipient <NAME>`"
            }
            ErrorCategory::Configuration => "Check the configuration file and environment variables",
            ErrorCategory::Storage => "Make sure the data directory exists and is writable",
            ErrorCategory::Processing => "Run `generate` first to create this year's pairings",
        }
    }
}

pub type Result<T> = std::result::Result<T, SantaError>;
