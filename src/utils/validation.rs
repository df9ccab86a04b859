use crate::domain::model::Roster;
use crate::utils::error::{Result, SantaError};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SantaError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SantaError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Checks the roster shape the matcher relies on: at least two participants,
/// unique non-blank names, and exclusions that only name roster members.
pub fn validate_roster(roster: &Roster) -> Result<()> {
    let participants = roster.participants();

    if participants.len() < 2 {
        return Err(SantaError::MalformedRoster {
            message: format!(
                "at least 2 participants are required, found {}",
                participants.len()
            ),
        });
    }

    let mut names = HashSet::with_capacity(participants.len());
    for participant in participants {
        if participant.name.trim().is_empty() {
            return Err(SantaError::MalformedRoster {
                message: "participant names cannot be empty".to_string(),
            });
        }
        if !names.insert(participant.name.as_str()) {
            return Err(SantaError::MalformedRoster {
                message: format!("duplicate participant name '{}'", participant.name),
            });
        }
    }

    for participant in participants {
        if let Some(unknown) = participant
            .invalid_matches
            .iter()
            .find(|excluded| !names.contains(excluded.as_str()))
        {
            return Err(SantaError::MalformedRoster {
                message: format!(
                    "'{}' excludes '{}', who is not a participant",
                    participant.name, unknown
                ),
            });
        }
    }

    Ok(())
}

impl Validate for Roster {
    fn validate(&self) -> Result<()> {
        validate_roster(self)
    }
}
