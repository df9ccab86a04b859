pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::TomlConfig;

pub use adapters::notifier::{ConsoleNotifier, HttpNotifier};
pub use adapters::smtp::SmtpNotifier;
pub use adapters::storage::FileRepository;
pub use core::draw::{DrawEngine, DrawOutcome};
pub use core::matcher::{compute_pairing, Matcher};
pub use domain::model::{DeliveryReport, HistoryRecord, Notification, Pairing, Participant, Roster};
pub use utils::error::{Result, SantaError};
