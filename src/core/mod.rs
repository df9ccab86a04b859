pub mod draw;
pub mod matcher;

pub use crate::domain::model::{
    DeliveryReport, HistoryRecord, Notification, Pairing, Participant, Roster,
};
pub use crate::domain::ports::{ConfigProvider, Notifier, Repository};
pub use crate::utils::error::Result;
