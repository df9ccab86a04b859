use crate::domain::model::{DeliveryReport, HistoryRecord, Notification, Roster};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where the roster and the pairing history live.
pub trait Repository: Send + Sync {
    fn load_roster(&self) -> impl std::future::Future<Output = Result<Roster>> + Send;
    fn save_roster(&self, roster: &Roster) -> impl std::future::Future<Output = Result<()>> + Send;
    fn load_history(&self) -> impl std::future::Future<Output = Result<Vec<HistoryRecord>>> + Send;
    fn append_history(
        &self,
        records: &[HistoryRecord],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn participants_path(&self) -> String;
    fn history_path(&self) -> String;
    fn relay_endpoint(&self) -> Option<&str>;
    fn sender_email(&self) -> &str;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one message per notification. A failure for one participant
    /// is recorded in the report and does not stop the others.
    async fn notify(&self, notifications: &[Notification]) -> DeliveryReport;
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn notify(&self, notifications: &[Notification]) -> DeliveryReport {
        (**self).notify(notifications).await
    }
}
