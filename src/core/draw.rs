use crate::core::matcher::Matcher;
use crate::core::{DeliveryReport, HistoryRecord, Notification, Notifier, Pairing, Repository, Roster};
use crate::utils::error::{Result, SantaError};
use crate::utils::validation::Validate;

#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub year: i32,
    pub pairing: Pairing,
    pub report: DeliveryReport,
}

/// Load, match, persist and notify.
pub struct DrawEngine<R: Repository, N: Notifier> {
    repository: R,
    notifier: N,
    matcher: Matcher,
}

impl<R: Repository, N: Notifier> DrawEngine<R, N> {
    pub fn new(repository: R, notifier: N) -> Self {
        Self::with_matcher(repository, notifier, Matcher::new())
    }

    pub fn with_matcher(repository: R, notifier: N, matcher: Matcher) -> Self {
        Self {
            repository,
            notifier,
            matcher,
        }
    }

    /// Draws the pairings for `year`. History and exclusions are only
    /// written once a valid pairing exists; notifications go out last.
    ///
    /// History is written before the roster. If a previous run recorded the
    /// year but died before saving the exclusions, this run finishes that
    /// draw instead of drawing again.
    pub async fn generate(&mut self, year: i32) -> Result<DrawOutcome> {
        tracing::info!("Generating Secret Santa list for {}...", year);

        let mut roster = self.repository.load_roster().await?;
        roster.validate()?;
        tracing::info!("Loaded {} participants", roster.len());

        let history = self.repository.load_history().await?;
        let recorded: Pairing = history
            .iter()
            .filter(|record| record.year == year)
            .map(|record| (record.gifter.clone(), record.giftee.clone()))
            .collect();

        let pairing = if recorded.is_empty() {
            let pairing = self.matcher.compute_pairing(&roster)?;
            tracing::info!("Drew {} pairings", pairing.len());

            self.repository
                .append_history(&pairing.to_history(year))
                .await?;
            roster.record_pairing(&pairing);
            pairing
        } else if roster.missing_exclusions(&recorded) > 0 {
            tracing::warn!(
                "Pairings for {} were recorded but the participants file was not updated, resuming",
                year
            );
            roster.record_missing(&recorded);
            recorded
        } else {
            return Err(SantaError::ProcessingError {
                message: format!(
                    "pairings for {} already exist; use `email` to resend them",
                    year
                ),
            });
        };

        self.repository.save_roster(&roster).await?;
        tracing::debug!("Updated invalid matches for {} participants", pairing.len());

        let notifications = notifications_for(&roster, &pairing);
        let report = self.notifier.notify(&notifications).await;
        log_report(&report);

        Ok(DrawOutcome {
            year,
            pairing,
            report,
        })
    }

    /// Resends the most recent year's pairings, to everyone or to one person.
    pub async fn notify(&self, recipient: Option<&str>) -> Result<DeliveryReport> {
        let roster = self.repository.load_roster().await?;
        let history = self.repository.load_history().await?;

        let (year, pairing) = latest_pairing(&history).ok_or_else(|| SantaError::ProcessingError {
            message: "no pairings have been recorded yet".to_string(),
        })?;
        tracing::info!("Sending {} pairings...", year);

        let notifications = match recipient {
            Some(name) => {
                let participant = roster.get(name).ok_or_else(|| SantaError::UnknownParticipant {
                    name: name.to_string(),
                })?;
                let match_name = pairing.get(name).ok_or_else(|| SantaError::ProcessingError {
                    message: format!("{} has no pairing recorded for {}", name, year),
                })?;
                vec![Notification {
                    name: participant.name.clone(),
                    email: participant.email.clone(),
                    recipient: match_name.to_string(),
                }]
            }
            None => notifications_for(&roster, &pairing),
        };

        let report = self.notifier.notify(&notifications).await;
        log_report(&report);
        Ok(report)
    }

    /// Records for `gifter` in `year`, or in every year before `current_year`.
    pub async fn history(
        &self,
        gifter: &str,
        year: Option<i32>,
        current_year: i32,
    ) -> Result<Vec<HistoryRecord>> {
        let history = self.repository.load_history().await?;
        let roster = self.repository.load_roster().await?;

        if roster.get(gifter).is_none() && !history.iter().any(|r| r.gifter == gifter) {
            return Err(SantaError::UnknownParticipant {
                name: gifter.to_string(),
            });
        }

        Ok(history
            .into_iter()
            .filter(|record| record.gifter == gifter)
            .filter(|record| match year {
                Some(year) => record.year == year,
                None => record.year < current_year,
            })
            .collect())
    }
}

fn latest_pairing(history: &[HistoryRecord]) -> Option<(i32, Pairing)> {
    let year = history.iter().map(|record| record.year).max()?;
    let pairing = history
        .iter()
        .filter(|record| record.year == year)
        .map(|record| (record.gifter.clone(), record.giftee.clone()))
        .collect();
    Some((year, pairing))
}

fn notifications_for(roster: &Roster, pairing: &Pairing) -> Vec<Notification> {
    pairing
        .iter()
        .filter_map(|(giver, receiver)| match roster.get(giver) {
            Some(participant) => Some(Notification {
                name: participant.name.clone(),
                email: participant.email.clone(),
                recipient: receiver.to_string(),
            }),
            None => {
                tracing::warn!("{} is no longer a participant, skipping", giver);
                None
            }
        })
        .collect()
}

fn log_report(report: &DeliveryReport) {
    if report.is_complete() {
        tracing::info!("✅ Notified {} participants", report.delivered.len());
    } else {
        tracing::warn!(
            "Notified {} participants, {} failed: {}",
            report.delivered.len(),
            report.failed.len(),
            report.failed_names().join(", ")
        );
    }
}
