use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub email: String,
    /// Names this participant must not be assigned. Their own name is
    /// always excluded whether or not it is listed.
    pub invalid_matches: Vec<String>,
}

impl Participant {
    pub fn new(name: impl Into<String>, email: impl Into<String>, invalid_matches: Vec<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            invalid_matches,
        }
    }

    pub fn excludes(&self, other: &str) -> bool {
        self.name == other || self.invalid_matches.iter().any(|name| name == other)
    }
}

/// Participants in file order. Order is significant: it is the order in
/// which givers are assigned and the order the roster is written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|p| p.name.as_str())
    }

    /// Appends each giver's new receiver to their exclusions so the same
    /// pair cannot be drawn next year.
    pub fn record_pairing(&mut self, pairing: &Pairing) {
        for (giver, receiver) in pairing.iter() {
            if let Some(participant) = self.get_mut(giver) {
                participant.invalid_matches.push(receiver.to_string());
            }
        }
    }

    /// How many givers in `pairing` lack their receiver in `invalid_matches`.
    pub fn missing_exclusions(&self, pairing: &Pairing) -> usize {
        pairing
            .iter()
            .filter(|(giver, receiver)| {
                self.get(receiver).is_some()
                    && self
                        .get(giver)
                        .is_some_and(|p| !p.invalid_matches.iter().any(|x| x == receiver))
            })
            .count()
    }

    /// Like [`Roster::record_pairing`], but skips receivers already excluded
    /// and receivers who are no longer on the roster.
    pub fn record_missing(&mut self, pairing: &Pairing) {
        let known: Vec<bool> = pairing.iter().map(|(_, r)| self.get(r).is_some()).collect();
        for ((giver, receiver), known) in pairing.iter().zip(known) {
            if !known {
                continue;
            }
            if let Some(participant) = self.get_mut(giver) {
                if !participant.invalid_matches.iter().any(|x| x == receiver) {
                    participant.invalid_matches.push(receiver.to_string());
                }
            }
        }
    }
}

impl FromIterator<Participant> for Roster {
    fn from_iter<I: IntoIterator<Item = Participant>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Giver to receiver assignments, in roster order of the givers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pairing {
    pairs: Vec<(String, String)>,
}

impl Pairing {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn get(&self, giver: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(g, _)| g == giver)
            .map(|(_, receiver)| receiver.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(g, r)| (g.as_str(), r.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_history(&self, year: i32) -> Vec<HistoryRecord> {
        self.iter()
            .map(|(gifter, giftee)| HistoryRecord {
                year,
                gifter: gifter.to_string(),
                giftee: giftee.to_string(),
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for Pairing {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One row of the `year,gifter,giftee` history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub year: i32,
    pub gifter: String,
    pub giftee: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub name: String,
    pub email: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    /// (participant, reason)
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.failed.iter().map(|(name, _)| name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_always_excludes_self() {
        let alice = Participant::new("Alice", "alice@example.com", vec!["Bob".to_string()]);
        assert!(alice.excludes("Alice"));
        assert!(alice.excludes("Bob"));
        assert!(!alice.excludes("Carol"));
    }

    #[test]
    fn test_record_pairing_appends_receiver() {
        let mut roster = Roster::new(vec![
            Participant::new("Alice", "a@example.com", vec!["Bob".to_string()]),
            Participant::new("Bob", "b@example.com", vec![]),
            Participant::new("Carol", "c@example.com", vec![]),
        ]);
        let pairing: Pairing = [("Alice", "Carol"), ("Bob", "Alice"), ("Carol", "Bob")]
            .into_iter()
            .map(|(g, r)| (g.to_string(), r.to_string()))
            .collect();

        roster.record_pairing(&pairing);

        assert_eq!(roster.get("Alice").unwrap().invalid_matches, vec!["Bob", "Carol"]);
        assert_eq!(roster.get("Bob").unwrap().invalid_matches, vec!["Alice"]);
        assert_eq!(roster.get("Carol").unwrap().invalid_matches, vec!["Bob"]);
    }

    #[test]
    fn test_record_missing_only_fills_gaps() {
        let mut roster = Roster::new(vec![
            Participant::new("Alice", "a@example.com", vec!["Bob".to_string()]),
            Participant::new("Bob", "b@example.com", vec![]),
        ]);
        let pairing = Pairing::new(vec![
            ("Alice".to_string(), "Bob".to_string()),
            ("Bob".to_string(), "Alice".to_string()),
        ]);

        assert_eq!(roster.missing_exclusions(&pairing), 1);
        roster.record_missing(&pairing);
        assert_eq!(roster.missing_exclusions(&pairing), 0);
        assert_eq!(roster.get("Alice").unwrap().invalid_matches, vec!["Bob"]);
        assert_eq!(roster.get("Bob").unwrap().invalid_matches, vec!["Alice"]);
    }

    #[test]
    fn test_pairing_to_history_keeps_order() {
        let pairing = Pairing::new(vec![
            ("Bob".to_string(), "Alice".to_string()),
            ("Alice".to_string(), "Bob".to_string()),
        ]);
        let history = pairing.to_history(2025);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].gifter, "Bob");
        assert_eq!(history[1].giftee, "Bob");
        assert!(history.iter().all(|r| r.year == 2025));
    }
}
