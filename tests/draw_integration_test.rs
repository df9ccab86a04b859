use anyhow::Result;
use httpmock::prelude::*;
use secret_santa::core::Repository;
use secret_santa::{
    ConsoleNotifier, DrawEngine, FileRepository, HttpNotifier, Matcher, SantaError, TomlConfig,
};
use std::collections::HashSet;
use tempfile::TempDir;

const PARTICIPANTS: &str = r#"{
  "Jane Doe": {
    "email": "jane@example.com",
    "invalid_matches": ["John Doe"]
  },
  "John Doe": {
    "email": "john@example.com",
    "invalid_matches": ["Jane Doe"]
  },
  "Ola Nordmann": {
    "email": "ola@example.com",
    "invalid_matches": []
  },
  "Kari Nordmann": {
    "email": "kari@example.com",
    "invalid_matches": ["Ola Nordmann"]
  }
}"#;

fn setup(dir: &TempDir, participants: &str) -> TomlConfig {
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("participants.json"), participants).unwrap();

    // Backslashes in Windows paths are escapes in a TOML string.
    let normalized = data_dir.to_string_lossy().replace('\\', "/");
    TomlConfig::from_toml_str(&format!("[data]\ndirectory = \"{}\"\n", normalized)).unwrap()
}

#[tokio::test]
async fn test_generate_end_to_end_with_mail_relay() -> Result<()> {
    let dir = TempDir::new()?;
    let config = setup(&dir, PARTICIPANTS);

    let server = MockServer::start();
    let relay = server.mock(|when, then| {
        when.method(POST).path("/messages");
        then.status(200);
    });

    let repository = FileRepository::from_config(&config);
    let notifier = HttpNotifier::new(server.url("/messages"), "santa@example.com");
    let mut engine = DrawEngine::with_matcher(repository.clone(), notifier, Matcher::with_seed(2024));

    let outcome = engine.generate(2024).await?;

    relay.assert_hits(4);
    assert!(outcome.report.is_complete());

    let receivers: HashSet<&str> = outcome.pairing.iter().map(|(_, r)| r).collect();
    assert_eq!(receivers.len(), 4);
    assert_ne!(outcome.pairing.get("Jane Doe"), Some("John Doe"));
    assert_ne!(outcome.pairing.get("John Doe"), Some("Jane Doe"));
    assert_ne!(outcome.pairing.get("Kari Nordmann"), Some("Ola Nordmann"));

    let history_csv = std::fs::read_to_string(repository.history_path())?;
    assert!(history_csv.starts_with("year,gifter,giftee\n"));
    assert_eq!(history_csv.lines().count(), 5);

    let roster = repository.load_roster().await?;
    let names: Vec<&str> = roster.names().collect();
    assert_eq!(names, vec!["Jane Doe", "John Doe", "Ola Nordmann", "Kari Nordmann"]);
    for (giver, receiver) in outcome.pairing.iter() {
        let participant = roster.get(giver).unwrap();
        assert_eq!(participant.invalid_matches.last().map(String::as_str), Some(receiver));
    }

    Ok(())
}

#[tokio::test]
async fn test_resend_after_generate() -> Result<()> {
    let dir = TempDir::new()?;
    let config = setup(&dir, PARTICIPANTS);
    let repository = FileRepository::from_config(&config);

    let mut engine = DrawEngine::new(repository.clone(), ConsoleNotifier::new("santa@example.com"));
    let outcome = engine.generate(2025).await?;
    let ola_draws = outcome.pairing.get("Ola Nordmann").unwrap().to_string();

    let server = MockServer::start();
    let relay = server.mock(|when, then| {
        when.method(POST)
            .path("/messages")
            .json_body_partial(
                serde_json::json!({
                    "to": "ola@example.com",
                    "subject": "Secret Santa drawing for Ola Nordmann",
                    "body": format!(
                        "Hello, Ola Nordmann. \n\nYou have drawn {} for this year's Secret Santa.",
                        ola_draws
                    ),
                })
                .to_string(),
            );
        then.status(200);
    });

    let resend = DrawEngine::new(
        repository,
        HttpNotifier::new(server.url("/messages"), "santa@example.com"),
    );
    let report = resend.notify(Some("Ola Nordmann")).await?;

    relay.assert();
    assert_eq!(report.delivered, vec!["Ola Nordmann"]);
    Ok(())
}

#[tokio::test]
async fn test_infeasible_roster_leaves_files_untouched() -> Result<()> {
    let participants = r#"{
  "A": {"email": "a@example.com", "invalid_matches": ["B", "C"]},
  "B": {"email": "b@example.com", "invalid_matches": []},
  "C": {"email": "c@example.com", "invalid_matches": []}
}"#;
    let dir = TempDir::new()?;
    let config = setup(&dir, participants);
    let repository = FileRepository::from_config(&config);

    let mut engine = DrawEngine::new(repository.clone(), ConsoleNotifier::new("santa@example.com"));
    let err = engine.generate(2025).await.unwrap_err();

    assert!(matches!(err, SantaError::Infeasible { .. }));
    assert!(!repository.history_path().exists());
    assert_eq!(
        std::fs::read_to_string(repository.participants_path())?,
        participants
    );
    Ok(())
}

#[tokio::test]
async fn test_history_lookup_for_unknown_name() -> Result<()> {
    let dir = TempDir::new()?;
    let config = setup(&dir, PARTICIPANTS);
    let engine = DrawEngine::new(
        FileRepository::from_config(&config),
        ConsoleNotifier::new("santa@example.com"),
    );

    let err = engine.history("Nobody", None, 2025).await.unwrap_err();
    assert!(matches!(err, SantaError::UnknownParticipant { .. }));

    let empty = engine.history("Jane Doe", None, 2025).await?;
    assert!(empty.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_three_years_of_draws_never_repeat() -> Result<()> {
    let participants = r#"{
  "A": {"email": "a@example.com", "invalid_matches": []},
  "B": {"email": "b@example.com", "invalid_matches": []},
  "C": {"email": "c@example.com", "invalid_matches": []},
  "D": {"email": "d@example.com", "invalid_matches": []},
  "E": {"email": "e@example.com", "invalid_matches": []},
  "F": {"email": "f@example.com", "invalid_matches": []}
}"#;
    let dir = TempDir::new()?;
    let config = setup(&dir, participants);
    let repository = FileRepository::from_config(&config);
    let mut engine = DrawEngine::new(repository.clone(), ConsoleNotifier::new("santa@example.com"));

    for year in 2023..=2025 {
        engine.generate(year).await?;
    }

    let history = repository.load_history().await?;
    assert_eq!(history.len(), 18);
    let pairs: HashSet<(&str, &str)> = history
        .iter()
        .map(|r| (r.gifter.as_str(), r.giftee.as_str()))
        .collect();
    assert_eq!(pairs.len(), 18, "a pair was drawn twice");

    let a_previous = engine.history("A", None, 2025).await?;
    assert_eq!(a_previous.len(), 2);
    Ok(())
}
