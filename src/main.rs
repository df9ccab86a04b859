use chrono::Datelike;
use clap::Parser;
use secret_santa::core::{ConfigProvider, Notifier};
use secret_santa::utils::{logger, validation::Validate};
use secret_santa::{
    CliConfig, Command, ConsoleNotifier, DeliveryReport, DrawEngine, FileRepository, HttpNotifier,
    Matcher, Result, SantaError, SmtpNotifier, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🎅 Starting secret-santa");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match TomlConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file is valid TOML");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(command: Command, config: &TomlConfig) -> Result<()> {
    let repository = FileRepository::from_config(config);
    let current_year = chrono::Local::now().year();

    match command {
        Command::Generate { year, print_only } => {
            let notifier = build_notifier(config, print_only)?;
            let matcher = Matcher::from_seed(config.seed());
            let mut engine = DrawEngine::with_matcher(repository, notifier, matcher);

            let outcome = engine.generate(year.unwrap_or(current_year)).await?;
            println!(
                "✅ Drew {} pairings for {}",
                outcome.pairing.len(),
                outcome.year
            );
            check_delivery(&outcome.report)
        }
        Command::Email {
            recipient,
            print_only,
        } => {
            tracing::info!("Sending emails to participants...");
            let notifier = build_notifier(config, print_only)?;
            let engine = DrawEngine::new(repository, notifier);

            let report = engine.notify(recipient.as_deref()).await?;
            check_delivery(&report)
        }
        Command::History { name, year } => {
            let engine = DrawEngine::new(repository, build_notifier(config, true)?);
            let records = engine.history(&name, year, current_year).await?;

            if records.is_empty() {
                println!("No matches found for {}", name);
            } else {
                println!("{:<6} {:<24} {}", "year", "gifter", "giftee");
                for record in records {
                    println!("{:<6} {:<24} {}", record.year, record.gifter, record.giftee);
                }
            }
            Ok(())
        }
    }
}

fn build_notifier(config: &TomlConfig, print_only: bool) -> Result<Box<dyn Notifier>> {
    if print_only {
        return Ok(Box::new(
            ConsoleNotifier::new(config.sender_email()).with_subject_prefix(config.subject_prefix()),
        ));
    }

    if let Some(smtp) = &config.notifier.smtp {
        let notifier = SmtpNotifier::from_config(smtp, config.sender_email(), config.timeout())?
            .with_subject_prefix(config.subject_prefix());
        return Ok(Box::new(notifier));
    }

    let endpoint = config
        .relay_endpoint()
        .ok_or_else(|| SantaError::MissingConfigError {
            field: "notifier.smtp or notifier.endpoint".to_string(),
        })?;

    let notifier = HttpNotifier::new(endpoint, config.sender_email())
        .with_timeout(config.timeout())?
        .with_api_token(config.notifier.api_token.clone())
        .with_subject_prefix(config.subject_prefix());
    Ok(Box::new(notifier))
}

fn check_delivery(report: &DeliveryReport) -> Result<()> {
    if report.is_complete() {
        Ok(())
    } else {
        Err(SantaError::PartialDelivery {
            failed: report.failed_names(),
        })
    }
}
