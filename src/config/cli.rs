use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "secret-santa")]
#[command(about = "Draw Secret Santa pairings, keep the history and email everyone their match")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "santa.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines on stderr")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate this year's pairings, record them and email every participant.
    Generate {
        /// Draw for this year instead of the current one
        #[arg(long)]
        year: Option<i32>,

        /// Record the draw but print the emails instead of sending them
        #[arg(long)]
        print_only: bool,
    },

    /// Send (or resend) the latest pairings.
    Email {
        /// Name of the person to send an email to. If omitted, everyone is emailed.
        #[arg(long)]
        recipient: Option<String>,

        /// Print the emails instead of sending them
        #[arg(long)]
        print_only: bool,
    },

    /// Show who a participant was matched with.
    History {
        /// Name of the gifter
        name: String,

        /// Only this year. Without it, every year before the current one is shown.
        #[arg(long)]
        year: Option<i32>,
    },
}
