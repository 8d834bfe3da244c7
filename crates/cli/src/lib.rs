pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use digsafe_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "digsafe",
    about = "Dig-ticket compliance clock",
    long_about = "Compute statutory locate and meet deadlines, utility readiness, and ticket \
                  expiration against a configured holiday calendar.",
    after_help = "Examples:\n  digsafe deadlines --filed-at 2025-06-02T10:00\n  \
                  digsafe readiness --response \"Xcel Energy=Marked\" --response \"Lumen=Clear\"\n  \
                  digsafe doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the config file (default: digsafe.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured log level")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Override the configured jurisdiction")]
    jurisdiction: Option<String>,
    #[arg(long, global = true, help = "Override the configured holiday file")]
    holiday_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the expiring-soon window in hours")]
    expiring_soon_hours: Option<i64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute locate-ready, meet-wait, and expiration timestamps for a ticket")]
    Deadlines {
        #[arg(long, help = "When the ticket was filed (YYYY-MM-DDTHH:MM[:SS])")]
        filed_at: String,
        #[arg(long, help = "When the on-site meet was held")]
        meet_held_at: Option<String>,
        #[arg(long, help = "Reference time for expiration status")]
        now: Option<String>,
    },
    #[command(about = "Aggregate utility responses into a dig readiness verdict")]
    Readiness {
        #[arg(long = "response", value_name = "UTILITY=STATUS[@TIME]", help = "Utility response")]
        responses: Vec<String>,
    },
    #[command(about = "Render the ticket's legal dig start as an iCalendar event")]
    Ics {
        #[arg(long = "ticket", help = "Ticket number")]
        ticket_number: String,
        #[arg(long, help = "When the ticket was filed")]
        filed_at: String,
        #[arg(long, help = "Treat the ticket as a meet ticket")]
        meet: bool,
        #[arg(long, help = "When the on-site meet was held (implies --meet)")]
        meet_held_at: Option<String>,
        #[arg(long = "work-to-begin", help = "Requested work start")]
        work_to_begin_at: Option<String>,
        #[arg(long, help = "Work site address")]
        site: Option<String>,
        #[arg(long, help = "Free-text instructions for the crew")]
        instructions: Option<String>,
    },
    #[command(about = "List the configured holidays")]
    Holidays {
        #[arg(long, help = "Only list holidays in this year")]
        year: Option<i32>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, the holiday calendar, and holiday coverage")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
        #[arg(long, help = "Year that must be covered by holiday data (default: current)")]
        year: Option<i32>,
    },
}

impl Cli {
    /// Global flags as config load options; flags win over env and file.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                jurisdiction: self.jurisdiction.clone(),
                holiday_file: self.holiday_file.clone(),
                expiring_soon_hours: self.expiring_soon_hours,
                log_level: self.log_level.clone(),
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();
    init_logging(&options);

    let result = match cli.command {
        Command::Deadlines { filed_at, meet_held_at, now } => commands::deadlines::run(
            &options,
            &commands::deadlines::DeadlinesRequest { filed_at, meet_held_at, now },
        ),
        Command::Readiness { responses } => commands::readiness::run(&options, &responses),
        Command::Ics {
            ticket_number,
            filed_at,
            meet,
            meet_held_at,
            work_to_begin_at,
            site,
            instructions,
        } => commands::ics::run(
            &options,
            &commands::ics::IcsRequest {
                ticket_number,
                filed_at,
                meet,
                meet_held_at,
                work_to_begin_at,
                site,
                instructions,
            },
        ),
        Command::Holidays { year } => commands::holidays::run(&options, year),
        Command::Config => commands::config::run(&options),
        Command::Doctor { json, year } => commands::doctor::run(&options, json, year),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

// Logs go to stderr; stdout carries the command payload. A config that fails
// to load is reported by the command itself, so logging falls back to defaults.
fn init_logging(options: &LoadOptions) {
    use tracing::Level;

    let config = AppConfig::load(options.clone()).unwrap_or_default();
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::Cli;

    #[test]
    fn global_flags_become_config_overrides() {
        let cli = Cli::try_parse_from([
            "digsafe",
            "holidays",
            "--jurisdiction",
            "WI",
            "--holiday-file",
            "wi.toml",
            "--expiring-soon-hours",
            "24",
            "--log-level",
            "debug",
        ])
        .expect("flags parse");

        let options = cli.load_options();
        assert_eq!(options.overrides.jurisdiction.as_deref(), Some("WI"));
        assert_eq!(options.overrides.holiday_file, Some(PathBuf::from("wi.toml")));
        assert_eq!(options.overrides.expiring_soon_hours, Some(24));
        assert_eq!(options.overrides.log_level.as_deref(), Some("debug"));
        assert!(!options.require_file);
    }

    #[test]
    fn explicit_config_path_is_required() {
        let cli = Cli::try_parse_from(["digsafe", "--config", "site.toml", "config"])
            .expect("flags parse");

        let options = cli.load_options();
        assert_eq!(options.config_path, Some(PathBuf::from("site.toml")));
        assert!(options.require_file);
    }
}
