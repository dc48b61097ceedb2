pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

/// Weave, a conversational task agent.
#[derive(Debug, Parser)]
#[command(name = "weave", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Run a single agent turn and print the result.
    Run {
        /// The request to send, e.g. "add dentist friday 3pm".
        message: String,
        /// User the turn runs as.
        #[arg(long, default_value = "cli")]
        user: String,
        /// Continue an existing conversation.
        #[arg(long)]
        conversation: Option<String>,
        /// Existing category names (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Output the full outcome as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load config from `WV_CONFIG` (default `config.toml`). A missing file
/// yields the built-in defaults.
pub fn load_config() -> anyhow::Result<(wv_domain::config::Config, String)> {
    let config_path = std::env::var("WV_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        wv_domain::config::Config::default()
    };

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_repeated_categories() {
        let cli = Cli::parse_from([
            "weave", "run", "add milk", "--category", "Inbox", "--category", "Errands", "--json",
        ]);
        match cli.command {
            Some(Command::Run { message, user, categories, json, conversation }) => {
                assert_eq!(message, "add milk");
                assert_eq!(user, "cli");
                assert_eq!(categories, ["Inbox", "Errands"]);
                assert!(json);
                assert!(conversation.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["weave"]);
        assert!(cli.command.is_none());
    }
}
