use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "daygrid",
    version,
    about = "daygrid: a month-calendar appointment book",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a month grid with its appointment agenda (the default)
    Show {
        /// this/prev/next, a month name, or YYYY-MM
        month: Option<String>,
    },

    /// Add an appointment to a day
    Add {
        /// today/tomorrow/yesterday, a weekday name, +Nd/-Nd, or YYYY-MM-DD
        date: String,

        /// Appointment title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        #[arg(short = 'd', long = "description", default_value = "")]
        description: String,
    },

    /// Remove an appointment from a day
    Remove {
        date: String,

        /// 1-based agenda position on that day, or an appointment id
        selector: String,
    },

    /// Move an appointment to another day
    Move {
        from: String,

        /// 1-based agenda position on the source day, or an appointment id
        selector: String,

        to: String,

        /// 1-based target position in the destination day (default: end)
        #[arg(long = "at")]
        at: Option<usize>,
    },

    /// Insert the one-time demo appointments (no-op after the first run)
    SeedDemo,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, GlobalCli};

    #[test]
    fn parses_add_with_multi_word_title() {
        let cli = GlobalCli::parse_from([
            "daygrid",
            "add",
            "tomorrow",
            "Lunch",
            "with",
            "Alice",
            "--description",
            "Catch up",
        ]);
        match cli.command {
            Some(Command::Add {
                date,
                title,
                description,
            }) => {
                assert_eq!(date, "tomorrow");
                assert_eq!(title.join(" "), "Lunch with Alice");
                assert_eq!(description, "Catch up");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_move_with_target_position() {
        let cli = GlobalCli::parse_from([
            "daygrid",
            "move",
            "2024-02-14",
            "1",
            "2024-02-20",
            "--at",
            "2",
        ]);
        match cli.command {
            Some(Command::Move {
                from,
                selector,
                to,
                at,
            }) => {
                assert_eq!(from, "2024-02-14");
                assert_eq!(selector, "1");
                assert_eq!(to, "2024-02-20");
                assert_eq!(at, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_default_view() {
        let cli = GlobalCli::parse_from(["daygrid", "-v"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 1);
    }
}
