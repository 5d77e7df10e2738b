//! # aau
//!
//! Command-line front end for anonymous usage tokens: print a fresh token,
//! show the suffix the host would send, trigger a heartbeat by hand, or
//! provision organization and machine tokens.

#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;

use aau_core::{DebugFlags, init_subscriber};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Anonymous usage token utility.
#[derive(Parser, Debug)]
#[command(name = "aau", about = "Anonymous usage tokens for user agents", version)]
struct Cli {
    /// Settings file (defaults to `~/.aau/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one freshly generated token
    Random,

    /// Print the user-agent suffix for this invocation
    Tokens {
        /// Environment prefix (defaults to `$CONDA_PREFIX`)
        #[arg(long)]
        prefix: Option<PathBuf>,

        /// Behave as if anonymous usage were disabled
        #[arg(long)]
        disabled: bool,

        /// Host user agent to append the suffix to
        #[arg(long, default_value = "")]
        host_agent: String,

        /// Hide token values, as shown to users
        #[arg(long)]
        redact: bool,
    },

    /// Send the activation heartbeat now
    Heartbeat {
        /// Channel name, or a full base URL
        #[arg(long)]
        channel: Option<String>,

        /// Path appended to the channel URL
        #[arg(long)]
        path: Option<String>,

        /// Resolve and log without sending
        #[arg(long)]
        dry_run: bool,

        /// Wait for the probe to finish
        #[arg(long)]
        wait: bool,
    },

    /// Install an organization or machine token
    Provision {
        /// Which token to write
        #[arg(long, value_enum)]
        kind: SystemKind,

        /// Directory to write it into
        #[arg(long)]
        dir: PathBuf,
    },
}

/// Token kinds an administrator can install.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SystemKind {
    Organization,
    Machine,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let flags = DebugFlags::from_env();
    init_subscriber(flags.log_level());

    let settings = cli.settings.unwrap_or_else(aau_settings::settings_path);
    let mut out = std::io::stdout().lock();
    match cli.command {
        Commands::Random => commands::random(&mut out),
        Commands::Tokens {
            prefix,
            disabled,
            host_agent,
            redact,
        } => commands::tokens(
            &mut out,
            &settings,
            flags,
            &commands::TokensArgs {
                prefix,
                disabled,
                host_agent,
                redact,
            },
        ),
        Commands::Heartbeat {
            channel,
            path,
            dry_run,
            wait,
        } => commands::heartbeat(
            &mut out,
            &settings,
            flags,
            &commands::HeartbeatArgs {
                channel,
                path,
                dry_run,
                wait,
            },
        ),
        Commands::Provision { kind, dir } => commands::provision(&mut out, kind.into(), &dir),
    }
}

impl From<SystemKind> for aau_tokens::TokenKind {
    fn from(kind: SystemKind) -> Self {
        match kind {
            SystemKind::Organization => Self::Organization,
            SystemKind::Machine => Self::Machine,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_provision() {
        let cli = Cli::parse_from(["aau", "provision", "--kind", "machine", "--dir", "/etc/conda"]);
        match cli.command {
            Commands::Provision { kind, dir } => {
                assert_eq!(kind, SystemKind::Machine);
                assert_eq!(dir, PathBuf::from("/etc/conda"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_heartbeat_flags() {
        let cli = Cli::parse_from(["aau", "heartbeat", "--channel", "r", "--dry-run", "--wait"]);
        match cli.command {
            Commands::Heartbeat {
                channel,
                path,
                dry_run,
                wait,
            } => {
                assert_eq!(channel.as_deref(), Some("r"));
                assert_eq!(path, None);
                assert!(dry_run);
                assert!(wait);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
