//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "cloudkeeper",
    version,
    about = "Track, probe and enrich the domains you own"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Directory holding the local store
    #[arg(long, global = true, env = "CLOUDKEEPER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// API key for AI-generated descriptions
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Reachability probe timeout in seconds
    #[arg(long, global = true, default_value_t = 5)]
    pub probe_timeout: u64,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in to the dashboard
    Login {
        #[arg(short, long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "CLOUDKEEPER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// List tracked domains
    List {
        /// Filter by name or URL
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show every detail of one domain
    Show { id: String },
    /// Track a new domain
    Add { url: String },
    /// Re-check one domain now
    Refresh { id: String },
    /// Re-run DNS, geolocation and RDAP lookups for one domain
    Analyze { id: String },
    /// Edit descriptive fields
    Edit(EditArgs),
    /// Stop tracking a domain
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-check all domains periodically until interrupted
    Watch {
        /// Seconds between sweeps
        #[arg(long, default_value_t = 300)]
        interval: u64,
        /// Run one sweep immediately
        #[arg(long)]
        now: bool,
    },
    /// Select the storage backend
    #[command(subcommand)]
    Storage(StorageCommand),
    /// Audit log
    #[command(subcommand)]
    Logs(LogsCommand),
    /// Import records from a JSON file
    Import { file: PathBuf },
    /// Export records to a JSON file
    Export { file: PathBuf },
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum StorageCommand {
    /// Keep data in the local data directory
    Local,
    /// Keep data in a remote PostgREST table
    Remote {
        #[arg(long, env = "CLOUDKEEPER_REMOTE_URL")]
        url: String,
        #[arg(long, env = "CLOUDKEEPER_REMOTE_KEY", hide_env_values = true)]
        key: String,
    },
    /// Print the current backend
    Show,
    /// Print the SQL that creates the remote tables
    SetupSql,
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// Print recent entries
    Show {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Write all entries to a dated JSON file
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Clear the local buffer
    Clear,
}

impl Command {
    /// Whether the command runs without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Logout | Self::Storage(_))
    }

    /// Whether the command is useless without the record list.
    ///
    /// The others still run when loading records fails at startup, so a
    /// broken backend can be repaired and the local audit buffer read.
    pub fn needs_records(&self) -> bool {
        !matches!(
            self,
            Self::Login { .. } | Self::Logout | Self::Storage(_) | Self::Logs(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_delete_with_yes() {
        let cli = Cli::try_parse_from(["cloudkeeper", "delete", "abc", "--yes"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Command::Delete { ref id, yes: true }) if id == "abc"
        ));
    }

    #[test]
    fn storage_commands_are_public() {
        let cli = Cli::try_parse_from(["cloudkeeper", "storage", "show"]);
        assert!(cli.is_ok_and(|c| c.command.is_public()));
        let cli = Cli::try_parse_from(["cloudkeeper", "list", "--search", "foo"]);
        assert!(cli.is_ok_and(|c| !c.command.is_public()));
    }

    #[test]
    fn logs_run_without_records_but_need_a_session() {
        for args in [
            ["cloudkeeper", "logs", "show"],
            ["cloudkeeper", "logs", "clear"],
        ] {
            let command = Cli::try_parse_from(args).map(|c| c.command);
            assert!(command.is_ok_and(|c| !c.needs_records() && !c.is_public()));
        }
    }

    #[test]
    fn record_commands_need_records() {
        for args in [
            vec!["cloudkeeper", "list"],
            vec!["cloudkeeper", "analyze", "abc"],
            vec!["cloudkeeper", "watch", "--now"],
        ] {
            let command = Cli::try_parse_from(args).map(|c| c.command);
            assert!(command.is_ok_and(|c| c.needs_records()));
        }
        let command = Cli::try_parse_from(["cloudkeeper", "storage", "local"]).map(|c| c.command);
        assert!(command.is_ok_and(|c| !c.needs_records()));
    }
}
