use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// batchchain - manage and apply named command chains
#[derive(Parser)]
#[command(name = "batchchain")]
#[command(about = "Create, edit and apply named chains of editing commands")]
#[command(version)]
pub struct Cli {
    /// Data directory holding chains and settings
    /// (default: $BATCHCHAIN_DATA_DIR or ./.batchchain)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// JSON configuration file overriding the directory layout
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored chains
    List,
    /// Show the steps of a chain
    Show {
        /// Chain name
        name: String,
    },
    /// List the commands known to the catalog
    Commands,
    /// Create an empty chain (prompts for a name if none is given)
    New {
        name: Option<String>,
    },
    /// Delete a chain
    Delete {
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Rename a chain
    Rename {
        old_name: String,
        new_name: String,
    },
    /// Insert a step (appends when no position is given)
    Insert {
        /// Chain name
        chain: String,
        /// Command identifier
        command: String,
        /// Parameter string
        #[arg(short, long, default_value = "")]
        params: String,
        /// 1-based position to insert at
        #[arg(short = 'n', long)]
        at: Option<usize>,
    },
    /// Remove a step
    Remove {
        chain: String,
        /// 1-based step number
        step: usize,
    },
    /// Move a step one position earlier
    Up {
        chain: String,
        /// 1-based step number
        step: usize,
    },
    /// Move a step one position later
    Down {
        chain: String,
        /// 1-based step number
        step: usize,
    },
    /// Replace the parameters of a step
    SetParams {
        chain: String,
        /// 1-based step number
        step: usize,
        params: String,
    },
    /// Restore a built-in chain to its default steps
    Restore {
        name: String,
    },
    /// Write a chain to a file
    Export {
        name: String,
        dest: PathBuf,
    },
    /// Add a chain from a file; the file stem becomes its name
    Import {
        source: PathBuf,
    },
    /// Preview applying a chain to files (dry run)
    Run {
        /// Chain name
        chain: String,
        /// Files to process, in sorted order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_insert_arguments() {
        let cli = Cli::try_parse_from([
            "batchchain", "insert", "Loud", "Amplify", "--params", "Ratio=2", "-n", "1",
        ])
        .expect("parse"); // test: valid arguments
        match cli.command {
            Commands::Insert {
                chain,
                command,
                params,
                at,
            } => {
                assert_eq!(chain, "Loud");
                assert_eq!(command, "Amplify");
                assert_eq!(params, "Ratio=2");
                assert_eq!(at, Some(1));
            }
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn test_global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["batchchain", "list", "--data-dir", "/tmp/x", "-v"])
            .expect("parse"); // test: valid arguments
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_run_requires_files() {
        assert!(Cli::try_parse_from(["batchchain", "run", "Loud"]).is_err());
    }
}
