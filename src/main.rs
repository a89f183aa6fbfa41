//! batchchain - Main entry point
//!
//! Command-line front end over the chain store, editor and runner.

use anyhow::{bail, Context, Result};
use batchchain::capabilities::{CommandCatalog, PromptAnswer};
use batchchain::cli::{Cli, Commands};
use batchchain::config::AppConfig;
use batchchain::console::{TerminalProgress, TerminalPrompt};
use batchchain::defaults::StaticCatalog;
use batchchain::dry_run::{DryRunApplier, DryRunWorkspace};
use batchchain::editor::{ChainSession, LoadedChain, SwitchOutcome};
use batchchain::engine::{ChainRunner, RunEnv};
use batchchain::settings::JsonSettings;
use batchchain::store::ChainStore;
use batchchain::types::ExecutionRequest;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the logger with appropriate settings
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // RUST_LOG overrides the default level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            AppConfig::load_from_file(path)?
        }
        None => AppConfig::resolve(cli.data_dir.as_deref()),
    };
    config.validate()?;
    debug!("Using {:?}", config);

    let store = ChainStore::open(&config.chains_dir)?;
    let mut settings = JsonSettings::open(&config.settings_file)?;

    match cli.command {
        Commands::List => {
            for name in store.list_names()? {
                if store.is_fixed(&name) {
                    println!("{} (built-in)", name);
                } else {
                    println!("{}", name);
                }
            }
        }
        Commands::Show { name } => {
            let chain = store.load(&name)?;
            let loaded = LoadedChain::new(chain, store.is_fixed(&name));
            print_chain(&loaded);
        }
        Commands::Commands => {
            for (id, friendly) in StaticCatalog.commands() {
                println!("{:<24} {}", id, friendly);
            }
        }
        Commands::New { name } => {
            let mut prompt = TerminalPrompt::stdio();
            let mut session = ChainSession::new(&store);
            let created = match name {
                Some(name) => {
                    session.add_chain(&name, &mut prompt)?;
                    session.active_name().map(str::to_string)
                }
                None => session.add_interactive(&mut prompt)?,
            };
            match created {
                Some(name) => println!("✓ Created chain '{}'", name),
                None => println!("Cancelled"),
            }
        }
        Commands::Delete { name, yes } => {
            let mut prompt = TerminalPrompt::stdio();
            if yes {
                prompt = prompt.assume(PromptAnswer::Yes);
            }
            let mut session = ChainSession::new(&store);
            if session.delete_with_confirmation(&name, &mut prompt)? {
                println!("✓ Deleted chain '{}'", name);
            } else {
                println!("Kept chain '{}'", name);
            }
        }
        Commands::Rename { old_name, new_name } => {
            let mut session = open_chain(&store, &old_name)?;
            session.rename_active(&new_name)?;
            println!("✓ Renamed '{}' to '{}'", old_name, new_name);
        }
        Commands::Insert {
            chain,
            command,
            params,
            at,
        } => {
            let mut session = open_chain(&store, &chain)?;
            let editor = session.editor()?;
            let index = match at {
                Some(step) => to_index(step)?,
                None => editor.len(),
            };
            let landed = editor.insert_step(index, command, params)?;
            save_and_show(&mut session, &mut settings)?;
            debug!("Inserted at step {}", landed + 1);
        }
        Commands::Remove { chain, step } => {
            let mut session = open_chain(&store, &chain)?;
            let removed = session.editor()?.delete_step(to_index(step)?)?;
            info!("Removed {} {}", removed.command, removed.params);
            save_and_show(&mut session, &mut settings)?;
        }
        Commands::Up { chain, step } => {
            let mut session = open_chain(&store, &chain)?;
            session.editor()?.move_up(to_index(step)?)?;
            save_and_show(&mut session, &mut settings)?;
        }
        Commands::Down { chain, step } => {
            let mut session = open_chain(&store, &chain)?;
            session.editor()?.move_down(to_index(step)?)?;
            save_and_show(&mut session, &mut settings)?;
        }
        Commands::SetParams {
            chain,
            step,
            params,
        } => {
            let mut session = open_chain(&store, &chain)?;
            session.editor()?.edit_step_params(to_index(step)?, params)?;
            save_and_show(&mut session, &mut settings)?;
        }
        Commands::Restore { name } => {
            let mut session = open_chain(&store, &name)?;
            session.editor()?.restore_default(&store)?;
            save_and_show(&mut session, &mut settings)?;
        }
        Commands::Export { name, dest } => {
            store.export(&name, &dest)?;
            println!("✓ Exported '{}' to {:?}", name, dest);
        }
        Commands::Import { source } => {
            let name = store.import_file(&source)?;
            println!("✓ Imported chain '{}'", name);
        }
        Commands::Run { chain, files } => {
            let completed = run_dry(&store, &mut settings, chain, files)?;
            if !completed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Open an editing session with `name` loaded.
fn open_chain<'s>(store: &'s ChainStore, name: &str) -> Result<ChainSession<'s>> {
    let mut session = ChainSession::new(store);
    let mut prompt = TerminalPrompt::stdio();
    match session.switch_to(name, &mut prompt)? {
        SwitchOutcome::Switched => Ok(session),
        SwitchOutcome::Cancelled => bail!("Opening '{}' was cancelled", name),
    }
}

/// Convert a 1-based step number from the command line.
fn to_index(step: usize) -> Result<usize> {
    step.checked_sub(1)
        .context("Step numbers start at 1")
}

fn save_and_show(session: &mut ChainSession<'_>, settings: &mut JsonSettings) -> Result<()> {
    session.save_changes(settings)?;
    if let Some(loaded) = session.loaded() {
        print_chain(loaded);
    }
    Ok(())
}

fn print_chain(loaded: &LoadedChain) {
    let marker = if loaded.is_fixed() { " (built-in)" } else { "" };
    println!("{}{}", loaded.name(), marker);
    for row in loaded.rows(&StaticCatalog) {
        if row.is_end {
            println!("{:>3}  {}", row.number, row.command);
        } else {
            println!("{:>3}  {:<24} {}", row.number, row.command, row.params);
        }
    }
}

/// Preview `chain` over `files` with dry-run capabilities.
///
/// Returns true if every file was processed.
fn run_dry(
    store: &ChainStore,
    settings: &mut JsonSettings,
    chain: String,
    mut files: Vec<PathBuf>,
) -> Result<bool> {
    files.sort();

    let mut progress = TerminalProgress::new();
    if let Err(e) = progress.install_ctrlc_handler() {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }
    let mut workspace = DryRunWorkspace::new();
    let mut applier = DryRunApplier::new();
    let mut prompt = TerminalPrompt::stdio();

    let mut runner = ChainRunner::new(store);
    let report = {
        let mut env = RunEnv {
            workspace: &mut workspace,
            applier: &mut applier,
            progress: &mut progress,
            prompt: &mut prompt,
            settings,
        };
        runner.run(&ExecutionRequest::batch(chain, files), &mut env)
    };

    println!("{}", report.summary());
    info!(
        "Dry run applied the chain {} time(s); final stage {}",
        applier.applied(),
        runner.stage()
    );
    Ok(report.is_completed())
}
