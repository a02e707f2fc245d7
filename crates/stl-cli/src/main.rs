use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser as _;
use tracing_subscriber::EnvFilter;

use stl_cli::commands::{add, edit, import, status, track};
use stl_cli::{Cli, Commands, Config, resolve_root};
use stl_core::{Parser, truncate_to_minute};
use stl_db::Database;

/// Load config and open the store, creating the default directory if needed.
fn open_database(cli: &Cli) -> Result<(Database, Config)> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let root = resolve_root(cli.dir.as_deref(), &config)?;
    let db = Database::open(&root).context("failed to open the log directory")?;
    Ok((db, config))
}

fn run(cli: &Cli) -> Result<()> {
    let now = cli
        .now
        .unwrap_or_else(|| truncate_to_minute(Local::now().naive_local()));
    let parser = Parser::new(now);
    let mut stdout = io::stdout().lock();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        writeln!(stdout)?;
        return Ok(());
    };

    let (db, config) = open_database(cli)?;
    match command {
        Commands::Start { task } => {
            track::start(&mut stdout, &db, now, task.as_deref().unwrap_or_default())?;
        }
        Commands::Stop => track::stop(&mut stdout, &db, now)?,
        Commands::Switch { task } => {
            track::switch(&mut stdout, &db, now, task.as_deref().unwrap_or_default())?;
        }
        Commands::Add { start, stop, task } => add::run(
            &mut stdout,
            &db,
            &parser,
            start,
            stop,
            task.as_deref().unwrap_or_default(),
        )?,
        Commands::Status(args) => status::run(&mut stdout, &db, &parser, args)?,
        Commands::Edit { month } => {
            edit::run(&db, &parser, &month.join(" "), config.editor.as_deref())?;
        }
        Commands::Import(args) => {
            import::run(&mut stdout, &db, args)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so that a second initialisation is not fatal
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("stl: {err:#}");
            ExitCode::FAILURE
        }
    }
}
