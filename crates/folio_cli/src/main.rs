//! `folio` operator tool.
//!
//! Runs reconciliation passes against the SQLite-backed portfolio store and
//! moves collections in and out of it.
//!
//! Exit codes: 0 success (including "no data"), 1 pass or store failure,
//! 2 usage or configuration error.

use clap::{Args, Parser, Subcommand};
use folio_core::db::open_db;
use folio_core::{
    core_version, decode_collection, init_logging, AuditEntry, Diagnostic, FolioConfig, IdSeed,
    KvStore, Outcome, PassOptions, ReconcileService, Reporter, SqliteKvStore,
};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Repair duplicate record ids in the portfolio store")]
#[command(version = core_version())]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML config file
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite store file (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Store key holding the collection (overrides config)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Absolute directory for rolling logs (overrides config)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (overrides config; needs a log dir)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Fixed seed for replacement ids (overrides config)
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Reassign duplicate ids and save the corrected collection
    Reconcile {
        /// Run every stage but do not write
        #[arg(long)]
        dry_run: bool,

        /// Print the pass summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report duplicates and invalid records without writing
    Check {
        #[arg(long)]
        json: bool,
    },
    /// Store a JSON collection file under the key
    Import {
        file: PathBuf,
    },
    /// Print the stored collection
    Export {
        #[arg(long)]
        pretty: bool,
    },
}

/// Prints pass progress for an operator.
struct ConsoleReporter {
    quiet: bool,
}

impl Reporter for ConsoleReporter {
    fn pass_started(&mut self, _pass_id: Uuid, store_key: &str) {
        if !self.quiet {
            eprintln!("checking `{store_key}`");
        }
    }

    fn audit(&mut self, entry: &AuditEntry) {
        if self.quiet {
            return;
        }
        eprintln!(
            "duplicate id `{}`: #{} `{}` keeps it, #{} `{}` -> `{}`",
            entry.original_id,
            entry.first_index,
            entry.first_record_name.as_deref().unwrap_or("(unnamed)"),
            entry.index,
            entry.duplicate_record_name.as_deref().unwrap_or("(unnamed)"),
            entry.assigned_id
        );
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        if !self.quiet {
            eprintln!("warning: {diagnostic}");
        }
    }

    fn finished(&mut self, outcome: Outcome, message: &str) {
        if outcome == Outcome::Failed {
            eprintln!("error: {message}");
        } else if !self.quiet {
            eprintln!("{message}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli.global) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(message) = init_logging(&config.log_level, log_dir) {
            eprintln!("error: {message}");
            return ExitCode::from(EXIT_USAGE);
        }
    }

    let result = match cli.command {
        Command::Reconcile { dry_run, json } => run_pass(&config, dry_run, json),
        Command::Check { json } => run_pass(&config, true, json),
        Command::Import { file } => import(&config, &file),
        Command::Export { pretty } => export(&config, pretty),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(message) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn resolve_config(args: &GlobalArgs) -> Result<FolioConfig, String> {
    let mut config = match args.config.as_deref() {
        Some(path) => FolioConfig::load(path).map_err(|err| err.to_string())?,
        None => FolioConfig::default(),
    };

    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(key) = &args.key {
        config.store_key = key.trim().to_string();
    }
    if let Some(log_dir) = &args.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.log_level.is_some() && config.log_dir.is_none() {
        return Err(
            "--log-level has no effect without --log-dir or `log_dir` in the config".to_string(),
        );
    }

    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn run_pass(config: &FolioConfig, dry_run: bool, json: bool) -> Result<(), String> {
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let store = SqliteKvStore::try_new(&conn).map_err(|err| err.to_string())?;
    let service = ReconcileService::new(store, config.store_key.as_str());
    let options = PassOptions {
        dry_run,
        seed: config.seed.map(IdSeed::fixed),
    };
    let mut reporter = ConsoleReporter { quiet: json };

    // The reporter has already printed the failure.
    let summary = service
        .run_pass(&options, &mut reporter)
        .map_err(|_| String::new())?;

    if json {
        let text = serde_json::to_string_pretty(&summary).map_err(|err| err.to_string())?;
        println!("{text}");
    }
    Ok(())
}

fn import(config: &FolioConfig, file: &Path) -> Result<(), String> {
    let raw = std::fs::read_to_string(file)
        .map_err(|err| format!("failed to read `{}`: {err}", file.display()))?;
    let records = decode_collection(&raw).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let store = SqliteKvStore::try_new(&conn).map_err(|err| err.to_string())?;
    store
        .set(&config.store_key, &raw)
        .map_err(|err| err.to_string())?;

    info!(
        "event=import module=cli status=ok records={} bytes={}",
        records.len(),
        raw.len()
    );
    eprintln!(
        "imported {} records into `{}`",
        records.len(),
        config.store_key
    );
    Ok(())
}

fn export(config: &FolioConfig, pretty: bool) -> Result<(), String> {
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let store = SqliteKvStore::try_new(&conn).map_err(|err| err.to_string())?;
    let Some(raw) = store
        .get(&config.store_key)
        .map_err(|err| err.to_string())?
    else {
        eprintln!("no data found under `{}`", config.store_key);
        return Ok(());
    };

    info!(
        "event=export module=cli status=ok bytes={} pretty={}",
        raw.len(),
        pretty
    );
    if pretty {
        let records = decode_collection(&raw).map_err(|err| err.to_string())?;
        let text = serde_json::to_string_pretty(&records).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        println!("{raw}");
    }
    Ok(())
}
