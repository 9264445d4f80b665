use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use logicbase::logic::{self, Base, BaseOptions};
use logicbase::model::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "logicbase", version, about = "Run configuration logic against a data directory")]
struct Cli {
    /// Logic root; the data directory is resolved relative to it.
    #[arg(long, env = "LOGICBASE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Config file replacing the per-user one.
    #[arg(long, env = "LOGICBASE_CONFIG")]
    config: Option<PathBuf>,

    /// Print commands instead of executing them.
    #[arg(long, overrides_with = "no_dryrun")]
    dryrun: bool,

    /// Execute commands for real.
    #[arg(long = "no-dryrun", overrides_with = "dryrun")]
    no_dryrun: bool,

    /// Override the detected hostname.
    #[arg(long)]
    hostname: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the hostname, mode and every loaded data entry.
    Dump,
    /// Create the accounts listed in users.json.
    Users,
    /// List the available logic.
    List,
}

impl Command {
    fn logic_name(&self) -> Option<&'static str> {
        match self {
            Command::Dump => Some("dump"),
            Command::Users => Some("users"),
            Command::List => None,
        }
    }
}

impl Cli {
    fn dry_run(&self, config: &AppConfig) -> bool {
        if self.no_dryrun {
            false
        } else if self.dryrun {
            true
        } else {
            config.general.dry_run
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let _guard = init_logging(&config)?;

    tracing::info!("logicbase starting");

    let mut registry = logic::builtin::registry()?;

    let Some(name) = cli.command.logic_name() else {
        for row in registry.summary() {
            println!("{row}");
        }
        return Ok(());
    };

    let options = BaseOptions {
        data_dir: config.data_dir(&cli.root),
        dry_run: cli.dry_run(&config),
        hostname: cli.hostname.clone().or_else(|| config.general.hostname.clone()),
    };
    let base = Base::new(options).context("loading data directory")?;

    let report = registry.execute(name, &base)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Log to a daily file, never stdout: stdout carries the JSON report.
fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "logicbase")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "logicbase.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("logicbase={}", config.logging.level)));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Ok(guard)
}
