//! Command-line front end for the reminder core.
//!
//! # Responsibility
//! - Map flags onto `ReminderConfig` and open the configured store.
//! - Render the collection and drive scan cycles; all state changes go
//!   through `ReminderCollection`.

mod due;
mod terminal;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use reminder_core::{
    init_logging, Clock, CollectionError, CommandSink, DueScanner, NotificationSink,
    ReminderCollection, ReminderConfig, ReminderStore, StoreBackend, SystemClock,
};
use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use terminal::TerminalSink;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

type Store = Box<dyn ReminderStore + Send>;

/// How long `watch` waits for an in-flight scan after Ctrl-C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "reminder", version, about = "Track reminders and alert when they are due")]
struct Cli {
    /// Data file (JSON document or SQLite database).
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Storage backend: json or sqlite.
    #[arg(long, global = true, default_value = "json")]
    backend: StoreBackend,

    /// Seconds between scan cycles in `watch`.
    #[arg(long, global = true, default_value_t = 30)]
    interval_secs: u64,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotated log files; file logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Deliver alerts by running this program with title and description
    /// appended (for example `notify-send`).
    #[arg(long, global = true)]
    notify_command: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a reminder.
    Add {
        description: String,
        /// `YYYY-MM-DD HH:MM`, `YYYY-MM-DDTHH:MM:SS` or `DD/MM/YYYY HH:MM`.
        #[arg(long)]
        due: String,
    },
    /// List reminders in insertion order.
    List,
    /// Remove reminders by id.
    Remove {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Run a single scan cycle.
    Scan,
    /// Scan on a fixed interval until interrupted.
    Watch,
}

impl Cli {
    fn config(&self) -> Result<ReminderConfig> {
        let mut config = ReminderConfig {
            backend: self.backend,
            scan_interval: Duration::from_secs(self.interval_secs),
            log_dir: self.log_dir.clone(),
            ..ReminderConfig::default()
        };
        config.data_file = match &self.data_file {
            Some(path) => path.clone(),
            None => reminder_core::config::default_data_file(self.backend),
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn sink(&self) -> Box<dyn NotificationSink + Send + Sync> {
        match &self.notify_command {
            Some(program) => Box::new(CommandSink::new(program)),
            None => Box::new(TerminalSink),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let store = config
        .open_store()
        .with_context(|| format!("failed to open `{}`", config.data_file.display()))?;
    let mut collection = ReminderCollection::open(store);

    match &cli.command {
        Command::Add { description, due } => {
            let due_at = due::parse_due(due)?;
            add(&mut collection, description, due_at)
        }
        Command::List => {
            list(&collection);
            Ok(())
        }
        Command::Remove { ids } => remove(&mut collection, ids),
        Command::Scan => {
            let scanner = DueScanner::new(SystemClock, cli.sink());
            let report = scanner.scan(&mut collection);
            terminal::print_report(&report);
            Ok(())
        }
        Command::Watch => watch(collection, DueScanner::new(SystemClock, cli.sink()), &config),
    }
}

fn add(
    collection: &mut ReminderCollection<Store>,
    description: &str,
    due_at: chrono::NaiveDateTime,
) -> Result<()> {
    match collection.add(description, due_at) {
        Ok(reminder) => {
            println!("{}", reminder.id());
            Ok(())
        }
        Err(CollectionError::Validation(err)) => bail!("input error: {err}"),
        Err(CollectionError::Persistence(err)) => {
            Err(err).context("reminder added but could not be saved; it may be lost on exit")
        }
    }
}

fn list(collection: &ReminderCollection<Store>) {
    if collection.is_empty() {
        println!("no reminders");
        return;
    }
    for reminder in collection.all() {
        println!("{}", terminal::render_row(reminder));
    }
}

fn remove(collection: &mut ReminderCollection<Store>, ids: &[Uuid]) -> Result<()> {
    let ids: HashSet<Uuid> = ids.iter().copied().collect();
    let removed = collection
        .remove(&ids)
        .context("reminders removed but could not be saved")?;
    println!("removed {removed}");
    Ok(())
}

fn watch<C, N>(
    collection: ReminderCollection<Store>,
    scanner: DueScanner<C, N>,
    config: &ReminderConfig,
) -> Result<()>
where
    C: Clock + Send + Sync + 'static,
    N: NotificationSink + Send + Sync + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start scan timer")?;

    info!(
        "event=watch_start module=cli status=ok interval_ms={} backend={}",
        config.scan_interval.as_millis(),
        config.backend
    );
    let stop = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("event=watch_stop module=cli status=error error={}", err);
        }
    };
    runtime.block_on(watch_loop(
        Arc::new(Mutex::new(collection)),
        Arc::new(scanner),
        config.scan_interval,
        stop,
    ));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    info!("event=watch_stop module=cli status=ok");
    Ok(())
}

/// Fires a scan every `interval` until `stop` resolves.
///
/// Scans run on the blocking pool, so a slow sink never delays `stop`.
/// Overlapping firings collapse inside `DueScanner::tick`.
async fn watch_loop<S, C, N>(
    shared: Arc<Mutex<ReminderCollection<S>>>,
    scanner: Arc<DueScanner<C, N>>,
    interval: Duration,
    stop: impl Future<Output = ()>,
) where
    S: ReminderStore + Send + 'static,
    C: Clock + Send + Sync + 'static,
    N: NotificationSink + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let scanner = Arc::clone(&scanner);
                let shared = Arc::clone(&shared);
                tokio::task::spawn_blocking(move || {
                    if let Some(report) = scanner.tick(&*shared) {
                        terminal::print_report(&report);
                    }
                });
            }
            () = &mut stop => break,
        }
    }
}
