use chapter_watch::{
    config::{AppConfig, NotifierConfig},
    feeds::HttpFeedSource,
    notifier::{DiscordClient, LogNotifier, MessageTemplate, Notifier, TelegramClient},
    observability::{init_logging, CycleSummary},
    state::{JsonFileStore, MemoryStore, StateStore},
    tasks::{feed_monitor::FeedWatcher, scheduler::Scheduler},
    WatchResult,
};
use clap::Parser;
use dotenvy::dotenv;
use std::{path::PathBuf, process::ExitCode, sync::Arc};

/// CLI options
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run a single check cycle and exit
    #[clap(long)]
    once: bool,

    /// Log announcements instead of sending them, and leave the state file untouched
    #[clap(long)]
    dry_run: bool,

    /// Path of the watermark state file (overrides CW_STATE_FILE)
    #[clap(long)]
    state_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenv().ok();
    init_logging();

    let args = Args::parse();
    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = args.state_file.clone() {
        config.state_file = path;
    }

    match run(args, config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(args: Args, config: AppConfig) -> WatchResult<ExitCode> {
    let scheduler = build_scheduler(&args, &config).await?;
    tracing::info!(
        watchers = scheduler.watcher_count(),
        interval_secs = config.check_interval.as_secs(),
        state_file = %config.state_file.display(),
        dry_run = args.dry_run,
        "Scheduler ready"
    );

    if args.once {
        let results = scheduler.run_once().await;
        let summary = CycleSummary::from_results(&results);
        return Ok(if summary.failed == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    scheduler.run().await;
    Ok(ExitCode::SUCCESS)
}

async fn build_scheduler(args: &Args, config: &AppConfig) -> WatchResult<Scheduler> {
    let source = Arc::new(HttpFeedSource::new(config.fetch_timeout)?);
    let durable = JsonFileStore::new(&config.state_file);

    let store: Arc<dyn StateStore>;
    let notifier: Arc<dyn Notifier>;
    if args.dry_run {
        let snapshot = durable.load().await?;
        store = Arc::new(MemoryStore::new(snapshot));
        notifier = Arc::new(LogNotifier);
    } else {
        store = Arc::new(durable);
        notifier = notifier_from(&config.notifier);
    }

    let free = FeedWatcher::new(
        "free",
        &config.free_feed_url,
        MessageTemplate::new("🆓", "New Free Chapter").routed(config.free_route.clone()),
    )
    .first_run(config.first_run);
    let paid = FeedWatcher::new(
        "paid",
        &config.paid_feed_url,
        MessageTemplate::new("💰", "New Paid Chapter").routed(config.paid_route.clone()),
    )
    .first_run(config.first_run);

    Ok(
        Scheduler::new(source, store, notifier, config.check_interval)
            .with_watcher(free)
            .with_watcher(paid),
    )
}

fn notifier_from(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match config {
        NotifierConfig::Discord(discord) => Arc::new(DiscordClient::new(discord.clone())),
        NotifierConfig::Telegram(telegram) => Arc::new(TelegramClient::new(telegram.clone())),
        NotifierConfig::Log => Arc::new(LogNotifier),
    }
}
