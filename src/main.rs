use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rewardpulse::application::usecases::{CheckRewardsUseCase, DispatchActionsUseCase};
use rewardpulse::application::{ChatNotifier, WatchStore};
use rewardpulse::infrastructure::{
    console_notifier::ConsoleNotifier,
    multi_notifier::MultiNotifier,
    patreon_fetcher::{FetchCacheConfig, PatreonFetcher},
    sqlite_store::SqliteWatchStore,
    telegram_notifier::TelegramNotifier,
};
use rewardpulse::interfaces::config::Config;

#[derive(Parser, Debug)]
#[command(name = "rewardpulse")]
struct Args {
    /// Path to config.yaml
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Run a single check cycle and exit
    #[arg(long)]
    once: bool,

    /// Do not send Telegram messages (console only)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rewardpulse=info".parse().unwrap()),
        )
        .init();
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"));
    }
    let args = Args::parse();

    // 1) load config
    let cfg = match Config::load_from_file(&args.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // 2) build infra
    let http = match reqwest::Client::builder()
        .timeout(cfg.request_timeout())
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let store = match SqliteWatchStore::new(&cfg.database.url).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open database {}: {}", cfg.database.url, e);
            std::process::exit(1);
        }
    };

    let fetcher = Arc::new(PatreonFetcher::new(
        http.clone(),
        cfg.patreon.base_domain.clone(),
        FetchCacheConfig {
            enabled: cfg.run.use_fetch_cache,
            validity: cfg.cache_validity(),
            eviction_period: cfg.cache_eviction_period(),
            rewards_max_size: cfg.run.cache_rewards_max_size,
            campaigns_max_size: cfg.cache_campaigns_max_size(),
        },
    ));
    let eviction = fetcher.spawn_cache_eviction();

    // notifiers fanout
    let mut notifiers: Vec<Box<dyn ChatNotifier>> = vec![Box::new(ConsoleNotifier::new())];

    if args.dry_run {
        tracing::warn!("--dry-run enabled: only console output");
    } else if let Some(api_key) = cfg.telegram.api_key.clone() {
        notifiers.push(Box::new(TelegramNotifier::new(
            http.clone(),
            api_key,
            cfg.patreon.base_domain.clone(),
            store.clone() as Arc<dyn WatchStore>,
            cfg.telegram.default_locale.clone(),
        )));
    } else {
        tracing::warn!("telegram.api_key not set, TelegramNotifier disabled");
    }

    let notifier = MultiNotifier::new(notifiers);

    // 3) usecases
    let dispatch = DispatchActionsUseCase {
        store: &*store,
        notifier: &notifier,
    };
    let check = CheckRewardsUseCase {
        store: &*store,
        fetcher: &*fetcher,
        dispatch,
        policy: cfg.check_policy(),
    };

    // 4) run
    if args.once {
        if let Err(e) = check.execute().await {
            tracing::error!("Check cycle failed: {e}");
            std::process::exit(1);
        }
        tracing::info!("run once completed");
        return;
    }

    tracing::info!(
        interval = cfg.run.interval_seconds,
        initial_delay = cfg.run.initial_delay_seconds,
        "scheduler started"
    );

    // Interval counts from the end of one cycle to the start of the next, so a
    // slow cycle pushes the schedule back instead of piling up. Ctrl-c exits
    // between cycles; an in-flight cycle finishes first (requests are bounded
    // by the client timeout).
    let mut shutdown = false;
    tokio::select! {
        _ = tokio::time::sleep(cfg.initial_delay()) => {}
        _ = tokio::signal::ctrl_c() => { shutdown = true; }
    }

    while !shutdown {
        if let Err(e) = check.execute().await {
            tracing::error!("Check cycle failed: {e}");
        }
        tokio::select! {
            _ = tokio::time::sleep(cfg.interval()) => {}
            _ = tokio::signal::ctrl_c() => { shutdown = true; }
        }
    }

    tracing::info!("shutting down");
    if let Some(handle) = eviction {
        handle.abort();
    }
}
