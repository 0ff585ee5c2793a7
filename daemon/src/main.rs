mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use pigeonhunter::config::{self, FileConfigStore};
use pigeonhunter::db::{default_database_path, Database};
use pigeonhunter::worker::{run_once, Scheduler};
use pigeonhunter::{
    load_config, ConfigError, EmailTracker, ImapClient, OpenAiDeadlineExtractor,
    OpenAiTranslator, PigeonError, Pipeline,
};

use cli::Args;

/// Dependencies that drown out our own output at debug level.
const QUIET_TARGETS: &str = "async_imap=warn,reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(format!("debug,{}", QUIET_TARGETS))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("info,{}", QUIET_TARGETS)))
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
    // Storage and transport code logs through the `log` facade
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records into tracing: {}", e);
    }
}

async fn run(args: Args) -> Result<(), PigeonError> {
    let config_path = config::resolve_config_path(args.config.clone())?;

    if args.reconfig {
        return reconfigure(&config_path);
    }
    if args.init {
        if config::write_template(&config_path)? {
            info!(
                "Template config written to {}. Edit it and start again.",
                config_path.display()
            );
        } else {
            info!("Config already exists at {}", config_path.display());
        }
        return Ok(());
    }

    if !config_path.exists() {
        return Err(ConfigError::Validation {
            message: format!(
                "no config at {}; run with --init to create one",
                config_path.display()
            ),
        }
        .into());
    }

    let config = load_config(&config_path)?;
    info!("Loaded config from {}", config_path.display());

    let db_path = match args.db.clone().or_else(default_database_path) {
        Some(path) => path,
        None => return Err(ConfigError::NoConfigLocation.into()),
    };
    let tracker = EmailTracker::new(Database::open(&db_path)?);
    match tracker.stats() {
        Ok(stats) => info!(
            "Ledger holds {} processed message(s), last at {}",
            stats.total_processed,
            stats.last_processed_at.as_deref().unwrap_or("never")
        ),
        Err(e) => warn!("Could not read ledger stats: {}", e),
    }

    let translator = OpenAiTranslator::from_config(&config.openai)?;
    let extractor = OpenAiDeadlineExtractor::from_config(&config.openai)?;
    let debug_mode = config.general.debug_scan || args.debug_scan;
    if debug_mode {
        warn!(
            "Debug scan enabled: messages with subject prefix '{}' are replayed every pass",
            config.general.debug_subject_prefix
        );
    }

    let mut source = ImapClient::new(config.imap.clone());
    let mut pipeline = Pipeline::new(
        config.clone(),
        tracker,
        Arc::new(translator),
        Arc::new(extractor),
        Arc::new(FileConfigStore::new(&config_path)),
    )
    .with_debug_mode(debug_mode);

    if args.once {
        run_once(&mut pipeline, &mut source).await;
        return Ok(());
    }

    let scheduler = Scheduler::from_minutes(config.general.check_interval_minutes);
    let shutdown = scheduler.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Shutdown requested, finishing current pass");
        shutdown.store(true, Ordering::Release);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    scheduler.run(&mut pipeline, &mut source).await;
    info!("PigeonHunter stopped");
    Ok(())
}

fn reconfigure(path: &Path) -> Result<(), PigeonError> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|source| ConfigError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Removed existing config at {}", path.display());
    }
    config::write_template(path)?;
    info!(
        "Fresh template written to {}. Edit it and start again.",
        path.display()
    );
    Ok(())
}
