use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use review_notifier::api;
use review_notifier::config::{AppConfig, LogMode};
use review_notifier::database::Database;
use review_notifier::firing::{FiringJob, FiringService};
use review_notifier::gitlab::GitLabClientFactory;
use review_notifier::notifier::{MattermostConfig, MattermostNotifier};
use review_notifier::schedule::{run_tick, ScheduledJob, Scheduler};

#[derive(Parser, Debug)]
#[command(name = "review-notifier")]
#[command(about = "Notifies chat channels about stalled GitLab merge request reviews")]
struct Args {
    /// Address for the HTTP API, overrides SERVER_HOST and SERVER_PORT
    #[arg(long)]
    listen: Option<String>,

    /// Run a single firing tick and exit
    #[arg(long)]
    once: bool,

    /// With --once, run even outside the workday window
    #[arg(long, requires = "once")]
    ignore_window: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config)?;

    info!("Starting review notifier");

    let database = Database::new(&config.database_url)
        .await
        .context("Failed to open database")?;
    database
        .run_migrations()
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let notifier = MattermostNotifier::new(MattermostConfig {
        timeout_secs: config.gitlab_timeout_secs,
        ..MattermostConfig::default()
    })?;
    let job = Arc::new(FiringJob::new(
        Arc::new(database.clients()),
        Arc::new(GitLabClientFactory::new(
            config.gitlab_url.clone(),
            config.gitlab_timeout_secs,
        )),
        Arc::new(notifier),
        FiringService::new(config.discussion_page_limit),
    ));

    let schedule = config.schedule()?;

    if args.once {
        let now = chrono::Utc::now();
        if args.ignore_window {
            let tick = job.run_once(now).await;
            info!("Single tick processed {} clients", tick.tenants.len());
        } else {
            let outcome = run_tick(&schedule.window, job as Arc<dyn ScheduledJob>, now).await;
            info!("Single tick finished: {:?}", outcome);
        }
        return Ok(());
    }

    let mut scheduler = Scheduler::new(schedule);
    scheduler
        .submit(job)
        .context("Failed to schedule firing job")?;
    tokio::spawn(async move {
        if let Err(e) = scheduler.run().await {
            tracing::error!("Scheduler stopped: {}", e);
        }
    });

    let addr = args.listen.unwrap_or_else(|| config.server_addr());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, api::router(database))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Review notifier stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_mode()? {
        LogMode::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogMode::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}
