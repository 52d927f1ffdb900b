mod jobs;
mod profiles;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use clipdb_core::Platform;
use clipdb_jobs::{AnalyticsService, PgStore, ServiceSettings};
use clipdb_scraper::ApifyClient;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "clipdb-cli")]
#[command(about = "Creator video analytics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Request analytics for a creator, starting a scrape job when needed
    Scrape {
        /// tiktok, instagram, or youtube
        platform: Platform,
        /// Handle, @handle, or profile URL
        identifier: String,
        /// Number of videos to request (1-100); defaults to CLIPDB_DEFAULT_RESULT_LIMIT
        #[arg(long)]
        limit: Option<u32>,
        /// Poll the job until it settles
        #[arg(long)]
        watch: bool,
        /// Opaque id of the requesting user, recorded on the job
        #[arg(long)]
        user_id: Option<String>,
        /// Ignore fresh cached results and always start a job
        #[arg(long)]
        force: bool,
    },
    /// Reconcile a job once and print its status
    Status {
        job_id: Uuid,
    },
    /// Poll a job until it settles or the attempt cap is reached
    Watch {
        job_id: Uuid,
        /// Seconds between polls; defaults to CLIPDB_POLL_INTERVAL_SECS
        #[arg(long)]
        interval: Option<u64>,
        /// Maximum polls; defaults to CLIPDB_POLL_MAX_ATTEMPTS
        #[arg(long)]
        max_attempts: Option<u32>,
    },
    /// Show a creator's stored profile and video summary
    Profile {
        platform: Platform,
        username: String,
    },
    /// List a creator's scrape jobs, newest first
    Jobs {
        platform: Platform,
        username: String,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("clipdb-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = clipdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = clipdb_db::PoolConfig::from_app_config(&config);
    let pool = clipdb_db::connect_pool(&config.database_url, pool_config).await?;

    if matches!(command, Commands::Migrate) {
        let applied = clipdb_db::run_migrations(&pool).await?;
        println!("applied {applied} migration(s)");
        return Ok(());
    }

    let remote = Arc::new(ApifyClient::from_config(&config)?);
    let store = Arc::new(PgStore::new(pool));
    let service = AnalyticsService::new(store, remote, ServiceSettings::from_config(&config));

    match command {
        Commands::Migrate => {}
        Commands::Scrape {
            platform,
            identifier,
            limit,
            watch,
            user_id,
            force,
        } => {
            let request = clipdb_jobs::AnalyticsRequest {
                platform,
                identifier,
                result_limit: limit,
                user_id,
                force_refresh: force,
            };
            let policy = jobs::poll_policy(&config, None, None);
            jobs::run_scrape(&service, request, watch.then_some(policy)).await?;
        }
        Commands::Status { job_id } => jobs::run_status(&service, job_id).await?,
        Commands::Watch {
            job_id,
            interval,
            max_attempts,
        } => {
            let policy = jobs::poll_policy(&config, interval, max_attempts);
            jobs::run_watch(&service, job_id, policy).await?;
        }
        Commands::Profile { platform, username } => {
            profiles::run_profile(&service, platform, &username).await?;
        }
        Commands::Jobs {
            platform,
            username,
            limit,
        } => profiles::run_jobs(&service, platform, &username, limit).await?,
    }

    Ok(())
}
