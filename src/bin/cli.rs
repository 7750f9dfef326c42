//! tackle-ingest CLI
//!
//! Local execution entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tackle_ingest::{
    adapters::{self, ScrapeContext},
    config::ServiceEnv,
    error::{AppError, Result},
    models::Config,
    pipeline::{Pipeline, RunOptions},
};

/// tackle-ingest - Fishing Tackle Catalog Ingestion
#[derive(Parser, Debug)]
#[command(
    name = "tackle-ingest",
    version,
    about = "Ingest manufacturer product catalogs into a variant catalog"
)]
struct Cli {
    /// Path to storage directory containing config.toml
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest one site or feed
    Run {
        /// Slug of the configured site or feed
        #[arg(long)]
        site: String,

        /// Product URL to process instead of running discovery (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Process only the first N products
        #[arg(long)]
        limit: Option<usize>,

        /// Use an in-memory catalog, local blob directory and logging tracker
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration and site profiles
    Validate,

    /// List configured sites and feeds
    Sites,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn build_pipeline(
    config: Arc<Config>,
    ctx: &ScrapeContext,
    dry_run: bool,
    storage_dir: &Path,
) -> Result<Pipeline> {
    if dry_run {
        let blob_dir = storage_dir.join("blobs");
        log::info!("Dry run: images go to {}", blob_dir.display());
        return Ok(Pipeline::dry_run(config, ctx.client().clone(), blob_dir));
    }

    let env = ServiceEnv::from_env()?;
    live_pipeline(config, ctx, &env).await
}

#[cfg(feature = "s3")]
async fn live_pipeline(
    config: Arc<Config>,
    ctx: &ScrapeContext,
    env: &ServiceEnv,
) -> Result<Pipeline> {
    Ok(Pipeline::live(config, ctx.client().clone(), env).await)
}

#[cfg(not(feature = "s3"))]
async fn live_pipeline(
    _config: Arc<Config>,
    _ctx: &ScrapeContext,
    _env: &ServiceEnv,
) -> Result<Pipeline> {
    Err(AppError::config("built without the `s3` feature; use --dry-run"))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);
    config.resolve_feed_paths(&cli.storage_dir);
    log::debug!("Loaded configuration from {}", config_path.display());

    match cli.command {
        Command::Run {
            site,
            urls,
            limit,
            dry_run,
            json,
        } => {
            config.validate()?;
            let adapter = adapters::build_adapter(&config, &site)?;
            let ctx = ScrapeContext::from_config(&config)?;
            let pipeline =
                build_pipeline(Arc::new(config), &ctx, dry_run, &cli.storage_dir).await?;

            let options = RunOptions { limit, urls };
            let summary = pipeline.run(adapter.as_ref(), &ctx, &options).await;
            drop(ctx);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            for slug in adapters::source_slugs(&config) {
                adapters::build_adapter(&config, slug)?;
                log::info!("✓ {}", slug);
            }

            match ServiceEnv::from_env() {
                Ok(_) => log::info!("✓ Service environment complete"),
                Err(AppError::Config(e)) => log::warn!("Live runs unavailable: {}", e),
                Err(e) => return Err(e),
            }

            log::info!("All validations passed!");
        }

        Command::Sites => {
            for site in &config.sites {
                println!(
                    "{:<20} {} (site, {} listing URLs)",
                    site.slug,
                    site.manufacturer,
                    site.listing_urls.len()
                );
            }
            for feed in &config.feeds {
                println!("{:<20} {} (feed, {})", feed.slug, feed.manufacturer, feed.location);
            }
        }
    }

    Ok(())
}
