//! # blog_autopost
//!
//! Post automation for a Jekyll blog.
//!
//! ## Features
//!
//! - `daily`: writes today's AI news roundup from RSS feeds, and the next
//!   study guide in a fixed topic rotation, both generated through the
//!   Anthropic Messages API
//! - `import`: copies a Naver blog's posts into `_posts/`, converting HTML to
//!   Markdown and mapping each post onto a site category
//!
//! ## Usage
//!
//! ```sh
//! blog_autopost daily
//! blog_autopost import --blog-id myblog --limit 10
//! ```
//!
//! ## Architecture
//!
//! Everything runs sequentially on a single-threaded runtime:
//! 1. **Gate**: skip any post whose deterministic filename already exists
//! 2. **Collect**: fetch feeds or scrape the source page
//! 3. **Generate / convert**: ask the model, or convert HTML to Markdown
//! 4. **Output**: write the post file, then persist the study rotation

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod classify;
mod cli;
mod config;
mod daily;
mod error;
mod import;
mod markdown;
mod models;
mod outputs;
mod prompts;
mod rotation;
mod scrapers;
mod utils;

use api::{AnthropicClient, LlmConfig};
use cli::{Cli, Command, DailyArgs, ImportArgs};
use config::Settings;
use daily::run_daily;
use import::{ImportOptions, run_import};
use scrapers::HttpFetcher;
use utils::{ensure_writable_dir, now_in};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.config, ?args.posts_dir, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(dir) = args.posts_dir {
        settings.posts_dir = dir;
    }

    if let Err(e) = ensure_writable_dir(&settings.posts_dir).await {
        error!(
            path = %settings.posts_dir.display(),
            error = %e,
            "Posts directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let code = match args.command {
        Command::Daily(daily_args) => daily(&settings, daily_args).await?,
        Command::Import(import_args) => import(&settings, import_args).await?,
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(code)
}

#[instrument(level = "info", skip_all)]
async fn daily(settings: &Settings, args: DailyArgs) -> Result<ExitCode, Box<dyn Error>> {
    // Fails before any network call when the key is missing.
    let llm = LlmConfig::new(args.api_key.as_deref(), args.model.as_deref())?;
    info!(model = %llm.model, "Using model");
    let generator = AnthropicClient::new(llm)?;
    let fetcher = HttpFetcher::new(None)?;
    let state_file = args.state_file.unwrap_or_else(|| settings.state_file.clone());
    let now = now_in(settings.utc_offset()?);

    let report = run_daily(settings, &fetcher, &generator, &state_file, now).await?;
    if report.is_failure() {
        error!(errors = report.errors.len(), "No post could be created");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[instrument(level = "info", skip_all, fields(blog_id = %args.blog_id))]
async fn import(settings: &Settings, args: ImportArgs) -> Result<ExitCode, Box<dyn Error>> {
    let fetcher = HttpFetcher::new(Some(scrapers::naver::USER_AGENT))?;
    let options = ImportOptions {
        blog_id: args.blog_id,
        limit: args.limit,
        skip_existing: !args.no_skip_existing,
    };
    let summary = run_import(settings, &fetcher, &options).await?;
    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "Done"
    );
    Ok(ExitCode::SUCCESS)
}
