//! Command-line interface definitions.
//!
//! Secrets and the model override can be given as flags or through the
//! environment (`ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL`).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for blog_autopost.
///
/// # Examples
///
/// ```sh
/// # Daily news + study post (run from the site root, e.g. by a CI cron job)
/// ANTHROPIC_API_KEY=... blog_autopost daily
///
/// # Import the 20 most recent Naver posts, rewriting existing files
/// blog_autopost import --blog-id myblog --limit 20 --no-skip-existing
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a settings YAML file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for generated posts (overrides the settings file)
    #[arg(long, global = true)]
    pub posts_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate today's AI news post and the next study post
    Daily(DailyArgs),
    /// Import posts from a Naver blog
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct DailyArgs {
    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier
    #[arg(long, env = "ANTHROPIC_MODEL")]
    pub model: Option<String>,

    /// Rotation state file (overrides the settings file)
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Naver blog id
    #[arg(long, default_value = "qoxmfaktmxj")]
    pub blog_id: String,

    /// Number of RSS entries to import; 0 means all
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Re-import posts whose file already exists
    #[arg(long)]
    pub no_skip_existing: bool,
}
