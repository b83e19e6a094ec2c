//! Sumi-Fetcher main entry point
//!
//! This is the command-line interface for fetching resources the way the
//! crawler's fetch stage does.

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;
use sumi_fetcher::config::{load_config_with_hash, Config};
use sumi_fetcher::{fetch_all, Fetcher, Resource, Session};
use tracing_subscriber::EnvFilter;

/// Sumi-Fetcher: fetch resources with rotating user agents
///
/// Each URL is fetched once, in order, and reported with its status code,
/// size and content type. Failed fetches are reported with status 400 (or
/// 404 when the server answered 404 or 410) instead of stopping the run.
#[derive(Parser, Debug)]
#[command(name = "sumi-fetcher")]
#[command(version)]
#[command(about = "Fetch resources the way the crawler does", long_about = None)]
struct Cli {
    /// URLs to fetch
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let fetcher = Fetcher::new(&config.fetcher)?;
    tracing::info!(
        "Rotating {} user agents, content limit {} bytes",
        fetcher.rotator().len(),
        fetcher.content_limit()
    );

    let session = match &config.session {
        Some(session_config) => {
            let session = Session::from_config(&config.fetcher, session_config);
            if let Err(e) = session
                .login(
                    &session_config.login_url,
                    &session_config.username,
                    &session_config.password,
                )
                .await
            {
                tracing::error!("Login failed, fetching anonymously: {}", e);
            }
            Some(session)
        }
        None => None,
    };

    let fetcher = match &session {
        Some(session) => fetcher.with_cookies(session.cookies().clone()),
        None => fetcher,
    };

    let resources = cli.urls.iter().map(Resource::new);
    let mut results = std::pin::pin!(fetch_all(&fetcher, resources));
    while let Some(data) = results.next().await {
        println!(
            "{}\t{}\t{}\t{}{}",
            data.status_code,
            data.content.len(),
            if data.content_type.is_empty() {
                "-"
            } else {
                data.content_type.as_str()
            },
            data.resource.url,
            if data.is_truncated() { "\t[truncated]" } else { "" }
        );
    }

    if let (Some(session), Some(logout_url)) = (
        &session,
        config.session.as_ref().and_then(|s| s.logout_url.as_ref()),
    ) {
        if let Err(e) = session.logout(logout_url).await {
            tracing::error!("Logout failed: {}", e);
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_fetcher=info,warn"),
            1 => EnvFilter::new("sumi_fetcher=debug,info"),
            2 => EnvFilter::new("sumi_fetcher=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
