//! depspider main entry point
//!
//! This is the command-line interface for the depspider broken-link and
//! broken-dependency spider.

use anyhow::{bail, Context};
use clap::Parser;
use depspider::config::{load_config_or_default, validate, Config};
use depspider::crawler::run_crawl;
use depspider::output::{format_status_counts, generate_report, print_crawl_summary};
use depspider::storage::SqliteStorage;
use depspider::{canonicalize, ConfigError};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// depspider: find broken links and broken dependencies on a web site
///
/// Crawls a site breadth-first from a root URL and records every fetch in a
/// SQLite database. `--report` turns a recorded run into a Graphviz graph
/// that colors pages by what is broken.
#[derive(Parser, Debug)]
#[command(name = "depspider")]
#[command(version)]
#[command(about = "Broken link and dependency spider", long_about = None)]
struct Cli {
    /// Root URL to start crawling from
    #[arg(value_name = "URL", required_unless_present = "report")]
    url: Option<String>,

    /// Maximum discovery depth (0 = unlimited)
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Additional host suffix whose pages are crawled (repeatable)
    #[arg(long = "host", value_name = "HOST")]
    hosts: Vec<String>,

    /// Per-URL timeout in seconds
    #[arg(long, value_name = "SECS")]
    url_timeout: Option<u64>,

    /// Stop after visiting this many URLs (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_urls: Option<u64>,

    /// Stop after transferring this many bytes (0 = unlimited)
    #[arg(long, value_name = "BYTES")]
    max_bytes: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long, conflicts_with = "report")]
    dry_run: bool,

    /// Write a DOT status graph for a recorded run instead of crawling
    #[arg(long)]
    report: bool,

    /// Run id to report on
    #[arg(long, value_name = "ID", requires = "report", conflicts_with = "run_offset")]
    run: Option<i64>,

    /// Report on the latest run shifted by this (-1 = the run before)
    #[arg(long, value_name = "N", requires = "report", allow_negative_numbers = true)]
    run_offset: Option<i64>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "FILE", requires = "report")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_config_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli).context("Invalid settings")?;

    if cli.report {
        handle_report(&config, &cli)
    } else if cli.dry_run {
        let root = root_url(&cli)?;
        handle_dry_run(&config, &root);
        Ok(())
    } else {
        let root = root_url(&cli)?;
        handle_crawl(&config, &root).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("depspider=info,warn"),
            1 => EnvFilter::new("depspider=debug,info"),
            2 => EnvFilter::new("depspider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so a report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line flags on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), ConfigError> {
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
    if let Some(timeout) = cli.url_timeout {
        config.crawler.url_timeout = timeout;
    }
    if let Some(max_urls) = cli.max_urls {
        config.crawler.max_urls = max_urls;
    }
    if let Some(max_bytes) = cli.max_bytes {
        config.crawler.max_bytes = max_bytes;
    }
    if let Some(database) = &cli.database {
        config.output.database_path = database.display().to_string();
    }
    config.crawler.hosts.extend(cli.hosts.iter().cloned());

    validate(config)
}

/// The root URL from the command line, checked for a fetchable scheme
fn root_url(cli: &Cli) -> anyhow::Result<String> {
    let Some(url) = cli.url.as_deref() else {
        bail!("a root URL is required to crawl");
    };
    let id = canonicalize(url);
    if !id.is_spiderable() || id.host.is_empty() {
        return Err(ConfigError::InvalidUrl(url.to_string()).into());
    }
    Ok(url.to_string())
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config, root: &str) {
    let limit = |value: u64| {
        if value == 0 {
            "unlimited".to_string()
        } else {
            value.to_string()
        }
    };

    println!("=== depspider Dry Run ===\n");
    println!("Root URL: {}", root);
    println!("Root host: {}", canonicalize(root).hostname());

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", limit(u64::from(config.crawler.max_depth)));
    println!("  Max URLs: {}", limit(config.crawler.max_urls));
    println!("  Max bytes: {}", limit(config.crawler.max_bytes));
    println!("  URL timeout: {}s", config.crawler.url_timeout);
    println!("  Commit interval: {}", config.crawler.commit_interval);
    println!("  Content ceiling: {} bytes", config.crawler.max_content_size);

    println!("\nExtra hosts ({}):", config.crawler.hosts.len());
    for host in &config.crawler.hosts {
        println!("  - {}", host);
    }

    println!("\nUser agent: {}", config.user_agent.agent);
    println!("Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, root: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} into {}",
        root,
        config.output.database_path
    );

    let summary = run_crawl(config, root)
        .await
        .with_context(|| format!("Crawl of {} failed", root))?;

    print_crawl_summary(&summary);
    Ok(())
}

/// Handles the --report mode: writes the DOT graph of a run
fn handle_report(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;
    let offset = cli.run_offset.unwrap_or(0);

    let report = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            generate_report(&storage, cli.run, offset, &mut out)?
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            generate_report(&storage, cli.run, offset, &mut out)?
        }
    };

    if !cli.quiet {
        eprint!("{}", format_status_counts(&report));
    }
    Ok(())
}
