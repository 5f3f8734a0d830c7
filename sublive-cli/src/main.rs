mod display;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use sublive_core::config::{DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};
use sublive_core::output::{default_output_path, get_formatter};
use sublive_core::{
    BatchCoordinator, OutputFormat, RetryPolicy, ScanConfig, StatusCodeSet, SurvivorOrder,
    SurvivorWriter, TlsMode,
};
use tracing_subscriber::EnvFilter;

use crate::display::{clear_active_bar, set_active_bar, BarProgress, ProgressWriterFactory};

#[derive(Parser)]
#[command(name = "sublive")]
#[command(about = "Find which subdomains in a list answer over HTTP")]
#[command(version)]
struct Cli {
    /// File containing hostnames: one per line, # for comments
    #[arg(short, long, default_value = "subdomains.txt")]
    input: PathBuf,

    /// Survivor list path (default: result_<YYYY-MM-DD_HH-MM>.txt in --output-dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the default timestamped survivor list
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Maximum simultaneously open connections
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-attempt timeout in seconds
    #[arg(short, long, default_value_t = 10.0)]
    timeout: f64,

    /// Total attempts per hostname
    #[arg(short, long, default_value_t = 3)]
    retries: usize,

    /// Delay before the first retry in milliseconds, doubling after each retry
    #[arg(long, default_value_t = 0)]
    retry_delay: u64,

    /// Status codes that count as alive, e.g. "200,403,404,500" or "200-599"
    #[arg(long, default_value = "200-599")]
    alive_codes: StatusCodeSet,

    /// Verify TLS certificates (off by default so self-signed hosts still count)
    #[arg(long)]
    verify_tls: bool,

    /// Redirects to follow before giving up on a host
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
    max_redirects: usize,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Survivor order (completion or input)
    #[arg(long, default_value = "completion")]
    order: SurvivorOrder,

    /// Output format (human or json)
    #[arg(short, long, default_value = "human")]
    format: OutputFormat,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn scan_config(&self) -> anyhow::Result<ScanConfig> {
        let timeout = Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("Invalid timeout: {}", self.timeout))?;

        let retry = RetryPolicy::new()
            .with_max_attempts(self.retries)
            .with_initial_delay(Duration::from_millis(self.retry_delay))
            .with_jitter(self.retry_delay > 0);

        let config = ScanConfig::new()
            .with_concurrency(self.concurrency)
            .with_timeout(timeout)
            .with_alive_codes(self.alive_codes.clone())
            .with_retry(retry)
            .with_tls(if self.verify_tls {
                TlsMode::Verify
            } else {
                TlsMode::AcceptInvalid
            })
            .with_order(self.order)
            .with_max_redirects(self.max_redirects)
            .with_user_agent(self.user_agent.as_str());

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(ProgressWriterFactory)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".bright_red(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let human = cli.format == OutputFormat::Human;

    let config = cli.scan_config()?;

    let hostnames = sublive_core::load_hostnames(&cli.input)
        .with_context(|| format!("Failed to read hostnames from {}", cli.input.display()))?;

    let coordinator = BatchCoordinator::new(config).context("Failed to set up HTTP client")?;
    let session = coordinator.start(hostnames);
    let total = session.total();

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.output_dir, session.started_at()));
    let writer = SurvivorWriter::create(&output_path).context("Failed to create output file")?;

    if human {
        println!(
            "Starting scan of {} subdomains...",
            total.to_string().bright_green()
        );
    }

    let progress = BarProgress::new(total, human);
    set_active_bar(progress.bar().clone());

    let report = coordinator.run(session, &progress).await;

    progress.finish();
    clear_active_bar();

    let output_path = writer
        .write(&report.survivors)
        .context("Failed to write survivors")?;

    if human {
        println!("\n");
    }
    let formatter = get_formatter(cli.format);
    println!("{}", formatter.format_report(&report, &output_path)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scan_config() {
        let cli = Cli::parse_from(["sublive"]);
        let config = cli.scan_config().unwrap();

        assert_eq!(cli.input, PathBuf::from("subdomains.txt"));
        assert_eq!(config.concurrency, 250);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay, Duration::ZERO);
        assert_eq!(config.tls, TlsMode::AcceptInvalid);
        assert_eq!(config.alive_codes, StatusCodeSet::default());
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(cli.format, OutputFormat::Human);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "sublive",
            "-i",
            "hosts.txt",
            "-c",
            "50",
            "-t",
            "2.5",
            "-r",
            "1",
            "--alive-codes",
            "200,404",
            "--verify-tls",
            "--order",
            "input",
            "--user-agent",
            "recon/1.0",
            "--format",
            "json",
        ]);
        let config = cli.scan_config().unwrap();

        assert_eq!(config.concurrency, 50);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.retry.max_attempts, 1);
        assert!(config.alive_codes.contains(404));
        assert!(!config.alive_codes.contains(500));
        assert_eq!(config.tls, TlsMode::Verify);
        assert_eq!(config.order, SurvivorOrder::Input);
        assert_eq!(config.user_agent, "recon/1.0");
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["sublive", "--alive-codes", "abc"]).is_err());
        assert!(Cli::try_parse_from(["sublive", "--format", "xml"]).is_err());
        assert!(Cli::try_parse_from(["sublive", "--order", "random"]).is_err());
        assert!(Cli::parse_from(["sublive", "-c", "0"]).scan_config().is_err());
        assert!(Cli::parse_from(["sublive", "--timeout=-1"]).scan_config().is_err());
    }
}
