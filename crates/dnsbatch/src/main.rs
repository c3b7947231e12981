// # dnsbatch - Device DNS Batch Updater
//
// This binary is a THIN integration layer. Reading the device table,
// building the change batch, resolving the zone, submitting and polling all
// live in dnsbatch-core; the binary only:
// 1. Parses the command line
// 2. Reads settings from environment variables
// 3. Initializes logging and the runtime
// 4. Registers providers and drives the core pipeline
// 5. Prints results and maps failures to exit codes
//
// ## Commands
//
// ```bash
// dnsbatch update devices.csv example.com --send
// dnsbatch update devices.csv example.com --output-file changes.json --print-output
// dnsbatch show-config devices.csv example.com
// ```
//
// ## Configuration
//
// - `DNSBATCH_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
// - `DNSBATCH_POLL_INTERVAL_SECS`: Delay between status queries (default: 1)
// - `DNSBATCH_POLL_TIMEOUT_SECS`: Ceiling for waiting on INSYNC (default: 60)
// - `DNSBATCH_POLL_MAX_ERRORS`: Consecutive failed status queries tolerated (default: 3)
// - `DNSBATCH_AWS_REGION`: Region override for Route 53
// - `DNSBATCH_AWS_PROFILE`: Named AWS profile
//
// AWS credentials are resolved by the AWS default credential chain
// (`AWS_ACCESS_KEY_ID`, `~/.aws/credentials`, SSO, instance roles, ...).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dnsbatch_core::{
    BatchConfig, ChangeBatch, DeviceInventory, DnsBatchConfig, EngineEvent, ProviderConfig,
    ProviderRegistry, SyncConfig, SyncEngine, SyncOutcome, UrlBase,
};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success (a sync timeout still counts as success)
/// - 1: Input or configuration error
/// - 2: Runtime error (zone lookup, submission, status polling)
#[derive(Debug, Clone, Copy)]
enum DnsBatchExitCode {
    Success = 0,
    InputError = 1,
    RuntimeError = 2,
}

impl From<DnsBatchExitCode> for ExitCode {
    fn from(code: DnsBatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Upsert device DNS records from a CSV table into a hosted zone.
#[derive(Parser, Debug)]
#[command(name = "dnsbatch")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the change batch and optionally send it to Route 53.
    #[command(alias = "update-records")]
    Update(UpdateArgs),

    /// List the device table grouped by company. No network access.
    ShowConfig(ShowConfigArgs),
}

#[derive(Args, Debug)]
struct UpdateArgs {
    /// CSV device table with `url` and `ipaddress` columns
    configfile: PathBuf,

    /// Domain suffix for every device, e.g. `example.com`
    urlbase: String,

    /// Send the change batch to Route 53
    #[arg(short, long)]
    send: bool,

    /// Write the change batch to a JSON file
    #[arg(short, long, value_name = "PATH")]
    output_file: Option<PathBuf>,

    /// Print the change batch to the console
    #[arg(short, long)]
    print_output: bool,

    /// Do not wait for the change to become INSYNC
    #[arg(short = 'f', long)]
    skip_check: bool,
}

#[derive(Args, Debug)]
struct ShowConfigArgs {
    /// CSV device table with `Company`, `Gateway` and `url` columns
    configfile: PathBuf,

    /// Domain suffix for every device, e.g. `example.com`
    urlbase: String,
}

/// Settings taken from the environment
struct Settings {
    log_level: String,
    poll_interval_secs: u64,
    poll_timeout_secs: u64,
    poll_max_errors: usize,
    aws_region: Option<String>,
    aws_profile: Option<String>,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: env::var("DNSBATCH_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            poll_interval_secs: parse_env("DNSBATCH_POLL_INTERVAL_SECS", 1)?,
            poll_timeout_secs: parse_env("DNSBATCH_POLL_TIMEOUT_SECS", 60)?,
            poll_max_errors: parse_env("DNSBATCH_POLL_MAX_ERRORS", 3)?,
            aws_region: env::var("DNSBATCH_AWS_REGION").ok().filter(|s| !s.is_empty()),
            aws_profile: env::var("DNSBATCH_AWS_PROFILE").ok().filter(|s| !s.is_empty()),
        })
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if !(1..=60).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "DNSBATCH_POLL_INTERVAL_SECS must be between 1 and 60 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        if !(1..=3600).contains(&self.poll_timeout_secs) {
            anyhow::bail!(
                "DNSBATCH_POLL_TIMEOUT_SECS must be between 1 and 3600 seconds. Got: {}",
                self.poll_timeout_secs
            );
        }

        if self.poll_timeout_secs < self.poll_interval_secs {
            anyhow::bail!(
                "DNSBATCH_POLL_TIMEOUT_SECS ({}) must not be shorter than DNSBATCH_POLL_INTERVAL_SECS ({})",
                self.poll_timeout_secs,
                self.poll_interval_secs
            );
        }

        if self.poll_max_errors > 10 {
            anyhow::bail!(
                "DNSBATCH_POLL_MAX_ERRORS must be between 0 and 10. Got: {}",
                self.poll_max_errors
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSBATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Assemble the run configuration for one `update` invocation
    fn run_config(&self, skip_sync_check: bool) -> DnsBatchConfig {
        DnsBatchConfig {
            provider: ProviderConfig::Route53 {
                region: self.aws_region.clone(),
                profile: self.aws_profile.clone(),
            },
            batch: BatchConfig::default(),
            sync: SyncConfig {
                poll_interval_secs: self.poll_interval_secs,
                poll_timeout_secs: self.poll_timeout_secs,
                max_consecutive_poll_errors: self.poll_max_errors,
                skip_sync_check,
                ..SyncConfig::default()
            },
        }
    }
}

/// Parse a numeric environment variable, falling back to `default` when unset
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer. Got: '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnsBatchExitCode::InputError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnsBatchExitCode::InputError.into();
    }

    let log_level = settings.level().unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsBatchExitCode::InputError.into();
    }

    // Single invocation, strictly sequential pipeline
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsBatchExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Command::Update(args) => run_update(args, &settings).await,
            Command::ShowConfig(args) => run_show_config(args),
        }
    });

    match result {
        Ok(()) => DnsBatchExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            exit_code_for(&e).into()
        }
    }
}

/// Pick the exit code for a failed run
fn exit_code_for(err: &anyhow::Error) -> DnsBatchExitCode {
    match err.downcast_ref::<dnsbatch_core::Error>() {
        Some(core) if core.is_input_error() => DnsBatchExitCode::InputError,
        _ => DnsBatchExitCode::RuntimeError,
    }
}

/// Build the change batch, resolve its zone, and optionally submit it
async fn run_update(args: UpdateArgs, settings: &Settings) -> Result<()> {
    let config = settings.run_config(args.skip_check);
    config.validate()?;

    let url_base = UrlBase::parse(&args.urlbase)?;
    let batch = ChangeBatch::from_csv(&args.configfile, &url_base, &config.batch)?;
    info!(
        "Built {} change(s) from {}",
        batch.len(),
        args.configfile.display()
    );

    let registry = ProviderRegistry::new();
    register_providers(&registry);
    let provider = registry.create_provider(&config.provider).await?;

    let (engine, events) = SyncEngine::new(provider, config.sync)?;
    let progress = tokio::spawn(print_progress(events));

    let zone_id = engine.resolve_zone(&url_base).await?;
    debug!("Using hosted zone {}", zone_id);

    if let Some(ref path) = args.output_file {
        batch.write_json(path)?;
    }

    if args.print_output {
        println!("{}", batch.to_pretty_json()?);
    }

    let outcome = if args.send {
        let change = engine.submit(&zone_id, &batch).await?;
        println!("Changes are currently {}", change.status);
        Some(engine.wait_for_sync(&change).await?)
    } else {
        None
    };

    drop(engine);
    if let Err(e) = progress.await {
        debug!("Progress printer stopped: {}", e);
    }

    if let Some(outcome) = outcome {
        println!("{}", sync_verdict(&outcome));
    }

    Ok(())
}

/// Final line of a sent batch
fn sync_verdict(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::InSync { .. } => "\nChanges are INSYNC".to_string(),
        SyncOutcome::TimedOut { waited, .. } => {
            format!("\nCouldn't get INSYNC within {} seconds", waited.as_secs())
        }
        SyncOutcome::Skipped => "Skipped waiting for INSYNC".to_string(),
    }
}

/// Print the device table grouped by company
fn run_show_config(args: ShowConfigArgs) -> Result<()> {
    let url_base = UrlBase::parse(&args.urlbase)?;
    let inventory = DeviceInventory::from_csv(&args.configfile)?;

    print!("{}", inventory.render(&url_base));
    std::io::stdout().flush()?;
    Ok(())
}

/// Print one dot per pending status query until the engine is dropped
async fn print_progress(events: mpsc::Receiver<EngineEvent>) {
    let mut events = ReceiverStream::new(events);
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        let mark = match event {
            EngineEvent::PollTick { .. } => ".",
            EngineEvent::PollFailed { .. } => "x",
            _ => continue,
        };
        let _ = write!(stdout, "{}", mark);
        let _ = stdout.flush();
    }
}

/// Register every provider compiled into this binary
fn register_providers(registry: &ProviderRegistry) {
    #[cfg(feature = "route53")]
    {
        debug!("Registering Route 53 provider");
        dnsbatch_provider_route53::register(registry);
    }

    #[cfg(not(feature = "route53"))]
    {
        let _ = registry;
        tracing::warn!("No DNS provider compiled in; enable the `route53` feature");
    }
}
