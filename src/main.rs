use std::path::PathBuf;

use anyhow::bail;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error, info};

use version_monitor::config::MonitorConfig;
use version_monitor::logging::{self, LogFormat};
use version_monitor::monitor::{Signal, VersionMonitor};
use version_monitor::version::assets::{DEFAULT_DOWNLOAD_BASE_URL, PlatformGroup, group_by_platform};
use version_monitor::version::semver::{compare_strict, compare_versions};
use version_monitor::version::sources::HttpVersionSource;
use version_monitor::version::store::{FileVersionStore, LocalState, VersionStore};
use version_monitor::version::types::VersionRecord;

#[derive(Parser)]
#[command(name = "version-monitor")]
#[command(version, about = "Detects new releases in a published version index")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Compare the remote index with the local snapshot and refresh it when the release moved (default)
    Check(CheckArgs),
    /// Compare two versions and print -1, 0 or 1
    Compare {
        a: String,
        b: String,
        /// Use public semver precedence instead of the release ordering
        #[arg(long)]
        strict: bool,
    },
    /// List the versions of the local snapshot, newest first
    List {
        #[arg(long)]
        index_file: Option<PathBuf>,
        /// Show only this version
        #[arg(long)]
        version: Option<String>,
        /// Include downloads grouped by platform
        #[arg(long)]
        assets: bool,
        #[arg(long, default_value = DEFAULT_DOWNLOAD_BASE_URL)]
        base_url: String,
        #[arg(long)]
        json: bool,
    },
    /// Copy the local snapshot to another path
    Mirror {
        target: PathBuf,
        #[arg(long)]
        index_file: Option<PathBuf>,
    },
}

#[derive(Args, Default)]
struct CheckArgs {
    #[arg(long)]
    source_url: Option<String>,
    #[arg(long)]
    index_file: Option<PathBuf>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    max_retries: Option<u32>,
    /// Print the signal as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl CheckArgs {
    fn apply(&self, config: &mut MonitorConfig) {
        if let Some(url) = &self.source_url {
            config.source_url = url.clone();
        }
        if let Some(path) = &self.index_file {
            config.index_path = path.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout = std::time::Duration::from_millis(ms);
        }
        if let Some(n) = self.max_retries {
            config.max_attempts = n.max(1);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListedVersion<'a> {
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    platforms: Option<Vec<PlatformGroup>>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = std::env::var_os("VERSION_MONITOR_LOG_FILE").map(PathBuf::from);
    let _guard = logging::init(cli.verbose, cli.log_format, log_file.as_deref())?;

    let mut config = MonitorConfig::from_env();

    match cli.command.unwrap_or(Command::Check(CheckArgs::default())) {
        Command::Check(args) => {
            args.apply(&mut config);
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(check(config, args.json))
        }
        Command::Compare { a, b, strict } => {
            let ordering = if strict {
                match compare_strict(&a, &b) {
                    Some(ordering) => ordering,
                    None => bail!("Not a valid semver: {} / {}", a, b),
                }
            } else {
                compare_versions(&a, &b)
            };
            println!("{}", ordering as i8);
            Ok(())
        }
        Command::List {
            index_file,
            version,
            assets,
            base_url,
            json,
        } => list(
            index_file.unwrap_or(config.index_path),
            version.as_deref(),
            assets,
            &base_url,
            json,
        ),
        Command::Mirror { target, index_file } => {
            FileVersionStore::new(index_file.unwrap_or(config.index_path)).mirror_to(&target)?;
            Ok(())
        }
    }
}

async fn check(config: MonitorConfig, json: bool) -> anyhow::Result<()> {
    info!("Starting version monitor...");
    debug!("Configuration: {:?}", config);

    let source = HttpVersionSource::new(
        &config.source_url,
        config.request_timeout,
        config.retry_policy(),
    )?;
    let store = FileVersionStore::new(&config.index_path);
    let mut monitor = VersionMonitor::new(source, store).with_mirrors(config.mirror_paths.clone());

    let outcome = monitor
        .run()
        .await
        .inspect_err(|e| error!("Version monitor failed: {}", e))?;

    let signal = Signal::new(&outcome, &config.source_url, Utc::now());
    if let Some(path) = &config.output_file {
        signal.append_to(path)?;
    }

    if json {
        println!("{}", serde_json::to_string(&signal)?);
    } else if outcome.update_needed {
        println!(
            "update needed: {} -> {}",
            outcome.previous_version.as_deref().unwrap_or("(none)"),
            outcome.version
        );
    } else {
        println!("unchanged: {}", outcome.version);
    }

    info!("Version monitor completed");
    Ok(())
}

fn list(
    index_path: PathBuf,
    version: Option<&str>,
    assets: bool,
    base_url: &str,
    json: bool,
) -> anyhow::Result<()> {
    let index = match FileVersionStore::new(index_path).load() {
        LocalState::Present(index) => index,
        LocalState::Empty if version.is_some() => bail!("No local version index"),
        LocalState::Empty => {
            if json {
                println!("[]");
            }
            return Ok(());
        }
    };

    let records: Vec<&VersionRecord> = match version {
        Some(version) => match index.find(version) {
            Some(record) => vec![record],
            None => bail!("Version {} is not in the local index", version),
        },
        None => index.versions.iter().collect(),
    };
    let latest = index.latest().map(|r| r.version.as_str());

    let listed: Vec<ListedVersion> = records
        .into_iter()
        .map(|record| ListedVersion {
            version: &record.version,
            platforms: assets.then(|| group_by_platform(&record.assets, base_url)),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if let Some(updated_at) = index.updated_at_utc() {
        println!("updated at {}", updated_at.to_rfc3339());
    }
    for entry in &listed {
        let marker = if Some(entry.version) == latest { " (latest)" } else { "" };
        println!("{}{}", entry.version, marker);
        for group in entry.platforms.iter().flatten() {
            println!("  {}", group.platform);
            let recommended = group.recommended();
            for download in &group.downloads {
                let marker = if Some(download) == recommended { " (recommended)" } else { "" };
                println!(
                    "    {} [{}] {} {}{}",
                    download.filename,
                    download.asset_type.label(),
                    download.size,
                    download.url,
                    marker
                );
            }
        }
    }
    Ok(())
}
