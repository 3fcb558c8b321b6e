//! CUSUM Console - operator CLI for the defect warning service
//!
//! # Usage
//!
//! ```bash
//! # List the configuration set, filtered
//! cusum-console configs list --product proda --station st-0
//!
//! # Inspect one entry's effective parameters
//! cusum-console configs show "proda::l1::st7::width"
//!
//! # Provision a batch of items under a mandatory context
//! cusum-console import --file items.csv --product proda --line l1 --station st7
//!
//! # Search detection history for one item in a full context
//! cusum-console history --item width --product proda --line l1 --station st7 \
//!     --start 2026-08-01 --end 2026-08-05
//! ```
//!
//! # Environment Variables
//!
//! - `CUSUM_CONSOLE_CONFIG`: Path to a console.toml (default: ./console.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use cusum_console::history::{detail_window, recent_alerts, ChartSeries, HistoryQuery};
use cusum_console::provisioning::{BatchContext, BatchOverrides};
use cusum_console::threshold::{decision_threshold, display_threshold, reference_k};
use cusum_console::types::{EffectiveConfig, GlobalDefaults, MonitoringSide};
use cusum_console::{filter_entries, resolve_identity, ApiClient, ApiError, ConfigFilter, ConsoleConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "cusum-console")]
#[command(about = "Operations console for the CUSUM defect warning service")]
#[command(version)]
struct CliArgs {
    /// Override the backend base URL from console.toml
    #[arg(long, value_name = "URL")]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check backend health
    Health,

    /// Manage per-item monitoring configuration
    #[command(subcommand)]
    Configs(ConfigsCommand),

    /// Show or update the library-wide default policy
    #[command(subcommand)]
    Global(GlobalCommand),

    /// Batch-provision items under a mandatory product/line/station context
    Import(ImportArgs),

    /// Search detection history and show shaped series + recent alerts
    History(HistoryArgs),

    /// Fetch ±48h of context around one record timestamp
    Drilldown(DrilldownArgs),

    /// Show context-filtered dropdown options
    Options(ContextArgs),
}

#[derive(Subcommand, Debug)]
enum ConfigsCommand {
    /// List entries, optionally filtered by identity substrings
    List {
        #[arg(long, default_value = "")]
        item: String,
        #[arg(long, default_value = "")]
        product: String,
        #[arg(long, default_value = "")]
        station: String,
        #[arg(long, default_value = "")]
        line: String,
    },
    /// Show one entry's effective (merged) parameters
    Show { key: String },
    /// Update one entry; unspecified fields keep their merged values
    Set {
        key: String,
        #[arg(long)]
        shift: Option<f64>,
        #[arg(long)]
        arl0: Option<f64>,
        #[arg(long)]
        cooldown: Option<u32>,
        #[arg(long, value_parser = parse_side)]
        side: Option<MonitoringSide>,
        #[arg(long)]
        mu0: Option<f64>,
        #[arg(long)]
        base_uph: Option<f64>,
        #[arg(long)]
        penalty: Option<f64>,
    },
    /// Delete one entry (irreversible)
    Delete {
        key: String,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Delete several entries in one call (irreversible)
    BatchDelete {
        /// Entry key; repeat for each entry
        #[arg(long = "key", required = true)]
        keys: Vec<String>,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum GlobalCommand {
    Show,
    /// Save the default policy; the backend broadcasts it to the live
    /// detection pipeline
    Set {
        #[arg(long)]
        shift: Option<f64>,
        #[arg(long)]
        arl0: Option<f64>,
        #[arg(long)]
        cooldown: Option<u32>,
        #[arg(long)]
        enable_cooldown: Option<bool>,
        #[arg(long, value_parser = parse_side)]
        side: Option<MonitoringSide>,
        #[arg(long)]
        mu0: Option<f64>,
        #[arg(long)]
        base_uph: Option<f64>,
        #[arg(long)]
        penalty: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// File with one item token per line (first comma/tab field is used);
    /// omit to read from stdin
    #[arg(long)]
    file: Option<std::path::PathBuf>,

    #[arg(long)]
    product: String,
    #[arg(long)]
    line: String,
    #[arg(long)]
    station: String,

    /// Attach per-batch config overrides instead of library defaults
    #[arg(long)]
    with_overrides: bool,
    #[arg(long, requires = "with_overrides")]
    shift: Option<f64>,
    #[arg(long, requires = "with_overrides")]
    arl0: Option<f64>,
    #[arg(long, requires = "with_overrides")]
    cooldown: Option<u32>,
    #[arg(long, requires = "with_overrides", value_parser = parse_side)]
    side: Option<MonitoringSide>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(long)]
    item: String,
    #[arg(long)]
    product: String,
    #[arg(long)]
    line: String,
    #[arg(long)]
    station: String,
    /// Local date (YYYY-MM-DD), widened to the start of the day
    #[arg(long)]
    start: Option<String>,
    /// Local date (YYYY-MM-DD), widened to the end of the day
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Args, Debug)]
struct DrilldownArgs {
    #[arg(long)]
    item: String,
    /// Record timestamp at the center of the window (ISO-8601)
    #[arg(long)]
    timestamp: String,
}

#[derive(Args, Debug)]
struct ContextArgs {
    #[arg(long)]
    item: Option<String>,
    #[arg(long)]
    product: Option<String>,
    #[arg(long)]
    line: Option<String>,
    #[arg(long)]
    station: Option<String>,
}

fn parse_side(raw: &str) -> Result<MonitoringSide, String> {
    MonitoringSide::parse(raw).ok_or_else(|| format!("invalid monitoring side '{raw}' (upper|lower)"))
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let console_config = ConsoleConfig::load();
    let base_url = args
        .backend
        .unwrap_or_else(|| console_config.backend.base_url.clone());
    let client = ApiClient::new(&base_url).context("failed to build backend client")?;
    info!(backend = %client.base_url(), "console ready");

    let outcome = run(&client, &console_config, args.command).await;
    if let Err(e) = &outcome {
        // Transport failures get a generic notice; everything else is
        // surfaced as-is (backend detail verbatim, validation verbatim).
        if let Some(ApiError::Http(source)) = e.downcast_ref::<ApiError>() {
            error!(error = %source, "transport failure");
            bail!("network error — the backend could not be reached");
        }
    }
    outcome
}

#[allow(clippy::too_many_lines)]
async fn run(client: &ApiClient, console_config: &ConsoleConfig, command: Command) -> Result<()> {
    match command {
        Command::Health => {
            let health = client.health().await?;
            println!("{} ({})", health.status, health.timestamp);
        }

        Command::Configs(command) => run_configs(client, command).await?,
        Command::Global(command) => run_global(client, command).await?,

        Command::Import(args) => {
            let raw_text = match &args.file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let context = BatchContext {
                product: args.product,
                line: args.line,
                station: args.station,
            };
            let overrides = if args.with_overrides {
                // Pre-populate from the current global policy, then apply
                // whatever the operator set explicitly.
                let snapshot = client.fetch_configs().await?;
                let mut overrides = BatchOverrides::from_defaults(&snapshot.global_defaults);
                overrides.target_shift_sigma = args.shift.or(overrides.target_shift_sigma);
                overrides.target_arl0 = args.arl0.or(overrides.target_arl0);
                overrides.cooldown_periods = args.cooldown.or(overrides.cooldown_periods);
                overrides.monitoring_side = args.side.or(overrides.monitoring_side);
                Some(overrides)
            } else {
                None
            };
            let request =
                cusum_console::build_import_request(&raw_text, &context, overrides)?;
            let response = client.batch_import(&request).await?;
            println!("{} (requested: {})", response.message, response.total_requested);
        }

        Command::History(args) => {
            let query = HistoryQuery {
                item_name: Some(args.item),
                product: Some(args.product),
                line: Some(args.line),
                station: Some(args.station),
                start_time: args.start,
                end_time: args.end,
                limit: Some(args.limit.unwrap_or(console_config.history.fetch_limit)),
            };
            // Strict context check happens before any network call.
            query.validate_context()?;
            let records = client.fetch_history(&query).await?;
            let series = ChartSeries::from_records(&records);
            println!("{} samples", series.len());

            let alerts = recent_alerts(&records, console_config.history.alert_table_cap);
            println!("{} recent alerts (newest first):", alerts.len());
            for record in alerts {
                println!(
                    "  {}  {}  value={:.4}  s_plus={:.4}  h={}  side={}",
                    record.timestamp,
                    record.item_name,
                    record.value,
                    record.s_plus,
                    display_threshold(Some(record.h_value)),
                    record.alert_side.as_deref().unwrap_or("-"),
                );
            }
        }

        Command::Drilldown(args) => {
            let Some(window) = detail_window(&args.timestamp, console_config.history.detail_window_hours)
            else {
                bail!("unparseable record timestamp '{}'", args.timestamp);
            };
            let query = HistoryQuery {
                item_name: Some(args.item),
                start_time: Some(window.start_time.clone()),
                end_time: Some(window.end_time.clone()),
                ..HistoryQuery::default()
            };
            let records = client.fetch_history(&query).await?;
            let series = ChartSeries::from_records(&records);
            println!(
                "{} samples in [{} .. {}]",
                series.len(),
                window.start_time,
                window.end_time
            );
            println!("{}", serde_json::to_string_pretty(&series)?);
        }

        Command::Options(args) => {
            let query = HistoryQuery {
                item_name: args.item,
                product: args.product,
                line: args.line,
                station: args.station,
                ..HistoryQuery::default()
            };
            let options = client.fetch_options(&query).await?;
            println!("items:    {}", options.items.join(", "));
            println!("stations: {}", options.stations.join(", "));
            println!("products: {}", options.products.join(", "));
            println!("lines:    {}", options.lines.join(", "));
        }
    }
    Ok(())
}

async fn run_configs(client: &ApiClient, command: ConfigsCommand) -> Result<()> {
    match command {
        ConfigsCommand::List {
            item,
            product,
            station,
            line,
        } => {
            let snapshot = client.fetch_configs().await?;
            let filter = ConfigFilter {
                item,
                product,
                station,
                line,
            };
            let entries = filter_entries(&snapshot.item_configs, &filter);
            println!(
                "{:<12} {:<8} {:<10} {:<24} {:>10} {:>8}",
                "PRODUCT", "LINE", "STATION", "ITEM", "h", "SIDE"
            );
            for entry in &entries {
                let merged = EffectiveConfig::resolve(entry.config, &snapshot.global_defaults);
                let display = entry.identity.display();
                println!(
                    "{:<12} {:<8} {:<10} {:<24} {:>10} {:>8}",
                    display.product,
                    display.line,
                    display.station,
                    display.item_name,
                    display_threshold(merged.decision_threshold()),
                    merged.monitoring_side,
                );
            }
            println!("{} of {} entries", entries.len(), snapshot.item_configs.len());
        }

        ConfigsCommand::Show { key } => {
            let snapshot = client.fetch_configs().await?;
            let Some(entry) = snapshot.item_configs.get(&key) else {
                bail!("no config entry for key '{key}'");
            };
            let identity = resolve_identity(&key, entry);
            let merged = EffectiveConfig::resolve(entry, &snapshot.global_defaults);
            println!("{}", serde_json::to_string_pretty(&identity)?);
            println!("{}", serde_json::to_string_pretty(&merged)?);
            println!(
                "h = {}  k = {}",
                display_threshold(merged.decision_threshold()),
                display_threshold(reference_k(merged.target_shift_sigma)),
            );
        }

        ConfigsCommand::Set {
            key,
            shift,
            arl0,
            cooldown,
            side,
            mu0,
            base_uph,
            penalty,
        } => {
            let snapshot = client.fetch_configs().await?;
            let Some(entry) = snapshot.item_configs.get(&key) else {
                bail!("no config entry for key '{key}'");
            };
            let mut merged = EffectiveConfig::resolve(entry, &snapshot.global_defaults);
            merged.target_shift_sigma = shift.or(merged.target_shift_sigma);
            merged.target_arl0 = arl0.or(merged.target_arl0);
            merged.cooldown_periods = cooldown.or(merged.cooldown_periods);
            if let Some(side) = side {
                merged.monitoring_side = side;
            }
            merged.mu0 = mu0.or(merged.mu0);
            if let Some(base_uph) = base_uph {
                merged.base_uph = base_uph;
            }
            if let Some(penalty) = penalty {
                merged.penalty_strength = penalty;
            }
            let response = client.save_item_config(&key, &merged).await?;
            println!(
                "{} (h = {})",
                response.message,
                display_threshold(decision_threshold(merged.target_shift_sigma, merged.target_arl0)),
            );
        }

        ConfigsCommand::Delete { key, yes } => {
            if !yes {
                bail!("deletion is irreversible; pass --yes to confirm deleting '{key}'");
            }
            let response = client.delete_item_config(&key).await?;
            println!("{}", response.message);
        }

        ConfigsCommand::BatchDelete { keys, yes } => {
            if !yes {
                bail!(
                    "deletion is irreversible; pass --yes to confirm deleting {} entries",
                    keys.len()
                );
            }
            let response = client.batch_delete(&keys).await?;
            println!("{} (deleted: {})", response.message, response.deleted_count);
            for error in &response.errors {
                println!("  failed: {error}");
            }
        }
    }
    Ok(())
}

async fn run_global(client: &ApiClient, command: GlobalCommand) -> Result<()> {
    match command {
        GlobalCommand::Show => {
            let snapshot = client.fetch_configs().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot.global_defaults)?);
            println!(
                "h = {}",
                display_threshold(decision_threshold(
                    snapshot.global_defaults.target_shift_sigma,
                    snapshot.global_defaults.target_arl0,
                )),
            );
        }

        GlobalCommand::Set {
            shift,
            arl0,
            cooldown,
            enable_cooldown,
            side,
            mu0,
            base_uph,
            penalty,
        } => {
            // Partial update: unset flags are omitted from the body and the
            // backend keeps their current values.
            let defaults = GlobalDefaults {
                target_shift_sigma: shift,
                target_arl0: arl0,
                cooldown_periods: cooldown,
                enable_cooldown,
                monitoring_side: side,
                mu0,
                base_uph,
                penalty_strength: penalty,
            };
            let response = client.save_global_defaults(&defaults).await?;
            println!("{}", response.message);
            if let Some(current) = response.current_global {
                println!("{}", serde_json::to_string_pretty(&current)?);
            }
        }
    }
    Ok(())
}
