use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use stashboard::app;
use stashboard::config::{default_config_path, ResolvedConfig};
use stashboard::format::CurrencyFormat;
use stashboard::market_data::{run_query, PriceQuery};
use stashboard::models::{HoldingKind, NewHolding};
use stashboard::portfolio::PortfolioService;
use stashboard::refresh::RefreshController;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "stashboard")]
#[command(about = "Local-first portfolio dashboard")]
struct Cli {
    /// Path to config file (defaults to ./stashboard.toml, then the user data dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,
    /// List stored holdings
    List,
    /// Add a holding
    Add {
        /// crypto, equity, commodity, real_estate or other
        #[arg(long)]
        kind: HoldingKind,
        /// Vendor symbol (required for crypto, equity and commodity)
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        quantity: f64,
        #[arg(long)]
        purchase_value: Option<f64>,
        #[arg(long)]
        manual_value: Option<f64>,
    },
    /// Remove a holding by id
    Remove { id: String },
    /// Refresh prices once and print the valuation
    Value {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Keep prices fresh and reprint the valuation whenever it changes
    Watch,
    /// Fetch prices for comma-separated id lists and print the query response
    Query {
        #[arg(long)]
        crypto: Option<String>,
        #[arg(long)]
        equity: Option<String>,
        #[arg(long)]
        commodity: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command {
        Command::Config => print_json(&app::config_output(&config_path, &config))?,
        Command::List => {
            let store = app::open_store(&config);
            print_json(&app::list_holdings(&store).await?)?;
        }
        Command::Add {
            kind,
            id,
            name,
            ticker,
            quantity,
            purchase_value,
            manual_value,
        } => {
            let mut holding = NewHolding::new(kind, name).with_quantity(quantity);
            if let Some(id) = id {
                holding = holding.with_id(id);
            }
            if let Some(ticker) = ticker {
                holding = holding.with_ticker_label(ticker);
            }
            if let Some(value) = purchase_value {
                holding = holding.with_purchase_value(value);
            }
            if let Some(value) = manual_value {
                holding = holding.with_manual_value(value);
            }
            let store = app::open_store(&config);
            print_json(&app::add_holding(&store, holding).await?)?;
        }
        Command::Remove { id } => {
            let store = app::open_store(&config);
            print_json(&app::remove_holding(&store, &id).await?)?;
        }
        Command::Value { json } => {
            let output = app::value_portfolio(&config).await?;
            if json {
                print_json(&output)?;
            } else {
                print!("{}", app::render_value_table(&output));
            }
        }
        Command::Watch => watch(&config).await?,
        Command::Query {
            crypto,
            equity,
            commodity,
        } => {
            let query = PriceQuery {
                crypto,
                equity,
                commodity,
            };
            let response = run_query(&app::build_aggregator(&config), &query).await;
            print_json(&response)?;
            if !response.is_success() {
                bail!("price query failed");
            }
        }
    }

    Ok(())
}

async fn watch(config: &ResolvedConfig) -> Result<()> {
    let store = Arc::new(app::open_store(config));
    let service = PortfolioService::open(store)
        .await
        .context("Failed to load holdings")?;
    let controller = RefreshController::new(app::build_aggregator(config));
    let handle = controller.spawn(service.subscribe());
    let mut views = handle.views();
    let format = CurrencyFormat::from_display(&config.display);

    let mut poll = tokio::time::interval(config.refresh.poll_interval);
    poll.tick().await;
    info!(
        poll_interval_secs = config.refresh.poll_interval.as_secs(),
        "watching holdings"
    );

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if view.refreshing {
                    continue;
                }
                let output = app::value_output(&view, &format, &config.reporting_currency);
                println!("{}", app::render_value_table(&output));
            }
            _ = poll.tick() => {
                match service.reload().await {
                    Ok(true) => info!("holdings changed on disk"),
                    Ok(false) => {}
                    Err(err) => warn!(error = %err, "failed to reload holdings"),
                }
                handle.request_reprice();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(service);
    handle.join().await;
    Ok(())
}
