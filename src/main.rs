//! Paper-trading desk CLI.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use paperdesk::api::{BackendClient, Broker, DEFAULT_API_URL};
use paperdesk::ledger::LedgerConfig;
use paperdesk::models::{OrderRequest, OrderResult};
use paperdesk::session::{SessionConfig, SubmitOutcome, TradingSession};

/// Paper-trading budget ledger CLI.
#[derive(Parser)]
#[command(name = "paperdesk")]
#[command(about = "Paper-trade insider signals against a fixed virtual budget", long_about = None)]
struct Cli {
    /// Dashboard backend base URL
    #[arg(long, env = "PAPERDESK_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Virtual budget in dollars
    #[arg(short, long, env = "PAPERDESK_BUDGET", default_value = "100")]
    budget: Decimal,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show budget, spend, P&L and open positions
    Status,

    /// Buy shares (blocked once the budget is used up)
    Buy {
        /// Ticker symbol
        symbol: String,

        /// Number of shares (fractional allowed)
        qty: String,
    },

    /// Sell shares
    Sell {
        /// Ticker symbol
        symbol: String,

        /// Number of shares (fractional allowed)
        qty: String,
    },

    /// List insider-buy signals and what the remaining budget buys
    Signals {
        /// Maximum number of signals to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// List the symbols scanned for insider activity
    Watchlist,

    /// List recent orders
    Orders,

    /// Show broker account figures
    Account,

    /// Check that the backend is reachable and configured
    Health,

    /// Poll positions and print the ledger until Ctrl+C
    Watch {
        /// Polling interval in seconds (default 30)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SessionConfig {
        api_url: cli.api_url.clone(),
        timeout: Duration::from_secs(cli.timeout),
        ledger: LedgerConfig::with_budget(cli.budget),
        ..Default::default()
    };
    config.ledger.validate()?;

    let client = BackendClient::with_base_url(config.api_url.clone(), config.timeout)?;

    match cli.command {
        Commands::Status => {
            let mut session = TradingSession::new(client, config.ledger.clone());
            if let Err(e) = session.refresh().await {
                println!("{}. Showing an empty portfolio.", e);
            }
            print_ledger(&session);
            print_positions(&session);
        }

        Commands::Buy { symbol, qty } => {
            if !trade(client, &config, &symbol, &qty, "buy").await {
                std::process::exit(1);
            }
        }

        Commands::Sell { symbol, qty } => {
            if !trade(client, &config, &symbol, &qty, "sell").await {
                std::process::exit(1);
            }
        }

        Commands::Signals { limit } => {
            let signals = client.get_insider_trades().await?;

            if signals.is_empty() {
                println!("No insider buying found on the watchlist.");
                return Ok(());
            }

            let mut session = TradingSession::new(client, config.ledger.clone());
            if let Err(e) = session.refresh().await {
                println!("{}. Sizing against the full budget.", e);
            }
            let remaining = session.summary().remaining;

            println!("\n=== Insider Buying ({} signals) ===", signals.len());
            println!(
                "{:<6} {:<20} {:<10} {:>10} {:>10} {:>14} {:>10}",
                "SYMBOL", "INSIDER", "DATE", "SHARES", "PRICE", "COST", "YOUR QTY"
            );
            println!("{}", "-".repeat(86));

            for signal in signals.iter().take(limit) {
                println!(
                    "{:<6} {:<20} {:<10} {:>10} {:>10.2} {:>14.2} {:>10}",
                    signal.symbol,
                    truncate(&signal.insider, 20),
                    truncate(&signal.date, 10),
                    signal.shares.normalize(),
                    signal.price,
                    signal.cost,
                    signal.shares_for(remaining).normalize()
                );
            }

            if signals.len() > limit {
                println!("... and {} more", signals.len() - limit);
            }
            println!("\nYOUR QTY: shares ${:.2} remaining buys at the insider's price", remaining);
        }

        Commands::Watchlist => {
            let watchlist = client.get_watchlist().await?;

            println!("\n=== Watchlist ({} symbols) ===", watchlist.len());
            for symbol in &watchlist {
                println!("  {}", symbol);
            }
        }

        Commands::Orders => {
            let orders = client.get_orders().await?;

            if orders.is_empty() {
                println!("No orders yet.");
                return Ok(());
            }

            println!(
                "\n{:<14} {:<8} {:<5} {:>10} {:<8} {:<12} {:<17}",
                "ID", "SYMBOL", "SIDE", "QTY", "TYPE", "STATUS", "CREATED"
            );
            println!("{}", "-".repeat(80));

            let filled = orders.iter().filter(|o| o.is_filled()).count();
            let total = orders.len();

            for order in orders {
                println!(
                    "{:<14} {:<8} {:<5} {:>10} {:<8} {:<12} {:<17}",
                    truncate(&order.id, 14),
                    order.symbol,
                    order.side.map(|s| s.as_str()).unwrap_or("?"),
                    order.quantity.map(|q| q.normalize().to_string()).unwrap_or_default(),
                    order.order_type,
                    order.status,
                    order
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default()
                );
            }

            println!("\n{} of {} orders filled", filled, total);
        }

        Commands::Account => {
            let account = client.get_account().await?;

            println!("\n=== Broker Account ===");
            println!("Status:          {}", account.status);
            println!("Buying Power:    ${:.2}", account.buying_power);
            println!("Cash:            ${:.2}", account.cash);
            println!("Portfolio Value: ${:.2}", account.portfolio_value);
            println!("Equity:          ${:.2}", account.equity);
        }

        Commands::Health => {
            let health = client.get_health().await?;

            println!("Backend:          {}", client.base_url());
            println!(
                "Data API Key:     {}",
                if health.api_configured { "Configured" } else { "Missing" }
            );
            println!("Watchlist Size:   {}", health.watchlist_count);
        }

        Commands::Watch { interval } => {
            let interval = interval.unwrap_or(config.poll_interval_secs);
            info!(interval = interval, budget = %config.ledger.budget, "Watching portfolio");

            let mut session = TradingSession::new(client, config.ledger.clone());
            let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));

            println!("\n=== Watching ${} Budget ===", config.ledger.budget.normalize());
            println!("Polling interval: {}s", interval);
            println!("Press Ctrl+C to stop.\n");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        println!("\nStopping.");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = session.refresh().await {
                            println!("{}", e);
                        }

                        let summary = session.summary();
                        let status = session.status();
                        let sign = if summary.profit_loss >= Decimal::ZERO { "+" } else { "" };
                        println!(
                            "[{}] Spent: ${:.2} | Remaining: ${:.2} | Value: ${:.2} | P&L: {}${:.2} | {}",
                            chrono::Local::now().format("%H:%M:%S"),
                            summary.spent,
                            summary.remaining,
                            summary.current_value,
                            sign,
                            summary.profit_loss,
                            status
                        );
                        if let Some(warning) = status.warning(summary.remaining) {
                            println!("  {}", warning);
                        }
                    }
                }
            }

            let failures = session.stats().refresh_failures;
            if failures > 0 {
                println!("Refresh failures: {}", failures);
            }
        }

        Commands::Config => {
            let ledger = &config.ledger;

            println!("\n=== Paper Trading Configuration ===\n");
            println!("Backend:");
            println!("  API URL:              {}", config.api_url);
            println!("  Request Timeout:      {}s", config.timeout.as_secs());
            println!("  Watch Interval:       {}s", config.poll_interval_secs);

            println!("\nBudget:");
            println!("  Virtual Budget:       ${}", ledger.budget.normalize());
            println!(
                "  Low Budget Warning:   under ${:.2} ({}%)",
                ledger.low_budget_threshold(),
                (ledger.low_budget_fraction * dec!(100)).normalize()
            );
        }
    }

    Ok(())
}

/// Admit, submit and report one order. Returns whether the broker accepted it.
async fn trade(
    client: BackendClient,
    config: &SessionConfig,
    symbol: &str,
    qty: &str,
    side: &str,
) -> bool {
    let order = match OrderRequest::from_input(symbol, qty, side) {
        Ok(order) => order,
        Err(reason) => {
            println!("{}", OrderResult::failed(reason.to_string()));
            return false;
        }
    };

    let mut session = TradingSession::new(client, config.ledger.clone());
    if let Err(e) = session.refresh().await {
        println!("{}. Checking the order against an empty portfolio.", e);
    }

    let outcome = session.submit(order).await;
    let refreshed = matches!(outcome, SubmitOutcome::Accepted { refreshed: true, .. });
    let accepted = outcome.is_success();

    println!("{}", outcome.into_result());

    if accepted && !refreshed {
        println!("Order went through but the portfolio could not be reloaded.");
    }
    println!();
    print_ledger(&session);

    accepted
}

fn print_ledger<B: Broker>(session: &TradingSession<B>) {
    let summary = session.summary();
    let status = session.status();

    println!("=== ${} Budget ===", session.budget().normalize());
    println!("{}", summary);
    println!("Status:        {}", status);

    if summary.overspend() > Decimal::ZERO {
        println!(
            "Cost basis is ${:.2} over budget; spend is shown capped.",
            summary.overspend()
        );
    }

    if let Some(warning) = status.warning(summary.remaining) {
        println!("\n{}", warning);
    }
}

fn print_positions<B: Broker>(session: &TradingSession<B>) {
    let positions = &session.snapshot().positions;

    println!("\n--- Open Positions ({}) ---", positions.len());
    if positions.is_empty() {
        println!("No positions yet. Buy something to start.");
        return;
    }

    println!(
        "{:<8} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "SYMBOL", "QTY", "AVG COST", "PRICE", "VALUE", "P&L %"
    );
    for pos in positions {
        println!(
            "{:<8} {:>10} {:>10.2} {:>10.2} {:>10.2} {:>9.2}%",
            truncate(&pos.symbol, 8),
            pos.quantity.normalize(),
            pos.avg_entry_price,
            pos.current_price,
            pos.market_value,
            pos.unrealized_pl_percent
        );
    }
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
