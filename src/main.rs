//! Polymarket LP Sentinel
//!
//! Scans for low-risk LP reward markets and monitors tracked limit
//! orders with Telegram alerts.

use clap::{Parser, Subcommand};
use lp_sentinel::{
    client::PolymarketClient,
    config::Config,
    monitor::{self, AlertState, PositionMonitor},
    notify::Notifier,
    positions::PositionBook,
    risk,
    scanner::{self, updown::UpDownWatch, MarketRow},
    telegram::{self, PositionCommand, TelegramBot},
    types::Side,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lp-sentinel")]
#[command(about = "Polymarket LP rewards scanner and position monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for low-risk LP reward markets
    Scan {
        /// Number of top markets to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Composite risk cutoff (0-100)
        #[arg(long)]
        max_risk: Option<Decimal>,
        /// Minimum lifetime volume in USD
        #[arg(long)]
        min_volume: Option<Decimal>,
    },
    /// Monitor tracked positions with alerts and Telegram commands
    Monitor,
    /// Show the risk breakdown for a single market
    Market {
        /// Market slug or URL
        slug: String,
    },
    /// Show open positions for a wallet address (read-only)
    Wallet {
        /// Polymarket user/proxy wallet address (0x...)
        address: String,
    },
    /// Add or update a tracked position
    Add {
        /// Market slug or URL
        slug: String,
        /// YES or NO
        side: Side,
        /// Limit price in cents (0-100 exclusive)
        price: Decimal,
        /// Free-form notes
        #[arg(default_value = "")]
        notes: String,
    },
    /// Remove tracked positions by 1-based index
    Remove {
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// List tracked positions
    List,
    /// Send a Telegram test notification
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Scan {
            limit,
            max_risk,
            min_volume,
        } => run_scan(config, limit, max_risk, min_volume).await,
        Commands::Monitor => run_monitor(config).await,
        Commands::Market { slug } => analyze_market(config, &slug).await,
        Commands::Wallet { address } => show_wallet_positions(config, &address).await,
        Commands::Add {
            slug,
            side,
            price,
            notes,
        } => add_position(config, &slug, side, price, &notes),
        Commands::Remove { indices } => remove_positions(config, &indices),
        Commands::List => list_positions(config),
        Commands::TestNotify => test_notify(config).await,
    }
}

async fn run_scan(
    config: Config,
    limit: Option<usize>,
    max_risk: Option<Decimal>,
    min_volume: Option<Decimal>,
) -> anyhow::Result<()> {
    let client = PolymarketClient::new(&config.polymarket)?;
    let max_risk = max_risk.unwrap_or(config.scan.max_risk);
    let min_volume = min_volume.unwrap_or(config.scan.min_volume);
    let top_n = limit.unwrap_or(config.scan.top_n);

    println!("Fetching active reward markets (paginated)...");
    let markets = client.gamma.get_reward_markets().await?;
    println!("Markets with LP rewards (daily rate > 0): {}", markets.len());

    let now = chrono::Utc::now();
    let rows: Vec<MarketRow> = markets
        .iter()
        .filter_map(|m| scanner::build_row(m, now))
        .collect();
    let low_risk = scanner::rank_low_risk(rows, max_risk, min_volume);
    println!(
        "\nMarkets with minimal risk (composite risk ≤ {}): {}",
        max_risk,
        low_risk.len()
    );
    println!(
        "Showing top {} by capital efficiency (then by daily rewards):\n",
        top_n.min(low_risk.len())
    );

    let sep = "-".repeat(100);
    println!("{}", sep);
    for (i, row) in low_risk.iter().take(top_n).enumerate() {
        let question: String = row.question.chars().take(70).collect();
        println!("  {}. {}", i + 1, question);
        println!(
            "     Risk: {} ({})  Spike: {}  Time: {}  Adverse: {}  Category: {}",
            row.risk.composite,
            risk::risk_label(row.risk.composite),
            row.risk.spike_risk,
            row.risk.time_risk,
            row.risk.adverse_selection_risk,
            row.risk.category.as_str(),
        );
        println!(
            "     Daily rewards: ${:.2}  Days left: {}  Est. min capital: ${:.0}  \
            Est. APY: {:.1}%  Total vol: ${:.0}  Liquidity: ${:.0}",
            row.daily_rewards,
            row.days_remaining,
            row.min_capital_estimate,
            row.estimated_apy,
            row.volume,
            row.liquidity,
        );
        println!("     {}", row.url);
        println!("     Reasoning — {}", scanner::reasoning(row));
        println!("{}", sep);
    }
    if low_risk.is_empty() {
        println!("No markets in the minimal-risk range. Try raising scan.max_risk.");
    }
    println!("\nScan complete.");

    Ok(())
}

async fn run_monitor(config: Config) -> anyhow::Result<()> {
    let client = PolymarketClient::new(&config.polymarket)?;
    let mut book = PositionBook::load(
        config.monitor.expanded_positions_path(),
        config.monitor.add_semantics,
    )?;

    let notifier = if let Some(tg) = &config.telegram {
        Notifier::new(tg.bot_token.clone(), tg.chat_id.clone())
    } else {
        tracing::warn!("Telegram not configured; alerts print to the terminal only");
        Notifier::disabled()
    };

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<PositionCommand>(100);
    if let Some(tg) = &config.telegram {
        let bot = Arc::new(TelegramBot::new(
            tg.bot_token.clone(),
            tg.chat_id.clone(),
            cmd_tx,
        ));
        tokio::spawn(bot.start_polling());
        tracing::info!("Telegram command listener started");
    }

    let monitor = PositionMonitor::new(config.monitor.alert_threshold_cents);
    let mut alert_state = AlertState::new();
    let mut updown_watch = UpDownWatch::new();
    let mut latest_rows = Vec::new();
    let mut cycle: u64 = 0;
    let notify_errors = config
        .telegram
        .as_ref()
        .map(|tg| tg.notify_errors)
        .unwrap_or(false);

    tracing::info!(
        "Starting position monitor: {} position(s), poll every {}s, alert under {}¢",
        book.len(),
        config.monitor.poll_interval_secs,
        config.monitor.alert_threshold_cents
    );

    loop {
        if book.is_empty() {
            tracing::info!("No positions tracked; waiting for /add_position or /bulk_add");
        } else {
            // One retry per fetch; a still-failing cycle is skipped and
            // the previous rows and alert state stay in effect.
            match monitor::gather_quotes(&client, book.positions()).await {
                Ok(quotes) => {
                    // Positions on fully resolved markets are dead; drop
                    // them before evaluating the rest.
                    let settled = monitor::resolved_market_indices(book.positions(), &quotes);
                    if !settled.is_empty() {
                        if let Ok(report) = book.remove(&settled) {
                            if let Err(e) = book.save() {
                                tracing::warn!("Saving positions after cleanup failed: {}", e);
                            }
                            for removed in &report.removed {
                                let msg = format!(
                                    "Market resolved; removed position {} {} @ {:.1}¢ on {}",
                                    removed.index,
                                    removed.position.side,
                                    removed.position.limit_price_cents,
                                    removed.position.market_slug
                                );
                                tracing::info!("{}", msg);
                                notifier.send(&msg).await?;
                            }
                        }
                    }

                    let eval = monitor.evaluate(book.positions(), &quotes, &alert_state);
                    alert_state = eval.state;

                    println!();
                    for row in &eval.rows {
                        println!("{}", render_row(row));
                    }

                    for alert in &eval.alerts {
                        tracing::info!(
                            "Price near limit on {} {} (distance {:.1}¢), alerting",
                            alert.question,
                            alert.side,
                            alert.distance_cents
                        );
                        notifier.price_alert(alert).await?;
                    }

                    latest_rows = eval.rows;
                }
                Err(e) => {
                    tracing::warn!("Cycle skipped, keeping previous state: {}", e);
                    if notify_errors {
                        notifier.error("Market fetch", &e.to_string()).await?;
                    }
                }
            }
        }

        // Commands apply strictly between evaluations
        while let Ok(command) = cmd_rx.try_recv() {
            for reply in telegram::apply(&mut book, &latest_rows, command) {
                notifier.send(&reply).await?;
            }
        }

        cycle += 1;
        if cycle % 10 == 0 && notifier.is_enabled() {
            check_updown_markets(&client, &mut updown_watch, &notifier).await;
        }

        tokio::time::sleep(Duration::from_secs(config.monitor.poll_interval_secs)).await;
    }
}

/// Every ~10 cycles: surface reward-bearing Up/Down markets opening soon
async fn check_updown_markets(
    client: &PolymarketClient,
    watch: &mut UpDownWatch,
    notifier: &Notifier,
) {
    let markets = match client.gamma.get_reward_markets().await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Up/Down market check failed: {}", e);
            return;
        }
    };
    let now = chrono::Utc::now();
    let rows: Vec<MarketRow> = markets
        .iter()
        .filter_map(|m| scanner::build_row(m, now))
        .collect();

    for opp in watch.find_new(&markets, &rows, now) {
        tracing::info!("Up/Down market opening soon: {}", opp.question);
        if let Err(e) = notifier.updown_alert(&opp).await {
            tracing::warn!("Up/Down alert failed: {}", e);
        }
    }
}

fn render_row(row: &lp_sentinel::monitor::MonitorRow) -> String {
    let question: String = row.question.chars().take(120).collect();
    match &row.quote {
        Some(q) => {
            let dist = if q.out_of_range {
                format!("{:.1}¢ OUT OF RANGE", q.distance_cents)
            } else {
                format!("{:.1}¢", q.distance_cents)
            };
            format!(
                "{}. {} — {} current: {:.1}¢, limit: {:.1}¢, distance: {}, bids before: ${:.2}",
                row.index,
                question,
                row.side,
                q.current_price_cents,
                row.limit_price_cents,
                dist,
                q.bids_before,
            )
        }
        None => format!(
            "{}. {} — {} limit: {:.1}¢, market not found (remove it or fix the slug)",
            row.index, question, row.side, row.limit_price_cents,
        ),
    }
}

async fn analyze_market(config: Config, slug: &str) -> anyhow::Result<()> {
    let client = PolymarketClient::new(&config.polymarket)?;
    let market = client
        .gamma
        .get_market_by_slug(slug)
        .await?
        .ok_or_else(|| lp_sentinel::error::SentinelError::MarketNotFound(slug.to_string()))?;

    let classification = risk::classify(&market.question);
    let breakdown = risk::score(&market, &classification);

    println!("\nMarket Analysis\n");
    println!("Question: {}", market.question);
    println!("YES price: {:.3}  NO price: {:.3}", market.yes_price(), market.no_price());
    println!("Liquidity: ${:.0}  Volume: ${:.0}", market.liquidity, market.volume);
    println!("Resolution: {}", scanner::format_end_date(market.end_date));
    println!();
    println!(
        "Composite risk: {} ({})",
        breakdown.composite,
        risk::risk_label(breakdown.composite)
    );
    println!(
        "  Spike: {} (category: {})",
        breakdown.spike_risk,
        breakdown.category.as_str()
    );
    println!("  Time proximity: {}", breakdown.time_risk);
    println!("  Adverse selection: {}", breakdown.adverse_selection_risk);

    if let Some(row) = scanner::build_row(&market, chrono::Utc::now()) {
        println!();
        println!(
            "Daily rewards: ${:.2}  Est. min capital: ${:.0}  Est. APY: {:.1}%",
            row.daily_rewards, row.min_capital_estimate, row.estimated_apy
        );
        println!("Reasoning — {}", scanner::reasoning(&row));
    } else {
        println!("\nNo LP rewards on this market.");
    }

    Ok(())
}

async fn show_wallet_positions(config: Config, address: &str) -> anyhow::Result<()> {
    let client = PolymarketClient::new(&config.polymarket)?;
    println!("Fetching current positions for {} ...", address);
    let positions = client.data.get_user_positions(address).await?;

    if positions.is_empty() {
        println!("No open positions returned by the Data API for this address.");
        return Ok(());
    }

    println!("Found {} position(s).\n", positions.len());
    let sep = "-".repeat(100);
    for (i, p) in positions.iter().enumerate() {
        let title: String = p.title.chars().take(120).collect();
        println!("{}", sep);
        println!("{}. {}", i + 1, title);
        println!(
            "   Outcome: {}  Size: {:.4}  Avg price: {:.4}  Current price: {:.4}",
            p.outcome, p.size, p.avg_price, p.cur_price
        );
        println!("   PnL: ${:.2}  Percent PnL: {:.2}%", p.cash_pnl, p.percent_pnl);
        if let Some(url) = p.url() {
            println!("   {}", url);
        }
        println!();
    }
    println!("{}", sep);

    Ok(())
}

fn add_position(
    config: Config,
    slug: &str,
    side: Side,
    price: Decimal,
    notes: &str,
) -> anyhow::Result<()> {
    let mut book = PositionBook::load(
        config.monitor.expanded_positions_path(),
        config.monitor.add_semantics,
    )?;
    let outcome = book.add_or_update(slug, side, price, notes)?;
    book.save()?;

    match outcome {
        lp_sentinel::positions::AddOutcome::Added => {
            println!("Added position: {} @ {:.1}¢ on {}", side, price, slug)
        }
        lp_sentinel::positions::AddOutcome::Updated { old_price } => println!(
            "Updated existing position: {} on {} ({:.1}¢ -> {:.1}¢)",
            side, slug, old_price, price
        ),
    }
    Ok(())
}

fn remove_positions(config: Config, indices: &[usize]) -> anyhow::Result<()> {
    let mut book = PositionBook::load(
        config.monitor.expanded_positions_path(),
        config.monitor.add_semantics,
    )?;
    let report = book.remove(indices)?;
    book.save()?;

    for removed in &report.removed {
        println!(
            "Removed {}. {} @ {:.1}¢ on {}",
            removed.index,
            removed.position.side,
            removed.position.limit_price_cents,
            removed.position.market_slug
        );
    }
    for index in &report.out_of_range {
        println!("Index {} out of range; ignoring.", index);
    }
    println!("{} position(s) remain.", book.len());
    Ok(())
}

fn list_positions(config: Config) -> anyhow::Result<()> {
    let book = PositionBook::load(
        config.monitor.expanded_positions_path(),
        config.monitor.add_semantics,
    )?;
    if book.is_empty() {
        println!("No positions saved.");
        return Ok(());
    }
    for (i, p) in book.positions().iter().enumerate() {
        let notes = if p.notes.is_empty() {
            String::new()
        } else {
            format!("  ({})", p.notes)
        };
        println!(
            "  {}. {} @ {:.1}¢ on {}{}",
            i + 1,
            p.side,
            p.limit_price_cents,
            p.market_slug,
            notes
        );
    }
    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let tg = config
        .telegram
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Telegram not configured in config.toml"))?;

    let notifier = Notifier::new(tg.bot_token.clone(), tg.chat_id.clone());
    notifier
        .send("🧪 <b>Test Notification</b>\n\nIf you see this, Telegram integration is working!")
        .await?;

    println!("Test notification sent.");
    Ok(())
}
