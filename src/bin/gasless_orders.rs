//! Signed CLOB order batches
//!
//! Places one order from the command line, or a batch from a JSON file,
//! signed for the configured proxy wallet, Safe or EOA.
//!
//! Requires environment variables in `.env`:
//!   - PRIVATE_KEY (with 0x prefix)
//!   - PROXY_WALLET (optional - derived from the key otherwise)
//!   - API_KEY, API_SECRET, API_PASSPHRASE (optional - will be derived if not provided)
//!
//! Usage:
//!   cargo run --bin gasless-orders -- <token_id> <price> <size> <buy|sell> [order_type]
//!   cargo run --bin gasless-orders -- --file orders.json
//!
//! The file holds a JSON array of orders:
//!   [{"token_id": "...", "price": "0.45", "size": "10", "side": "BUY", "order_type": "GTC"}]

use anyhow::{bail, Context, Result};
use polymarket_gasless::bin_common::{load_config, parse_args, ConfigType};
use polymarket_gasless::gasless::infrastructure::client::clob::{BatchReport, OrderArgs};
use polymarket_gasless::gasless::{GaslessClient, OrderType, Side};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::error;

fn print_usage() {
    println!("Gasless Order Placement");
    println!();
    println!("Usage:");
    println!("  gasless-orders <token_id> <price> <size> <side> [order_type]");
    println!("  gasless-orders --file <orders.json>");
    println!();
    println!("Arguments:");
    println!("  token_id    ERC1155 conditional token ID");
    println!("  price       Price per token (0.01 to 0.99)");
    println!("  size        Number of tokens to buy/sell (minimum 5)");
    println!("  side        'buy' or 'sell'");
    println!("  order_type  Optional: 'gtc' (default), 'fok', 'gtd', or 'fak'");
    println!();
    println!("Environment Variables (set in .env file):");
    println!("  PRIVATE_KEY          Your Ethereum private key (0x prefixed)");
    println!("  PROXY_WALLET         Maker wallet (optional, derived otherwise)");
    println!("  API_KEY              Polymarket API key (optional - will be derived if not provided)");
    println!("  API_SECRET           Polymarket API secret (optional)");
    println!("  API_PASSPHRASE       Polymarket API passphrase (optional)");
    println!("  GASLESS_CONFIG_PATH  Config file (default config/gasless.yaml)");
}

fn parse_side(s: &str) -> Result<Side> {
    match s.to_lowercase().as_str() {
        "buy" | "b" => Ok(Side::Buy),
        "sell" | "s" => Ok(Side::Sell),
        _ => bail!("Invalid side '{}'. Use 'buy' or 'sell'", s),
    }
}

fn parse_order_type(s: &str) -> Result<OrderType> {
    match s.to_lowercase().as_str() {
        "gtc" => Ok(OrderType::GTC),
        "fok" => Ok(OrderType::FOK),
        "gtd" => Ok(OrderType::GTD),
        "fak" => Ok(OrderType::FAK),
        _ => bail!(
            "Invalid order type '{}'. Use 'gtc', 'fok', 'gtd', or 'fak'",
            s
        ),
    }
}

fn parse_orders(args: &[String]) -> Result<Vec<OrderArgs>> {
    if args[0] == "--file" {
        let path = args.get(1).context("--file needs a path")?;
        let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
        let orders: Vec<OrderArgs> = serde_json::from_str(&content).with_context(|| format!("parsing {}", path))?;
        return Ok(orders);
    }

    if args.len() < 4 {
        bail!("expected <token_id> <price> <size> <side> [order_type]");
    }
    let price = Decimal::from_str(&args[1]).with_context(|| format!("invalid price '{}'", args[1]))?;
    let size = Decimal::from_str(&args[2]).with_context(|| format!("invalid size '{}'", args[2]))?;
    let mut order = OrderArgs::new(args[0].clone(), price, size, parse_side(&args[3])?);
    if let Some(order_type) = args.get(4) {
        order.order_type = parse_order_type(order_type)?;
    }
    Ok(vec![order])
}

fn print_report(report: &BatchReport) {
    println!("BATCH RESULT:");
    println!("────────────────────────────────────────────────────────────────");
    for result in &report.results {
        let token = &result.token_id[..20.min(result.token_id.len())];
        if result.success {
            println!(
                "  OK    {}...  id={}  status={}{}",
                token,
                result.order_id.as_deref().unwrap_or("-"),
                result.status.as_deref().unwrap_or("-"),
                if result.retried { "  (neg-risk retry)" } else { "" }
            );
        } else {
            println!(
                "  FAIL  {}...  {}",
                token,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    println!();
    println!(
        "  Placed {}/{} (retried {}, missing orderbook {})",
        report.succeeded(),
        report.results.len(),
        report.retried,
        report.orderbook_missing
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    let orders = parse_orders(&args)?;
    let config = load_config(ConfigType::Gasless)?;
    let mut client = GaslessClient::connect(config, "gasless-orders").await?;

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("ORDER BATCH ({} orders)", orders.len());
    println!("════════════════════════════════════════════════════════════════");
    println!("  Signer:     {:?}", client.context.signer_address());
    println!("  Maker:      {:?}", client.context.wallet_address());
    println!("  Sig Type:   {:?}", client.context.signature_type());
    println!();

    client.orders.ensure_api_key().await?;

    match client.orders.place_orders(&orders).await {
        Ok(report) => {
            print_report(&report);
            if report.failed() > 0 {
                error!("{} orders failed", report.failed());
            }
        }
        Err(e) => {
            println!("BATCH FAILED:");
            println!("────────────────────────────────────────────────────────────────");
            println!("  Error: {}", e);
            error!("Order placement error: {}", e);
            return Err(e.into());
        }
    }

    println!();
    println!("════════════════════════════════════════════════════════════════");
    Ok(())
}
