//! Relayed position management
//!
//! Redeems resolved positions, or splits/merges collateral, through the
//! Polymarket relay so the proxy wallet or Safe pays no gas.
//!
//! Requires environment variables in `.env`:
//!   - PRIVATE_KEY (with 0x prefix)
//!   - BUILDER_API_KEY, BUILDER_SECRET, BUILDER_PASSPHRASE
//!   - PROXY_WALLET (optional - derived from the key otherwise)
//!
//! Usage:
//!   cargo run --bin gasless-redeem -- redeem <condition_id>...
//!   cargo run --bin gasless-redeem -- redeem-neg-risk <condition_id> <amount>...
//!   cargo run --bin gasless-redeem -- split <condition_id> <amount> [neg-risk]
//!   cargo run --bin gasless-redeem -- merge <condition_id> <amount> [neg-risk]
//!   cargo run --bin gasless-redeem -- approve
//!   cargo run --bin gasless-redeem -- balance <token_id>
//!   cargo run --bin gasless-redeem -- status <relay_transaction_id>

use anyhow::{bail, Context, Result};
use ethers::types::{H256, U256};
use polymarket_gasless::bin_common::{load_config, parse_args, ConfigType};
use polymarket_gasless::gasless::application::RelayExecution;
use polymarket_gasless::gasless::domain::parse_hash;
use polymarket_gasless::gasless::GaslessClient;
use tracing::error;

fn print_usage() {
    println!("Gasless Position Management");
    println!();
    println!("Usage:");
    println!("  gasless-redeem redeem <condition_id>...");
    println!("  gasless-redeem redeem-neg-risk <condition_id> <amount>...");
    println!("  gasless-redeem split <condition_id> <amount> [neg-risk]");
    println!("  gasless-redeem merge <condition_id> <amount> [neg-risk]");
    println!("  gasless-redeem approve");
    println!("  gasless-redeem balance <token_id>");
    println!("  gasless-redeem status <relay_transaction_id>");
    println!();
    println!("Amounts are raw 6-decimal units (1000000 = 1 USDC).");
    println!();
    println!("Environment Variables (set in .env file):");
    println!("  PRIVATE_KEY          Your Ethereum private key (0x prefixed)");
    println!("  BUILDER_API_KEY      Relay builder API key");
    println!("  BUILDER_SECRET       Relay builder secret");
    println!("  BUILDER_PASSPHRASE   Relay builder passphrase");
    println!("  PROXY_WALLET         Maker wallet (optional, derived otherwise)");
    println!("  GASLESS_CONFIG_PATH  Config file (default config/gasless.yaml)");
}

fn parse_condition(s: &str) -> Result<H256> {
    parse_hash(s).with_context(|| format!("invalid condition id '{}'", s))
}

fn parse_amount(s: &str) -> Result<U256> {
    U256::from_dec_str(s).with_context(|| format!("invalid amount '{}'", s))
}

fn parse_neg_risk(args: &[String]) -> Result<bool> {
    match args.first().map(|s| s.to_lowercase()) {
        None => Ok(false),
        Some(flag) if flag == "neg-risk" => Ok(true),
        Some(other) => bail!("Unexpected argument '{}'. Use 'neg-risk' or nothing", other),
    }
}

fn print_execution(execution: &RelayExecution) {
    println!("RELAY RESULT:");
    println!("────────────────────────────────────────────────────────────────");
    println!("  Wallet Type:  {:?}", execution.wallet_type);
    println!("  Nonce:        {}", execution.nonce);
    if let Some(id) = &execution.transaction_id {
        println!("  Relay Tx ID:  {}", id);
    }
    match execution.transaction_hash {
        Some(hash) => println!("  Tx Hash:      {:?}", hash),
        None => println!("  Tx Hash:      pending (relay has not broadcast yet)"),
    }
    if let Some(receipt) = &execution.receipt {
        println!("  Block:        {:?}", receipt.block_number);
        println!("  Gas Used:     {:?}", receipt.gas_used);
    }
    if let Some(gas) = &execution.gas_limit {
        println!("  Gas Limit:    {} ({:?})", gas.value, gas.source);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();
    if args.is_empty() || (args.len() < 2 && args[0] != "approve") {
        print_usage();
        return Ok(());
    }

    let config = load_config(ConfigType::Gasless)?;
    let client = GaslessClient::connect(config, "gasless-redeem").await?;

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("GASLESS {}", args[0].to_uppercase());
    println!("════════════════════════════════════════════════════════════════");
    println!("  Signer:       {:?}", client.context.signer_address());
    println!("  Wallet:       {:?}", client.context.wallet_address());
    println!();

    let result = match args[0].as_str() {
        "approve" => client.positions.approve_trading().await,
        "balance" => {
            let token_id = parse_amount(&args[1])?;
            let balance = client.positions.position_balance(token_id).await?;
            println!("  Balance:      {} (6-decimal units)", balance);
            return Ok(());
        }
        "status" => {
            for tx in client.positions.relay_status(&args[1]).await? {
                let state = tx.relay_state();
                let progress = if state.is_final_success() {
                    "settled"
                } else if state.is_failure() {
                    "failed"
                } else {
                    "in flight"
                };
                println!("  {}  {}  hash={:?}", state, progress, tx.transaction_hash);
            }
            return Ok(());
        }
        "redeem" => {
            let conditions = args[1..].iter().map(|s| parse_condition(s)).collect::<Result<Vec<_>>>()?;
            client.positions.redeem(&conditions).await
        }
        "redeem-neg-risk" => {
            let condition = parse_condition(&args[1])?;
            let amounts = args[2..].iter().map(|s| parse_amount(s)).collect::<Result<Vec<_>>>()?;
            if amounts.is_empty() {
                bail!("redeem-neg-risk needs at least one amount");
            }
            client.positions.redeem_neg_risk(&[condition], &[amounts]).await
        }
        "split" | "merge" => {
            if args.len() < 3 {
                print_usage();
                return Ok(());
            }
            let condition = parse_condition(&args[1])?;
            let amount = parse_amount(&args[2])?;
            let neg_risk = parse_neg_risk(&args[3..])?;
            if args[0] == "split" {
                client.positions.split(condition, amount, neg_risk).await
            } else {
                client.positions.merge(condition, amount, neg_risk).await
            }
        }
        other => {
            print_usage();
            bail!("Unknown command '{}'", other);
        }
    };

    match result {
        Ok(execution) => print_execution(&execution),
        Err(e) => {
            println!("RELAY FAILED:");
            println!("────────────────────────────────────────────────────────────────");
            println!("  Error: {}", e);
            error!("Relay error: {}", e);
            return Err(e.into());
        }
    }

    println!();
    println!("════════════════════════════════════════════════════════════════");
    Ok(())
}
