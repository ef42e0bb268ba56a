//! chainscan CLI — pull contract event logs from block explorers.
//!
//! Usage:
//! ```bash
//! # All USDC Transfer logs on Ethereum (key from ETHERSCAN_API_KEY)
//! chainscan logs --address 0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48 \
//!     --topic 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
//!
//! # Same query against Base's hosted Blockscout, limited to a block range
//! chainscan logs --explorer blockscout --chain 8453 --address 0x... \
//!     --from-block 12000000 --to-block 12100000
//!
//! # List supported explorer profiles
//! chainscan explorers
//! ```

use std::env;
use std::process;

use chainscan_core::pagination::{Page, RetryableError};
use chainscan_core::policy::{RetryConfig, RetryPolicy};
use chainscan_core::types::Log;
use chainscan_explorer::profiles::{blockscout, etherscan};
use chainscan_explorer::{ExplorerProfile, QueryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    init_tracing(has_flag(&args[2..], "--json-logs"));

    let result = match args[1].as_str() {
        "logs" => cmd_logs(&args[2..]).await,
        "explorers" => {
            cmd_explorers();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("chainscan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays one JSON log per line.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn print_usage() {
    println!("chainscan {}", env!("CARGO_PKG_VERSION"));
    println!("Pull contract event logs from Etherscan-style block explorers\n");
    println!("USAGE:");
    println!("    chainscan <COMMAND>\n");
    println!("COMMANDS:");
    println!("    logs       Fetch logs for an address, printing one JSON object per line");
    println!("    explorers  List built-in explorer profiles");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("LOGS FLAGS:");
    println!("    --address <ADDR>       Contract address  [required]");
    println!("    --topic <TOPIC>        Topic filter, in order topic0..topic3 (repeatable, max 4)");
    println!("    --explorer <NAME>      etherscan | blockscout  [default: etherscan]");
    println!("    --url <URL>            Custom Etherscan-compatible endpoint (overrides --explorer)");
    println!("    --chain <ID>           Chain id  [default: 1]");
    println!("    --api-key <KEY>        API key  [default: ${API_KEY_ENV}]");
    println!("    --rate <N>             Calls per second  [default: profile budget]");
    println!("    --max-retries <N>      Retries per failed page  [default: 5]");
    println!("    --from-block <N>       First block (inclusive)");
    println!("    --to-block <N>         Last block (inclusive)");
    println!("    --json-logs            Emit diagnostics as JSON on stderr\n");
    println!("Set RUST_LOG=chainscan_core=debug to trace each request.");
}

async fn cmd_logs(args: &[String]) -> Result<(), String> {
    let address = parse_flag(args, "--address").ok_or("--address is required")?;
    let topics = parse_all(args, "--topic");
    let chain_id: u64 = parse_num(args, "--chain")?.unwrap_or(1);
    let from_block: Option<u64> = parse_num(args, "--from-block")?;
    let to_block: Option<u64> = parse_num(args, "--to-block")?;
    let rate: Option<f64> = parse_num(args, "--rate")?;
    let api_key = parse_flag(args, "--api-key").or_else(|| env::var(API_KEY_ENV).ok());

    let mut retry = RetryConfig::default();
    if let Some(n) = parse_num(args, "--max-retries")? {
        retry.max_retries = n;
    }
    let policy = RetryPolicy::new(retry);

    let mut profile = select_profile(args, chain_id, api_key.as_deref())?;
    if let Some(rate) = rate {
        profile.gate = profile.gate.with_rate(rate);
    }
    let explorer = profile.http_explorer().map_err(|e| e.to_string())?;

    let first = match explorer
        .get_logs_between(&address, &topics, from_block, to_block)
        .await
    {
        Ok(page) => Ok(page),
        Err(QueryError::Invalid(e)) => return Err(e.to_string()),
        Err(QueryError::Retryable(e)) => Err(e),
    };

    let mut page = with_retries(first, &policy).await?;
    let mut total = 0usize;
    loop {
        total += page.items.len();
        for log in &page.items {
            println!("{}", serde_json::to_string(log).map_err(|e| e.to_string())?);
        }
        match page.next.take() {
            Some(next) => page = with_retries(next.resume().await, &policy).await?,
            None => break,
        }
    }

    tracing::info!(total, last_page = page.page, "query complete");
    Ok(())
}

fn select_profile(
    args: &[String],
    chain_id: u64,
    api_key: Option<&str>,
) -> Result<ExplorerProfile, String> {
    if let Some(url) = parse_flag(args, "--url") {
        return Ok(blockscout::custom(&url, api_key));
    }
    let name = parse_flag(args, "--explorer").unwrap_or_else(|| "etherscan".into());
    match name.as_str() {
        "etherscan" => {
            let key = api_key.ok_or(format!("--api-key or {API_KEY_ENV} is required for etherscan"))?;
            Ok(etherscan::profile(key, chain_id))
        }
        "blockscout" => blockscout::profile(chain_id, api_key)
            .ok_or(format!("no hosted Blockscout instance known for chain {chain_id}; use --url")),
        other => Err(format!("unknown explorer '{other}'")),
    }
}

/// Resume a failed page until it succeeds or `policy` runs out of attempts.
async fn with_retries(
    mut attempt: Result<Page<Log>, RetryableError<Log>>,
    policy: &RetryPolicy,
) -> Result<Page<Log>, String> {
    let mut retries = 0;
    loop {
        let err = match attempt {
            Ok(page) => return Ok(page),
            Err(err) => err,
        };
        if !err.cause().is_retryable() {
            return Err(err.to_string());
        }
        retries += 1;
        let Some(delay) = policy.next_delay(retries) else {
            return Err(err.to_string());
        };
        tracing::warn!(
            page = err.page(),
            attempt = retries,
            delay_ms = delay.as_millis() as u64,
            error = %err.cause(),
            "page failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt = err.retry().await;
    }
}

fn cmd_explorers() {
    println!("Built-in explorer profiles:\n");
    println!("  etherscan   Etherscan V2 ({})", etherscan::V2_URL);
    println!("              Auth:   API key (required)");
    println!(
        "              Budget: {} calls/s (free tier)",
        etherscan::FREE_TIER_CALLS_PER_SEC
    );
    println!("              Chains:");
    for (id, name) in etherscan::CHAINS {
        println!("                {id:>9}  {name}");
    }
    println!();
    println!("  blockscout  Blockscout hosted instances (or --url for self-hosted)");
    println!("              Auth:   API key (optional)");
    println!(
        "              Budget: {} calls/s without a key",
        blockscout::KEYLESS_CALLS_PER_SEC
    );
    println!("              Chains:");
    for (id, name) in etherscan::CHAINS {
        if let Some(url) = blockscout::api_url(*id) {
            println!("                {id:>9}  {name:<18} {url}");
        }
    }
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

fn parse_all(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

fn parse_num<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    parse_flag(args, flag)
        .map(|v| v.parse().map_err(|_| format!("{flag} expects a number, got '{v}'")))
        .transpose()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
