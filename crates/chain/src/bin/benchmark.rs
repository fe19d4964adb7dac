//! Predecessor lookup benchmark
//!
//! Runs the same predecessor lookup repeatedly against a live Vaults contract
//! and reports latency plus whether every run returned the same key.
//!
//! ## Usage
//!
//! ```bash
//! VAULTS_CONTRACT_ADDRESS=0x... cargo run --bin benchmark
//!
//! # Look up a specific position with more runs
//! BENCHMARK_TARGET_INDEX=1500000000 BENCHMARK_RUNS=50 cargo run --bin benchmark
//! ```
//!
//! With an unchanged list every run must agree; a disagreement means the list
//! moved during the benchmark (or a reader bug).

use std::str::FromStr;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, U256};

use fxdao_chain::VaultsClient;
use fxdao_common::config::AppConfig;
use fxdao_common::types::{Denomination, VaultKey};
use fxdao_engine::locator::{LocateRequest, PredecessorLocator};

struct RunMetrics {
    total_ms: f64,
    result: Option<VaultKey>,
}

struct AggregateStats {
    runs: usize,
    avg_ms: f64,
    p50_ms: f64,
    p95_ms: f64,
    max_ms: f64,
    all_agree: bool,
}

fn compute_percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f64 - 1.0)).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn compute_stats(metrics: &[RunMetrics]) -> AggregateStats {
    let n = metrics.len();

    let mut totals: Vec<f64> = metrics.iter().map(|m| m.total_ms).collect();
    totals.sort_by(|a, b| a.total_cmp(b));

    let avg = if n == 0 {
        0.0
    } else {
        totals.iter().sum::<f64>() / n as f64
    };

    let all_agree = metrics
        .windows(2)
        .all(|pair| pair[0].result == pair[1].result);

    AggregateStats {
        runs: n,
        avg_ms: avg,
        p50_ms: compute_percentile(&totals, 50.0),
        p95_ms: compute_percentile(&totals, 95.0),
        max_ms: totals.last().copied().unwrap_or(0.0),
        all_agree,
    }
}

fn print_report(
    stats: &AggregateStats,
    wall_elapsed: Duration,
    request: &LocateRequest,
    result: Option<&VaultKey>,
) {
    println!();
    println!("══════════════════════════════════════════════════════════════");
    println!("  FxDAO Predecessor Lookup Benchmark Report");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("  Denomination:       {}", request.denomination);
    println!("  Target Index:       {}", request.target);
    println!("  Lookup Account:     {}", request.account);
    println!("  Runs:               {}", stats.runs);
    println!("  Wall Clock Time:    {:.1}s", wall_elapsed.as_secs_f64());
    println!();
    println!("  ── Latency Distribution ─────────────────────────────────");
    println!("  avg:   {:.1}ms", stats.avg_ms);
    println!("  p50:   {:.1}ms", stats.p50_ms);
    println!("  p95:   {:.1}ms", stats.p95_ms);
    println!("  max:   {:.1}ms", stats.max_ms);
    println!();
    println!("  ── Result ─────────────────────────────────────────────");
    match result {
        Some(key) => println!("  Predecessor:        {} (index {})", key.account, key.index),
        None => println!("  Predecessor:        none (target becomes the head)"),
    }
    println!(
        "  Runs agree:         {}",
        if stats.all_agree { "✅ yes" } else { "❌ no" }
    );
    println!();
    println!("══════════════════════════════════════════════════════════════");
    println!();
}

fn env_or<T: FromStr>(name: &str, default: &str) -> anyhow::Result<T> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("{} has an invalid value", name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("benchmark=info,fxdao_chain=warn,warn")
        .init();

    let config = AppConfig::from_env()?;

    let target: U256 = env_or("BENCHMARK_TARGET_INDEX", "1000000000")?;
    let account: Address = env_or("BENCHMARK_ACCOUNT", &Address::ZERO.to_string())?;
    let denomination: Denomination = env_or("BENCHMARK_DENOMINATION", "USD")?;
    let runs: usize = env_or("BENCHMARK_RUNS", "20")?;

    let client = VaultsClient::from_config(&config)?;
    let locator = PredecessorLocator::with_page_size(config.locator_page_size);
    let request = LocateRequest {
        target,
        account,
        denomination,
        exclude_self: true,
    };

    println!();
    println!("FxDAO Predecessor Lookup Benchmark");
    println!("───────────────────────────────────────");
    println!("RPC:       {}", config.vaults_rpc_url);
    println!("Contract:  {}", config.vaults_contract_address);
    println!("Page size: {}", locator.page_size());
    println!("Runs:      {}", runs);
    println!();

    let mut metrics = Vec::with_capacity(runs);
    let wall_start = Instant::now();

    for run in 0..runs {
        let start = Instant::now();
        let result = match locator.locate(&client, &request).await {
            Ok(result) => result,
            Err(e) => {
                eprintln!("  ⚠ Run {} failed: {}", run + 1, e);
                continue;
            }
        };
        let total_ms = start.elapsed().as_secs_f64() * 1000.0;

        if run % 5 == 0 {
            println!(
                "  run #{} | {:.0}ms | prev {}",
                run + 1,
                total_ms,
                result
                    .as_ref()
                    .map(|k| k.account.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
        }

        metrics.push(RunMetrics { total_ms, result });
    }

    let wall_elapsed = wall_start.elapsed();

    let Some(first) = metrics.first() else {
        println!("No successful runs, nothing to report.");
        std::process::exit(1);
    };

    let stats = compute_stats(&metrics);
    print_report(&stats, wall_elapsed, &request, first.result.as_ref());

    if !stats.all_agree {
        std::process::exit(1);
    }

    Ok(())
}
