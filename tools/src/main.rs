//! loyalty-runner: headless driver for the loyalty analytics engine.
//!
//! Usage:
//!   loyalty-runner --customers customers.json --transactions transactions.json --customer CUST000042
//!   loyalty-runner --demo 500 --seed 7 --at-risk --churn-threshold 0.6 --min-ltv 20000
//!   loyalty-runner --demo 200 --ipc-mode

mod demo;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use loyalty_core::{
    config::LoyaltyConfig, metrics::PortfolioMetrics, AnalysisResult, LoyaltyEngine,
    LoyaltyResult,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

const DEFAULT_BATCH_LIMIT: usize = 100;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Analyze {
        customer_id: String,
    },
    Summary {
        customer_id: String,
    },
    Batch {
        customer_ids: Vec<String>,
        #[serde(default = "default_batch_limit")]
        limit: usize,
    },
    AtRisk {
        churn_threshold: f64,
        min_lifetime_value: f64,
    },
    Metrics,
    Quit,
}

fn default_batch_limit() -> usize {
    DEFAULT_BATCH_LIMIT
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let at_risk = args.iter().any(|a| a == "--at-risk");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let seed = parse_arg(&args, "--seed", 42u64);
    let demo_size = parse_arg(&args, "--demo", 0usize);
    let limit = parse_arg(&args, "--limit", 0usize);
    let churn_threshold = parse_arg(&args, "--churn-threshold", 0.7f64);
    let min_ltv = parse_arg(&args, "--min-ltv", 10_000.0f64);

    let as_of = match string_arg(&args, "--as-of") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--as-of expects YYYY-MM-DD, got '{raw}'"))?,
        None => chrono::Local::now().date_naive(),
    };

    let config = if Path::new(data_dir).is_dir() {
        LoyaltyConfig::load(data_dir)?
    } else {
        log::warn!("data dir {data_dir} not found, using built-in scoring constants");
        LoyaltyConfig::defaults()
    };
    let engine = LoyaltyEngine::new(config, as_of)?;

    if demo_size > 0 {
        let (customers, transactions) = demo::generate(demo_size, seed, as_of);
        engine.load(customers, transactions)?;
    } else {
        let (Some(customers_path), Some(transactions_path)) = (
            string_arg(&args, "--customers"),
            string_arg(&args, "--transactions"),
        ) else {
            bail!("pass --customers and --transactions, or --demo N");
        };
        let customers = std::fs::read_to_string(customers_path)
            .with_context(|| format!("Cannot read {customers_path}"))?;
        let transactions = std::fs::read_to_string(transactions_path)
            .with_context(|| format!("Cannot read {transactions_path}"))?;
        engine.load_json(&customers, &transactions)?;
    }

    if ipc_mode {
        return run_ipc_loop(&engine);
    }

    println!("Loyalty analytics: loyalty-runner");
    println!("  as of:     {as_of}");
    println!("  data_dir:  {data_dir}");
    if demo_size > 0 {
        println!("  demo:      {demo_size} customers (seed {seed})");
    }
    println!();

    if let Some(customer_id) = string_arg(&args, "--customer") {
        let analysis = engine.analyze(customer_id)?;
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else if at_risk {
        let found = engine.get_high_value_at_risk(churn_threshold, min_ltv)?;
        println!(
            "=== HIGH-VALUE AT RISK (churn >= {churn_threshold}, LTV >= {min_ltv:.0}) ==="
        );
        print_table(&found);
    } else {
        let limit = (limit > 0).then_some(limit);
        let outcome = engine.analyze_all(limit)?;
        println!("=== ANALYSIS ({} customers) ===", outcome.success_count());
        print_table(&outcome.results);
        for (id, reason) in &outcome.failures {
            println!("  FAILED {id}: {reason}");
        }
        println!();
        print_metrics(&engine.portfolio_metrics()?);
    }

    Ok(())
}

fn run_ipc_loop(engine: &LoyaltyEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if let IpcCommand::Quit = cmd {
            break;
        }

        let response = match handle_command(engine, cmd) {
            Ok(value) => value,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(engine: &LoyaltyEngine, cmd: IpcCommand) -> LoyaltyResult<serde_json::Value> {
    let value = match cmd {
        IpcCommand::Analyze { customer_id } => serde_json::to_value(engine.analyze(&customer_id)?)?,
        IpcCommand::Summary { customer_id } => {
            serde_json::to_value(engine.loyalty_summary(&customer_id)?)?
        }
        IpcCommand::Batch { customer_ids, limit } => {
            serde_json::to_value(engine.batch_analyze(&customer_ids, limit)?)?
        }
        IpcCommand::AtRisk { churn_threshold, min_lifetime_value } => {
            serde_json::to_value(engine.get_high_value_at_risk(churn_threshold, min_lifetime_value)?)?
        }
        IpcCommand::Metrics => serde_json::to_value(engine.portfolio_metrics()?)?,
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn print_table(results: &[AnalysisResult]) {
    if results.is_empty() {
        println!("  (no customers)");
        return;
    }
    for a in results {
        println!(
            "  {:<12} | {:<18} | RFM {:>5.1} | churn {:.2} ({:<6}) | LTV {:>10.0} | {} [{}] ROI {:.0}%",
            a.customer_id,
            a.segment.label(),
            a.rfm.combined,
            a.churn.probability,
            a.churn.tier.label(),
            a.profile.lifetime_value,
            a.recommendation.reward.name,
            a.recommendation.strategy.label(),
            a.recommendation.projected_roi,
        );
    }
}

fn print_metrics(m: &PortfolioMetrics) {
    println!("=== PORTFOLIO SUMMARY ===");
    println!("  customers:       {}", m.total_customers);
    println!("  transactions:    {} ({} completed)", m.total_transactions, m.completed_transactions);
    println!("  avg RFM:         {:.1}", m.avg_rfm_score);
    println!("  avg churn:       {:.3}", m.avg_churn_probability);
    println!("  avg retention:   {:.3}", m.avg_predicted_retention);
    println!("  segments:");
    for (segment, n) in &m.segment_distribution {
        println!("    {:<20} {n}", segment.label());
    }
    println!("  risk tiers:");
    for (tier, n) in &m.risk_distribution {
        println!("    {:<20} {n}", tier.label());
    }
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
