//! analytics-cli: reads a wide-format rating CSV snapshot, runs the full
//! RTSI/IRSI/MSCI analysis once, and prints a summary.
//!
//! Usage:
//!   cargo run -p analytics-cli -- --input ratings.csv
//!   cargo run -p analytics-cli -- --input ratings.csv --enhanced --top 10

use std::fs;

use analysis_engine::{AnalysisEngine, EngineConfig, StockMetric};
use anyhow::{Context, Result};
use rating_core::{Dataset, Entity};

fn parse_dataset(path: &str) -> Result<Dataset> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader.headers().context("csv has no header row")?.clone();
    let dates: Vec<String> = headers.iter().skip(3).map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let code = record.get(0).unwrap_or("").trim().to_string();
        if code.is_empty() {
            continue;
        }
        let name = record.get(1).unwrap_or(&code).trim().to_string();
        let industry = record.get(2).unwrap_or("").trim().to_string();
        let tokens: Vec<String> = record.iter().skip(3).map(|t| t.trim().to_string()).collect();
        rows.push((Entity { code, name, industry }, tokens));
    }

    Dataset::from_rows(dates, rows).context("building dataset from csv rows")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "analytics_cli=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let input = args
        .iter()
        .position(|a| a == "--input")
        .and_then(|i| args.get(i + 1))
        .context("missing required --input <ratings.csv>")?;

    let top_n: usize = args
        .iter()
        .position(|a| a == "--top")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let enhanced = args.iter().any(|a| a == "--enhanced");

    let dataset = parse_dataset(input)?;

    let mut config = EngineConfig::default();
    config.rtsi.enhanced = enhanced;
    config.msci.use_enhanced = enhanced;

    let engine = AnalysisEngine::new(config, dataset);
    let results = engine.calculate_all_metrics("cli-run", true)?;

    println!(
        "analyzed {} stocks across {} industries in {:.3}s",
        results.metadata.total_stocks, results.metadata.total_industries, results.metadata.calculation_time_s
    );
    println!(
        "market: {:?} (value {:.1}, risk {:?})",
        results.market.market_state(),
        results.market.current_value(),
        results.market.risk_level()
    );

    println!("\ntop {top_n} stocks by RTSI:");
    for stock in engine.top_stocks(StockMetric::Rtsi, top_n) {
        println!("  {:<10} {:>6.2}  {}", stock.code, stock.value, stock.name);
    }

    println!("\ntop {top_n} industries by IRSI:");
    for industry in engine.top_industries(top_n) {
        println!("  {:<20} {:>6.2}", industry.label, industry.value);
    }

    let signals = engine.detect_trend_changes();
    println!("\n{} trend signal(s) detected", signals.len());

    println!("\n{}", serde_json::to_string_pretty(&*results)?);

    Ok(())
}
