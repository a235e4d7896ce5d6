use std::fs;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use churn_core::{ChurnPredictor, FormSelections, Summary};
use clap::Parser;
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "churn-predict")]
#[command(about = "Score one customer profile and print the result as JSON")]
struct Args {
    /// Path to the classifier artifact (.json)
    #[arg(short, long, env = "CHURN_MODEL_PATH", default_value = "models/churn_logistic.json")]
    model: PathBuf,

    /// Read the profile from a JSON file instead of the command line
    #[arg(short, long, conflicts_with = "inputs")]
    profile: Option<PathBuf>,

    /// Profile as inline JSON, e.g. '{"contract": "2 Years"}'. Missing
    /// fields take the form defaults.
    inputs: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    // Logs on stderr, result document on stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let total_start = Instant::now();

    let raw = match (&args.profile, &args.inputs) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?,
        (None, Some(inline)) => inline.clone(),
        (None, None) => "{}".to_string(),
    };
    // Out-of-range charges are rejected here, before the core sees them
    let form: FormSelections = serde_json::from_str(&raw).context("invalid profile")?;

    let load_start = Instant::now();
    let predictor = ChurnPredictor::load(&args.model)?;
    info!(elapsed = ?load_start.elapsed(), "model ready");

    let record = form.resolve();
    let report = predictor.predict(&record)?;
    let summary = Summary::new(&report.result, &record);
    info!(
        label = %report.result.label,
        percent = report.result.churn_percent(),
        "customer scored"
    );

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let output = json!({
        "timestamp": timestamp,
        "model_path": args.model,
        "model_fingerprint": predictor.model().fingerprint(),
        "model_kind": predictor.model().kind(),
        "threshold": predictor.model().threshold(),
        "inputs": form,
        "gates": form.gates(),
        "record": record,
        "prediction": report.result,
        "summary": summary,
        "dropped_features": report.dropped_features,
        "warnings": report.warnings,
        "total_time_ms": total_start.elapsed().as_millis() as u64,
    });

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    Ok(())
}
