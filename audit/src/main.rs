use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use churn_core::{ChurnPredictor, SchemaAudit};
use clap::Parser;

#[derive(Parser)]
#[command(name = "churn-audit")]
#[command(about = "Inspect a churn classifier artifact and check its feature schema")]
struct Args {
    /// Path to the classifier artifact (.json)
    #[arg(short, long, env = "CHURN_MODEL_PATH")]
    file: PathBuf,

    /// Expected SHA-256 fingerprint of the artifact (optional, for validation)
    #[arg(short, long)]
    expected: Option<String>,

    /// Fail when the schema is missing sentinel or numeric columns
    #[arg(short, long)]
    strict: bool,

    /// List every schema column
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    println!("🔍 Churn Model Audit");
    println!("═══════════════════");
    println!("📁 Reading artifact: {}", args.file.display());

    let predictor = ChurnPredictor::load(&args.file)?;
    let model = predictor.model();

    println!("🔧 Model kind: {}", model.kind());
    println!("🔑 Fingerprint: {}", model.fingerprint());

    if let Some(expected) = &args.expected {
        if model.fingerprint().eq_ignore_ascii_case(expected.trim()) {
            println!("✅ Fingerprint matches expected value");
        } else {
            println!("❌ Fingerprint does not match expected value: {}", expected);
            return Ok(ExitCode::FAILURE);
        }
    }

    let schema = match predictor.schema() {
        Ok(schema) => schema,
        Err(e) => {
            println!("❌ {}", e);
            println!("   Every prediction with this artifact will be refused.");
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("📋 Trained schema: {} features", schema.len());

    if args.verbose {
        for (i, name) in schema.names().iter().enumerate() {
            println!("   {:>3}  {}", i, name);
        }
    }

    let audit = predictor
        .audit()
        .cloned()
        .unwrap_or_else(|| SchemaAudit::inspect(schema));
    report(&audit);

    let blocking = !audit.missing_sentinels.is_empty() || !audit.missing_numeric.is_empty();
    if args.strict && blocking {
        println!("\n❌ Strict audit failed");
        return Ok(ExitCode::FAILURE);
    }

    if audit.is_complete() {
        println!("\n🏆 Schema covers every attribute the form can produce.");
    } else {
        println!("\n⚠️  Schema has gaps; affected indicators are dropped at scoring time.");
    }

    Ok(ExitCode::SUCCESS)
}

fn report(audit: &SchemaAudit) {
    section("Missing numeric columns", &audit.missing_numeric);
    section("Missing sentinel columns", &audit.missing_sentinels);

    let other: Vec<String> = audit
        .unknown_columns
        .iter()
        .filter(|c| !audit.missing_sentinels.contains(c))
        .cloned()
        .collect();
    section("Other categorical columns the schema lacks", &other);
    section("Schema columns no customer can produce", &audit.unreachable_columns);
}

fn section(title: &str, columns: &[String]) {
    if columns.is_empty() {
        println!("✅ {}: none", title);
        return;
    }
    println!("⚠️  {}: {}", title, columns.len());
    for column in columns {
        println!("   • {}", column);
    }
}
