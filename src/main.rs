use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use serde_json::{json, Value};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

use scanlabel::cli::{parse_args, Command};
use scanlabel::config::Settings;
use scanlabel::food_table::FoodTable;
use scanlabel::health_classifier::{load_model, HealthClassifier, HealthModel};
use scanlabel::recommender::{AlternativeRecommender, RecommendationRequest};
use scanlabel::report::{build_report, report_for_food};

/// Installs the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`; output
/// goes to stderr so stdout carries only JSON.
fn init_tracing(log_level: &str) {
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_classifier(model_path: &Path) -> HealthClassifier {
    let model = load_model(model_path).map(|m| Arc::new(m) as Arc<dyn HealthModel>);
    if model.is_none() {
        warn!("Classifying with threshold rules only");
    }
    HealthClassifier::new(model)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("'{}' is not valid JSON", path.display()))
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn summarize_payload(path: &Path, classifier: &HealthClassifier) -> String {
    let outcome = std::fs::read_to_string(path)
        .map_err(|e| anyhow!(e))
        .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| anyhow!(e)))
        .and_then(|raw| build_report(&raw, classifier).map_err(|e| anyhow!(e)));

    match outcome {
        Ok(report) => format!(
            "{}: {} ({}) score {:.1}",
            path.display(),
            report.product.product_name,
            report.health_level,
            report.nutrition_score
        ),
        Err(e) => format!("{}: error: {}", path.display(), e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    let mut settings = Settings::from_env().context("Invalid configuration")?;
    if let Some(model) = cli.model {
        settings.model_path = model;
    }

    init_tracing(&settings.log_level);
    settings.log_summary();

    match cli.command {
        Command::Analyze {
            payload,
            with_alternatives,
        } => {
            let raw = read_json(&payload).await?;
            let classifier = load_classifier(&settings.model_path);
            let report = build_report(&raw, &classifier)
                .with_context(|| format!("Cannot analyze '{}'", payload.display()))?;

            if with_alternatives {
                let recommender = AlternativeRecommender::from_settings(&settings);
                let alternatives = recommender
                    .recommend(&RecommendationRequest::from_report(&report))
                    .await;
                print_json(&json!({ "report": report, "alternatives": alternatives }))?;
            } else {
                print_json(&report)?;
            }
        }
        Command::Recommend { request } => {
            let raw = read_json(&request).await?;
            let request: RecommendationRequest = serde_json::from_value(raw)
                .context("Request must contain product_name, nutrition and health_level")?;
            let recommender = AlternativeRecommender::from_settings(&settings);
            let alternatives = recommender.recommend(&request).await;
            info!(source = ?alternatives.source, "Recommendations ready");
            print_json(&alternatives)?;
        }
        Command::Lookup { food } => {
            let classifier = load_classifier(&settings.model_path);
            let Some(report) = report_for_food(&food, FoodTable::builtin(), &classifier) else {
                bail!("No nutrition data found for '{}'", food);
            };
            print_json(&report)?;
        }
        Command::Batch { dir } => {
            let paths = json_files(&dir)?;
            info!("Analyzing {} payloads from {}", paths.len(), dir.display());
            let classifier = load_classifier(&settings.model_path);
            let lines: Vec<String> = paths
                .par_iter()
                .map(|path| summarize_payload(path, &classifier))
                .collect();
            for line in lines {
                println!("{}", line);
            }
        }
        Command::Status => {
            let classifier = load_classifier(&settings.model_path);
            print_json(&json!({
                "status": "healthy",
                "model_loaded": classifier.has_model(),
                "model_path": settings.model_path,
                "ai_configured": settings.has_api_key(),
                "ai_model": settings.openrouter_model,
            }))?;
        }
    }

    Ok(())
}
