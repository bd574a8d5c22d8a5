use anyhow::Result;
use clap::{Parser, Subcommand};
use engine::bootstrap::fit_and_save;
use engine::persist::{load, ModelPaths};
use engine::{EngineConfig, FacetFilters, FittedModel, RecommendQuery, RecordId};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Train and inspect the exercise recommendation model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model from a CSV, JSON or JSONL corpus and save it
    Build {
        /// Corpus file (CSV, JSON array or JSONL)
        #[arg(long, env = "EXERCISE_CORPUS")]
        input: PathBuf,
        /// Output model directory
        #[arg(long, env = "MODEL_DIR", default_value = "./model")]
        output: PathBuf,
        /// Optional YAML or JSON params file overriding vectorizer settings
        #[arg(long)]
        params: Option<PathBuf>,
        /// Where to write training metrics
        #[arg(long, default_value = "./metrics.json")]
        metrics: PathBuf,
    },
    /// Recommend exercises from a saved model
    Recommend {
        #[arg(long, env = "MODEL_DIR", default_value = "./model")]
        model: PathBuf,
        #[arg(long)]
        body_part: Option<String>,
        #[arg(long)]
        equipment: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        exercise_type: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Title to exclude (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// List exercises similar to one record
    Similar {
        #[arg(long, env = "MODEL_DIR", default_value = "./model")]
        model: PathBuf,
        #[arg(long)]
        id: RecordId,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct Metrics {
    num_exercises: usize,
    vocabulary_size: usize,
    matrix_shape: [usize; 2],
    test_recommendations_count: usize,
    timestamp: String,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, params, metrics } => build(&input, &output, params.as_deref(), &metrics),
        Commands::Recommend { model, body_part, equipment, level, exercise_type, limit, exclude } => {
            let model = load(&ModelPaths::new(&model))?;
            let query = RecommendQuery {
                filters: FacetFilters { target_area: body_part, equipment, level, category: exercise_type },
                exclude_titles: exclude,
                limit,
            };
            println!("{}", serde_json::to_string_pretty(&model.recommend(&query))?);
            Ok(())
        }
        Commands::Similar { model, id, limit } => {
            let model = load(&ModelPaths::new(&model))?;
            println!("{}", serde_json::to_string_pretty(&model.similar(id, limit)?)?);
            Ok(())
        }
    }
}

fn build(input: &Path, output: &Path, params: Option<&Path>, metrics_path: &Path) -> Result<()> {
    let config = match params {
        Some(p) => EngineConfig::from_file(p)?,
        None => EngineConfig::default(),
    };
    let model = fit_and_save(input, output, &config)?;
    let metrics = training_metrics(&model);
    if let Some(dir) = metrics_path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(metrics_path, serde_json::to_string_pretty(&metrics)?)?;
    tracing::info!(
        output = %output.display(),
        num_exercises = metrics.num_exercises,
        vocabulary_size = metrics.vocabulary_size,
        "model build complete"
    );
    Ok(())
}

/// Shape of the fitted model plus a smoke-test query against it.
fn training_metrics(model: &FittedModel) -> Metrics {
    let (rows, cols) = model.shape();
    let smoke = RecommendQuery {
        filters: FacetFilters { target_area: Some("Chest".into()), ..Default::default() },
        limit: 5,
        ..Default::default()
    };
    Metrics {
        num_exercises: model.len(),
        vocabulary_size: cols,
        matrix_shape: [rows, cols],
        test_recommendations_count: model.recommend(&smoke).len(),
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
    }
}
