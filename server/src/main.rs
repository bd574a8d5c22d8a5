use anyhow::Result;
use clap::Parser;
use engine::bootstrap::load_or_fit;
use engine::{EngineConfig, LoadPolicy, Recommender};
use server::{build_app, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Model directory path
    #[arg(long, env = "MODEL_DIR", default_value = "./model")]
    model: PathBuf,
    /// Corpus used when the model has to be (re)fitted
    #[arg(long, env = "EXERCISE_CORPUS")]
    corpus: Option<PathBuf>,
    /// Optional YAML or JSON params file
    #[arg(long)]
    params: Option<PathBuf>,
    /// What to do when the saved model is missing or corrupt: refit or fail
    #[arg(long, env = "LOAD_POLICY")]
    load_policy: Option<LoadPolicy>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut config = match &args.params {
        Some(p) => EngineConfig::from_file(p)?,
        None => EngineConfig::default(),
    };
    if let Some(policy) = args.load_policy {
        config.load_policy = policy;
    }

    let recommender = Arc::new(Recommender::new());
    let state = AppState {
        recommender: recommender.clone(),
        model_dir: args.model.clone(),
        corpus: args.corpus.clone(),
        config: config.clone(),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };

    // Requests arriving before the model is installed get 503.
    let bootstrap = tokio::task::spawn_blocking(move || {
        recommender.initialize(|| load_or_fit(&args.model, args.corpus.as_deref(), &config))
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    let server = tokio::spawn(async move { axum::serve(listener, build_app(state)).await });

    match bootstrap.await? {
        Ok(model) => tracing::info!(num_exercises = model.len(), "model ready"),
        Err(e) => {
            server.abort();
            return Err(anyhow::anyhow!("cannot start without a model: {e}"));
        }
    }
    server.await??;
    Ok(())
}
