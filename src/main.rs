use anyhow::Result;
use clap::Parser;
use std::io::Write;
use tracing::{error, info};

mod artifacts;
mod chase;
mod config;
mod dashboard;

use artifacts::ArtifactCache;
use chase::{render, PredictError, Predictor};
use config::{Command, Config, PredictArgs};
use dashboard::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    // Nothing is usable without all three artifacts, so load them up front.
    let cache = ArtifactCache::new(&config.artifacts_dir);
    let store = match cache.get().await {
        Ok(store) => store,
        Err(e) => {
            error!("Could not load required files from {}", cache.dir().display());
            for file in e.files() {
                error!("  unavailable: {}", file);
            }
            anyhow::bail!(e);
        }
    };

    match config.command() {
        Command::Serve => {
            let app = dashboard::router(AppState { artifacts: cache });
            let addr = config.listen_addr()?;
            info!("Dashboard listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Predict(args) => {
            run_once(&Predictor::new(store), &args, &mut std::io::stdout().lock())?
        }
    }

    Ok(())
}

/// Score one state from the command line and write the report to `out`.
/// Validation problems go to stderr and fail the command.
fn run_once(predictor: &Predictor, args: &PredictArgs, out: &mut impl Write) -> Result<()> {
    let state = args.match_state();
    let prediction = match predictor.evaluate(&state) {
        Ok(p) => p,
        Err(PredictError::Invalid(problems)) => {
            for problem in &problems {
                eprintln!("error: {}", problem);
            }
            anyhow::bail!("{} invalid input(s)", problems.len());
        }
        Err(e @ PredictError::Inference(_)) => return Err(e.into()),
    };

    let report = render(&prediction);
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(out, "{}", report)?;
    if args.debug {
        writeln!(out)?;
        match &report.model_input {
            Some(row) => writeln!(out, "Model input: {}", serde_json::to_string(row)?)?,
            None => writeln!(
                out,
                "Model input: none ({} not consulted)",
                predictor.store().classifier().name()
            )?,
        }
    }
    Ok(())
}
