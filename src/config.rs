use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::chase::MatchState;

/// IPL run-chase win probability calculator
#[derive(Parser, Debug, Clone)]
#[command(name = "chase-predictor", version, about)]
pub struct Config {
    /// Directory holding team.json, city.json and model.json
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "artifacts", global = true)]
    pub artifacts_dir: PathBuf,

    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080", global = true)]
    pub dashboard_addr: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the prediction form and JSON API (default)
    Serve,
    /// Score a single match state and print the result
    Predict(PredictArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Batting (chasing) team
    #[arg(long)]
    pub batting: String,

    /// Bowling (defending) team
    #[arg(long)]
    pub bowling: String,

    /// Host city
    #[arg(long)]
    pub city: String,

    /// Target score
    #[arg(long, allow_negative_numbers = true)]
    pub target: i64,

    /// Current score
    #[arg(long, allow_negative_numbers = true)]
    pub score: i64,

    /// Overs completed (0–20)
    #[arg(long, allow_negative_numbers = true)]
    pub overs: i64,

    /// Wickets fallen (0–10)
    #[arg(long, allow_negative_numbers = true)]
    pub wickets: i64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the row sent to the classifier
    #[arg(long)]
    pub debug: bool,
}

impl PredictArgs {
    pub fn match_state(&self) -> MatchState {
        MatchState {
            batting_team: self.batting.clone(),
            bowling_team: self.bowling.clone(),
            city: self.city.clone(),
            target: self.target,
            score: self.score,
            overs_completed: self.overs,
            wickets_fallen: self.wickets,
        }
    }
}

impl Config {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.artifacts_dir.as_os_str().is_empty() {
            anyhow::bail!("artifacts_dir must not be empty");
        }
        if matches!(self.command(), Command::Serve) {
            self.listen_addr()?;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.dashboard_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid dashboard_addr '{}': {}", self.dashboard_addr, e))
    }
}
