//! CLI options.

use std::path::PathBuf;

use clap::Parser;

use crate::prelude::*;

pub fn parse() -> Opts {
    Opts::parse()
}

/// Simple linear regression web service
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Opts {
    /// Sentry DSN
    #[arg(short, long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Sentry performance monitoring sample rate
    #[arg(
        long,
        env = "REGRESSION_API_TRACES_SAMPLE_RATE",
        default_value = "0",
        value_parser = parse_sample_rate,
    )]
    pub traces_sample_rate: f32,

    /// Web application bind host
    #[arg(long, env = "REGRESSION_API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Web application bind port
    #[arg(short, long, env = "REGRESSION_API_PORT", default_value = "8000")]
    pub port: u16,

    /// Where the trained model is stored
    #[arg(short, long, env = "REGRESSION_API_MODEL_PATH", default_value = "model.json")]
    pub model_path: PathBuf,

    /// How long to wait for in-flight requests on shutdown
    #[arg(
        long,
        env = "REGRESSION_API_SHUTDOWN_TIMEOUT",
        default_value = "5s",
        value_parser = humantime::parse_duration,
    )]
    pub shutdown_timeout: StdDuration,
}

fn parse_sample_rate(value: &str) -> Result<f32> {
    match value.parse::<f32>()? {
        rate if (0.0..=1.0).contains(&rate) => Ok(rate),
        rate => Err(anyhow!("{} is not within [0, 1]", rate)),
    }
}
