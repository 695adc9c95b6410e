use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

#[derive(Parser, Debug)]
#[command(name = "escrowd", about = "Credit escrow service for paid AI-generation operations")]
pub struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "ESCROWD_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Postgres connection string
    pub database_url: String,
    #[serde(default)]
    pub escrow: EscrowConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EscrowConfig {
    /// How long a caller gets to settle a reservation before the sweep may
    /// force-refund it
    #[serde(with = "humantime_serde", default = "default_grace_period")]
    pub grace_period: Duration,
    /// Maximum stale reservations processed per sweep invocation
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: i64,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
            sweep_batch_size: default_sweep_batch_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_grace_period() -> Duration {
    crate::db::handlers::escrow::DEFAULT_GRACE_PERIOD
}

fn default_sweep_batch_size() -> i64 {
    crate::db::handlers::escrow::DEFAULT_SWEEP_BATCH_SIZE
}

impl Config {
    /// Layered load: YAML file (if given) overridden by ESCROWD_* environment
    /// variables, nested keys separated by "__" (e.g. ESCROWD_ESCROW__GRACE_PERIOD).
    pub fn load(args: &Args) -> figment::error::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = &args.config {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed("ESCROWD_").split("__")).extract()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
