// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Number of attempts re-scored concurrently by batch operations when
/// `SCORING_BATCH_CONCURRENCY` is not set.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub batch_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let batch_concurrency = env::var("SCORING_BATCH_CONCURRENCY")
            .ok()
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY);

        Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
            batch_concurrency,
        }
    }
}
