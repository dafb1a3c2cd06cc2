//! Configuration management.
//!
//! Settings come from environment variables with development defaults; a
//! `.env` file is honored in debug builds.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::Duration;

/// Deployment environment; selects the logging setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Local,
    Dev,
    Prod,
}

impl FromStr for AppEnv {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "local" => Ok(AppEnv::Local),
            "dev" => Ok(AppEnv::Dev),
            "prod" => Ok(AppEnv::Prod),
            other => bail!("unknown APP_ENV '{other}' (expected local, dev or prod)"),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub env: AppEnv,
    pub storage: StorageSettings,
    pub grpc: GrpcSettings,
    pub tokens: TokenSettings,
    pub kafka: KafkaSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "local".to_string())
            .parse()?;

        Ok(Settings {
            env,
            storage: StorageSettings::from_env()?,
            grpc: GrpcSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
            kafka: KafkaSettings::from_env()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Path of the SQLite database file.
    pub path: String,
}

impl StorageSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            path: env::var("STORAGE_PATH").unwrap_or_else(|_| "./sso.db".to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GrpcSettings {
    pub host: String,
    pub port: u16,
}

impl GrpcSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("GRPC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("GRPC_PORT")
                .unwrap_or_else(|_| "6004".to_string())
                .parse()
                .context("Invalid GRPC_PORT")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl TokenSettings {
    fn from_env() -> Result<Self> {
        let access_seconds: i64 = env::var("ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "600".to_string())
            .parse()
            .context("Invalid ACCESS_TOKEN_TTL_SECONDS")?;

        // 30 days by default.
        let refresh_seconds: i64 = env::var("REFRESH_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "2592000".to_string())
            .parse()
            .context("Invalid REFRESH_TOKEN_TTL_SECONDS")?;

        Ok(Self {
            access_token_ttl: Duration::seconds(access_seconds),
            refresh_token_ttl: Duration::seconds(refresh_seconds),
        })
    }
}

#[derive(Debug, Clone)]
pub struct KafkaSettings {
    pub address: Vec<String>,
    pub number_of_topics: usize,
}

impl KafkaSettings {
    fn from_env() -> Result<Self> {
        let address = env::var("KAFKA_ADDRESS")
            .unwrap_or_else(|_| "localhost:9092".to_string())
            .split(',')
            .map(|addr| addr.trim().to_string())
            .collect();

        let number_of_topics: usize = env::var("KAFKA_NUMBER_OF_TOPICS")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .context("Invalid KAFKA_NUMBER_OF_TOPICS")?;
        if number_of_topics == 0 {
            bail!("KAFKA_NUMBER_OF_TOPICS must be at least 1");
        }

        Ok(Self { address, number_of_topics })
    }
}
