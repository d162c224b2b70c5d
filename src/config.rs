use std::env;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::store::HostedConfig;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://planner.db?mode=rwc";

#[derive(Clone, Debug)]
pub enum BackendConfig {
    Sqlite { database_url: String },
    Hosted(HostedConfig),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let addr = env::var("PLANNER_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("PLANNER_ADDR is invalid: {}", e)))?;

        let backend = match env::var("PLANNER_BACKEND")
            .unwrap_or_else(|_| "sqlite".to_string())
            .as_str()
        {
            "sqlite" => BackendConfig::Sqlite {
                database_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            },
            "hosted" => BackendConfig::Hosted(HostedConfig::new_from_env()?),
            other => {
                return Err(AppError::Config(format!(
                    "PLANNER_BACKEND must be sqlite or hosted, got {}",
                    other
                )));
            }
        };

        Ok(Self { addr, backend })
    }
}
