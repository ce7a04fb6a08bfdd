use crate::core::{AppError, Result};
use crate::modules::invoices::models::BusinessSnapshot;
use serde::Deserialize;
use std::env;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub business: BusinessConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
}

/// Issuing business identity, snapshotted onto generated invoices
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl BusinessConfig {
    pub fn snapshot(&self) -> BusinessSnapshot {
        BusinessSnapshot {
            name: self.name.clone(),
            address: self.address.clone(),
            gst_number: self.gst_number.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            business: BusinessConfig {
                name: env::var("BUSINESS_NAME")
                    .map_err(|_| AppError::Configuration("BUSINESS_NAME not set".to_string()))?,
                address: env::var("BUSINESS_ADDRESS").ok(),
                gst_number: env::var("BUSINESS_GST_NUMBER").ok(),
                phone: env::var("BUSINESS_PHONE").ok(),
                email: env::var("BUSINESS_EMAIL").ok(),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.business.name.trim().is_empty() {
            return Err(AppError::Configuration(
                "Business name cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(AppError::Configuration(
                "Server port must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
