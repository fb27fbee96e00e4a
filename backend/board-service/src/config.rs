/// Configuration management for Board Service
///
/// Loaded from environment variables (optionally seeded from a `.env` file
/// by the binary).
use db_pool::env_utils::parse_env_strict;
use serde::{Deserialize, Serialize};

use crate::pagination::engine::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PAGE_SIZE_CEILING};
use crate::pagination::PageSizePolicy;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Activity paging limits
    pub pagination: PaginationConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when a first-page request names none
    pub default_page_size: u32,
    /// Upper bound for requested and cursor-carried page sizes
    pub max_page_size: u32,
}

impl From<&PaginationConfig> for PageSizePolicy {
    fn from(config: &PaginationConfig) -> Self {
        PageSizePolicy {
            default: config.default_page_size,
            max: config.max_page_size,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let config = Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("BOARD_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_strict("BOARD_SERVICE_PORT", 8090)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if is_production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if is_production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/boba".to_string()),
                max_connections: parse_env_strict("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_strict("DATABASE_MIN_CONNECTIONS", 2)?,
                acquire_timeout_secs: parse_env_strict("DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?,
                run_migrations: parse_env_strict("DATABASE_RUN_MIGRATIONS", !is_production)?,
            },
            pagination: PaginationConfig {
                default_page_size: parse_env_strict(
                    "ACTIVITY_DEFAULT_PAGE_SIZE",
                    DEFAULT_PAGE_SIZE,
                )?,
                max_page_size: parse_env_strict("ACTIVITY_MAX_PAGE_SIZE", MAX_PAGE_SIZE)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let pagination = &self.pagination;
        if pagination.max_page_size == 0 || pagination.max_page_size > PAGE_SIZE_CEILING {
            return Err(format!(
                "ACTIVITY_MAX_PAGE_SIZE must be between 1 and {}",
                PAGE_SIZE_CEILING
            ));
        }
        if pagination.default_page_size == 0
            || pagination.default_page_size > pagination.max_page_size
        {
            return Err(format!(
                "ACTIVITY_DEFAULT_PAGE_SIZE must be between 1 and {}",
                pagination.max_page_size
            ));
        }
        if self.database.max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be positive".to_string());
        }
        if self.database.min_connections > self.database.max_connections {
            return Err("DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS".to_string());
        }

        Ok(())
    }
}
