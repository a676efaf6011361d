/// Configuration management for filevault
use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
    /// Maximum accepted request body, in bytes
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    /// Root of the upload tree; storage keys resolve below it
    pub upload_root: PathBuf,
    /// First path segment of every generated storage key
    pub namespace: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in: u64,
    /// Emails granted ADMIN and SUPER_ADMIN when they sign up
    pub admin_emails: Vec<String>,
}

/// Ingest pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Upper bound for a single archiver or catalog step, in seconds
    pub timeout_secs: u64,
}

impl IngestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> VaultResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("VAULT_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("VAULT_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| VaultError::InvalidInput("Invalid port number".to_string()))?;
        let version = env::var("VAULT_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());
        let upload_limit = env::var("VAULT_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "10485760".to_string())
            .parse()
            .unwrap_or(10 * 1024 * 1024);

        let data_directory: PathBuf = env::var("VAULT_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("VAULT_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("filevault.sqlite"));
        let upload_root = env::var("VAULT_UPLOAD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));
        let namespace = env::var("VAULT_UPLOAD_NAMESPACE").unwrap_or_else(|_| "files".to_string());

        let jwt_secret = env::var("VAULT_JWT_SECRET")
            .map_err(|_| VaultError::InvalidInput("JWT secret required".to_string()))?;
        let jwt_expires_in = env::var("VAULT_JWT_EXPIRES_IN_SECS")
            .unwrap_or_else(|_| "7200".to_string())
            .parse()
            .unwrap_or(7200);

        let admin_emails = env::var("VAULT_ADMIN_EMAILS")
            .map(|v| parse_email_list(&v))
            .unwrap_or_default();

        let timeout_secs = env::var("VAULT_INGEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let level = env::var("VAULT_LOG_LEVEL")
            .unwrap_or_else(|_| "filevault=debug,tower_http=debug".to_string());
        let json = env::var("VAULT_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
                upload_limit,
            },
            storage: StorageConfig {
                data_directory,
                database,
                upload_root,
                namespace,
            },
            authentication: AuthConfig {
                jwt_secret,
                jwt_expires_in,
                admin_emails,
            },
            ingest: IngestConfig { timeout_secs },
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> VaultResult<()> {
        if self.service.hostname.is_empty() {
            return Err(VaultError::InvalidInput("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(VaultError::InvalidInput(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.ingest.timeout_secs == 0 {
            return Err(VaultError::InvalidInput(
                "Ingest timeout must be greater than zero".to_string(),
            ));
        }

        if self.storage.namespace.is_empty() || self.storage.namespace.contains("..") {
            return Err(VaultError::InvalidInput("Invalid upload namespace".to_string()));
        }

        Ok(())
    }

    /// Configuration rooted in a scratch directory, used by tests
    pub fn for_directory(dir: &std::path::Path) -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 0,
                version: env!("CARGO_PKG_VERSION").to_string(),
                upload_limit: 10 * 1024 * 1024,
            },
            storage: StorageConfig {
                data_directory: dir.join("data"),
                database: dir.join("data").join("filevault.sqlite"),
                upload_root: dir.join("uploads"),
                namespace: "files".to_string(),
            },
            authentication: AuthConfig {
                jwt_secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
                jwt_expires_in: 7200,
                admin_emails: Vec::new(),
            },
            ingest: IngestConfig { timeout_secs: 30 },
            logging: LoggingConfig {
                level: "filevault=debug".to_string(),
                json: false,
            },
        }
    }
}

/// Comma-separated emails, trimmed and lower-cased
fn parse_email_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}
