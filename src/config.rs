use std::env;
use std::fmt;

use chrono::Duration;
use lettre::message::Mailbox;
use thiserror::Error;

use crate::utils::helpers::{DEFAULT_OTP_VALIDITY_SECONDS, MAX_OTP_VALIDITY_SECONDS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub service_name: String,
}

#[derive(Clone)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub enum StoreBackend {
    Appwrite(AppwriteConfig),
    Mongo { uri: String },
}

impl fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Appwrite(config) => f.debug_tuple("Appwrite").field(config).finish(),
            // connection strings usually embed credentials
            StoreBackend::Mongo { .. } => f.debug_struct("Mongo").field("uri", &"***").finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Appwrite database id, or the MongoDB database name
    pub database_id: String,
    pub collection_id: String,
}

/// SMTP relay settings
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: Mailbox,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("from", &self.from.to_string())
            .finish()
    }
}

/// Everything the process needs, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub smtp: SmtpConfig,
    pub otp_validity: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let server = ServerConfig {
            host: vars.or("HOST", "localhost"),
            port: vars.parsed_or("PORT", 8000)?,
            service_name: vars.or("SERVICE_NAME", "otp-issuer"),
        };

        let backend = match vars.or("STORE_BACKEND", "appwrite").as_str() {
            "appwrite" => StoreBackend::Appwrite(AppwriteConfig {
                endpoint: vars.required("APPWRITE_ENDPOINT")?,
                project_id: vars.required("APPWRITE_PROJECT_ID")?,
                api_key: vars.required("APPWRITE_API_KEY")?,
            }),
            "mongodb" => StoreBackend::Mongo {
                uri: vars.required("MONGODB_URI")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORE_BACKEND",
                    reason: format!("expected appwrite or mongodb, got {}", other),
                });
            }
        };

        let store = StoreConfig {
            backend,
            database_id: vars.required("DB_ID")?,
            collection_id: vars.required("OTP_COLLECTION_ID")?,
        };

        let from_name = vars.or("SMTP_FROM_NAME", "Leichtes Fahren");
        let from_email = vars.or("SMTP_FROM_EMAIL", "support@leichtesfahren.pro");
        let from = Mailbox::new(
            Some(from_name),
            from_email.parse().map_err(|e| ConfigError::Invalid {
                key: "SMTP_FROM_EMAIL",
                reason: format!("{}", e),
            })?,
        );

        let smtp = SmtpConfig {
            host: vars.or("SMTP_HOST", "smtp-relay.brevo.com"),
            port: vars.parsed_or("SMTP_PORT", 587)?,
            username: vars.required("SMTP_USER")?,
            password: vars.required("SMTP_PASS")?,
            from,
        };

        let validity_seconds: i64 =
            vars.parsed_or("OTP_VALIDITY_SECONDS", DEFAULT_OTP_VALIDITY_SECONDS)?;
        let otp_validity = Some(validity_seconds)
            .filter(|s| (1..=MAX_OTP_VALIDITY_SECONDS).contains(s))
            .and_then(Duration::try_seconds)
            .ok_or_else(|| ConfigError::Invalid {
                key: "OTP_VALIDITY_SECONDS",
                reason: format!("must be between 1 and {}", MAX_OTP_VALIDITY_SECONDS),
            })?;

        Ok(Self {
            server,
            store,
            smtp,
            otp_validity,
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}
