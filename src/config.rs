//! Environment-supplied configuration
//!
//! Every value has a logged default except secrets, which stay unset when
//! absent. Secrets may be given inline (`NAME`) or as a file path
//! (`NAME_FILE`), as container secret mounts do.

use crate::error::{AppError, Result};
use crate::mail::{MailRouting, SmtpConfig};
use crate::store::{FirestoreConfig, DEFAULT_BASE_URL};
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Deployment mode; development exposes transport error details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "production" | "prod" => Ok(RunMode::Production),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Which document store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// What the scheduled-report endpoint does with a bad shared secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronAuthPolicy {
    /// Refuse the call with 401
    Reject,
    /// Log a warning and send anyway
    Warn,
}

impl FromStr for CronAuthPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(CronAuthPolicy::Reject),
            "warn" => Ok(CronAuthPolicy::Warn),
            other => Err(format!("unknown policy '{}'", other)),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Store selection and connection
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub firestore: Option<FirestoreConfig>,
}

/// Mail relay and addressing
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp: SmtpConfig,
    pub routing: MailRouting,
    pub dry_run: bool,
}

/// Scheduled report settings
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub cron_secret: Option<String>,
    pub auth_policy: CronAuthPolicy,
    pub daily_enabled: bool,
    pub daily_time: NaiveTime,
    pub timezone: Tz,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: RunMode,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub mail: MailConfig,
    pub schedule: ScheduleConfig,
    pub page_size: usize,
}

impl AppConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let backend: StoreBackend = env.try_load("STORE_BACKEND", "firestore")?;
        let firestore = match backend {
            StoreBackend::Firestore => Some(FirestoreConfig {
                base_url: env.try_load("FIRESTORE_BASE_URL", DEFAULT_BASE_URL)?,
                project_id: env.required("FIRESTORE_PROJECT_ID")?,
                database: env.try_load("FIRESTORE_DATABASE", "(default)")?,
                api_key: env.secret("FIRESTORE_API_KEY")?,
                bearer_token: env.secret("FIRESTORE_BEARER_TOKEN")?,
                poll_interval: Duration::from_secs(env.try_load::<u64>("FIRESTORE_POLL_SECS", "5")?.max(1)),
            }),
            StoreBackend::Memory => None,
        };

        let daily_time: String = env.try_load("DAILY_REPORT_TIME", "22:20")?;
        let daily_time = NaiveTime::parse_from_str(&daily_time, "%H:%M")
            .map_err(|e| AppError::Config(format!("Invalid DAILY_REPORT_TIME value: {}", e)))?;

        let timezone: String = env.try_load("DAILY_REPORT_TZ", "Europe/Bucharest")?;
        let timezone: Tz = timezone
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid DAILY_REPORT_TZ value: {}", e)))?;

        Ok(Self {
            mode: env.try_load("APP_ENV", "production")?,
            server: ServerConfig {
                host: env.try_load("HOST", "0.0.0.0")?,
                port: env.try_load("PORT", "3000")?,
            },
            store: StoreConfig { backend, firestore },
            mail: MailConfig {
                smtp: SmtpConfig {
                    host: env.try_load("SMTP_HOST", "smtp-relay.brevo.com")?,
                    port: env.try_load("SMTP_PORT", "587")?,
                    username: env.optional("SMTP_USERNAME"),
                    password: env.secret("SMTP_PASSWORD")?,
                },
                routing: MailRouting {
                    from: env.optional("MAIL_FROM"),
                    to: env.optional("MAIL_TO"),
                },
                dry_run: env.try_load("MAIL_DRY_RUN", "false")?,
            },
            schedule: ScheduleConfig {
                cron_secret: env.secret("CRON_SECRET")?,
                auth_policy: env.try_load("CRON_AUTH_POLICY", "reject")?,
                daily_enabled: env.try_load("DAILY_REPORT_ENABLED", "false")?,
                daily_time,
                timezone,
            },
            page_size: env.try_load::<usize>("PAGE_SIZE", "15")?.max(1),
        })
    }

    pub fn is_development(&self) -> bool {
        self.mode == RunMode::Development
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.var(key).map(|v| v.trim().to_string())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
    }

    fn try_load<T: FromStr>(&self, key: &str, default: &str) -> Result<T>
    where
        T::Err: Display,
    {
        let raw = self.var(key).unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        });

        raw.trim().parse().map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Config(format!("Invalid {} value: {}", key, e))
        })
    }

    /// Inline value first, then the file named by `<key>_FILE`
    fn secret(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.optional(key) {
            return Ok(Some(value));
        }

        let file_key = format!("{}_FILE", key);
        let Some(path) = self.optional(&file_key) else {
            return Ok(None);
        };

        let value = std::fs::read_to_string(&path).map_err(|e| {
            warn!("Failed to read {key} from file: {e}");
            AppError::Config(format!("Cannot read {} ({}): {}", file_key, path, e))
        })?;

        Ok(Some(value.trim().to_string()).filter(|v| !v.is_empty()))
    }
}
