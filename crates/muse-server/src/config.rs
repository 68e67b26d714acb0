use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{NaiveTime, TimeDelta};
use tracing::{info, warn};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: TimeDelta,
    pub rotate_at: NaiveTime,
    pub admin_init_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("MUSE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("MUSE_JWT_SECRET is unset or still a placeholder");
        }

        let admin_init_secret = env::var("ADMIN_INIT_SECRET").ok().filter(|s| !s.is_empty());
        if admin_init_secret.is_none() {
            warn!("ADMIN_INIT_SECRET not set, /admin/init is disabled");
        }

        let rotate_at = parse_time_of_day(&try_load::<String>("MUSE_ROTATE_AT", "00:00")?)?;
        let token_ttl = token_ttl(try_load("MUSE_TOKEN_TTL_HOURS", "720")?)?;

        Ok(Self {
            host: try_load("MUSE_HOST", "0.0.0.0")?,
            port: try_load("MUSE_PORT", "3000")?,
            db_path: try_load::<String>("MUSE_DB_PATH", "daily-muse.db")?.into(),
            jwt_secret,
            token_ttl,
            rotate_at,
            admin_init_secret,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("invalid {key} value '{raw}': {e}"))
}

fn token_ttl(hours: i64) -> Result<TimeDelta> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        bail!(
            "MUSE_TOKEN_TTL_HOURS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_HOURS,
            hours
        );
    }
    TimeDelta::try_hours(hours)
        .with_context(|| format!("MUSE_TOKEN_TTL_HOURS value {hours} is out of range"))
}

/// `HH:MM` or `HH:MM:SS`.
fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .with_context(|| format!("invalid MUSE_ROTATE_AT value '{raw}'"))
}
