use std::env;
use std::str::FromStr;

use chrono::Duration;

use crate::auth::password::{MAX_PASSWORD_COST, MIN_PASSWORD_COST};
use crate::error::AppError;

/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

pub struct Config {
    /// PostgreSQL connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| AppError::InternalServerError("JWT_SECRET must be set".into()))?;

        let jwt_ttl_minutes = parse_var("JWT_TTL_MINUTES", 60)?;
        if !(1..=MAX_JWT_TTL_MINUTES).contains(&jwt_ttl_minutes) {
            return Err(AppError::InternalServerError(format!(
                "JWT_TTL_MINUTES must be between 1 and {}",
                MAX_JWT_TTL_MINUTES
            )));
        }

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&bcrypt_cost) {
            return Err(AppError::InternalServerError(format!(
                "BCRYPT_COST must be between {} and {}",
                MIN_PASSWORD_COST, MAX_PASSWORD_COST
            )));
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            jwt_ttl_minutes,
            bcrypt_cost,
        })
    }

    /// Token lifetime. `from_env` keeps the minutes within `Duration`'s range.
    pub fn jwt_ttl(&self) -> Duration {
        Duration::minutes(self.jwt_ttl_minutes)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
