use std::time::Duration;

use crate::cover::{COVERS_URL, OPENLIBRARY_URL};
use crate::error::ConfigError;

/// Startup settings, read once from the process environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	pub database_url: String,
	pub bind_addr: String,
	pub max_connections: u32,
	pub openlibrary_url: String,
	pub covers_url: String,
	/// `None` disables the lookup timeout.
	pub lookup_timeout: Option<Duration>,
	pub static_dir: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			database_url: "sqlite:bookshelf.db?mode=rwc".to_string(),
			bind_addr: "0.0.0.0:3000".to_string(),
			max_connections: 5,
			openlibrary_url: OPENLIBRARY_URL.to_string(),
			covers_url: COVERS_URL.to_string(),
			lookup_timeout: Some(Duration::from_secs(10)),
			static_dir: "public".to_string(),
		}
	}
}

impl Config {
	/// Loads `.env` if present, then reads the environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		if let Err(e) = dotenvy::dotenv() {
			if !e.not_found() {
				tracing::warn!("ignoring unreadable .env: {}", e);
			}
		}
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Same as [`Config::from_env`] over an arbitrary key source.
	pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Config::default();
		if let Some(v) = get("DATABASE_URL") {
			config.database_url = v;
		}
		if let Some(v) = get("BIND_ADDR") {
			config.bind_addr = v;
		}
		if let Some(v) = get("DB_MAX_CONNECTIONS") {
			config.max_connections = parse("DB_MAX_CONNECTIONS", v)?;
		}
		if let Some(v) = get("OPENLIBRARY_URL") {
			config.openlibrary_url = v;
		}
		if let Some(v) = get("COVERS_URL") {
			config.covers_url = v;
		}
		if let Some(v) = get("LOOKUP_TIMEOUT_SECS") {
			let secs: u64 = parse("LOOKUP_TIMEOUT_SECS", v)?;
			config.lookup_timeout = (secs > 0).then(|| Duration::from_secs(secs));
		}
		if let Some(v) = get("STATIC_DIR") {
			config.static_dir = v;
		}
		Ok(config)
	}
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
	value
		.trim()
		.parse()
		.map_err(|_| ConfigError::Invalid { key, value })
}
