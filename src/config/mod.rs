//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::listing::ListingConfig;

const LOCAL_CONFIG_BASENAME: &str = "edicola";
const ENV_PREFIX: &str = "EDICOLA";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_LISTING_PAGE_SIZE: u32 = 2;
const DEFAULT_LISTING_TTL_SECS: u64 = 300;

/// Command-line arguments for the Edicola binary.
#[derive(Debug, Default, Parser)]
#[command(name = "edicola", version, about = "Edicola article server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "EDICOLA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the database connection URL.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the shared cache URL; without one, a process-local cache is used.
    #[arg(long = "cache-url", value_name = "URL")]
    pub cache_url: Option<String>,

    /// Override the listing page size.
    #[arg(long = "listing-page-size", value_name = "N")]
    pub listing_page_size: Option<u32>,

    /// Override the listing cache TTL in seconds.
    #[arg(long = "listing-ttl-secs", value_name = "SECS")]
    pub listing_ttl_secs: Option<u64>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Override the log format (json, compact).
    #[arg(long = "log-format", value_name = "FORMAT")]
    pub log_format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub listing: ListingSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

#[derive(Debug, Clone, Copy)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Redis URL of the shared cache; `None` selects the in-memory driver.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ListingSettings {
    pub page_size: NonZeroU32,
    pub ttl: Duration,
}

impl ListingSettings {
    pub fn listing_config(&self) -> ListingConfig {
        ListingConfig {
            page_size: self.page_size,
            ttl: self.ttl,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid configuration value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl LoadError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    listing: RawListingSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCacheSettings {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListingSettings {
    page_size: Option<u32>,
    ttl_secs: Option<u64>,
}

/// Load settings with layered precedence: configuration file, then
/// `EDICOLA__*` environment variables, then CLI flags.
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder();

    builder = match &cli.config_file {
        Some(path) => builder.add_source(File::from(path.as_path())),
        None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
    };

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    build_settings(raw, &cli.overrides)
}

fn build_settings(raw: RawSettings, overrides: &Overrides) -> Result<Settings, LoadError> {
    let host = overrides
        .server_host
        .clone()
        .or(raw.server.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = overrides
        .server_port
        .or(raw.server.port)
        .unwrap_or(DEFAULT_PORT);
    let bind = SocketAddr::from_str(&format!("{host}:{port}"))
        .map_err(|err| LoadError::invalid("server.host", err.to_string()))?;

    let logging = build_logging_settings(raw.logging, overrides)?;

    let url = overrides
        .database_url
        .clone()
        .or(raw.database.url)
        .ok_or_else(|| LoadError::invalid("database.url", "no database URL configured"))?;
    let max_connections = raw
        .database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_connections)
        .ok_or_else(|| LoadError::invalid("database.max_connections", "must be nonzero"))?;

    let cache = CacheSettings {
        url: overrides.cache_url.clone().or(raw.cache.url),
    };

    let page_size = overrides
        .listing_page_size
        .or(raw.listing.page_size)
        .unwrap_or(DEFAULT_LISTING_PAGE_SIZE);
    let page_size = NonZeroU32::new(page_size)
        .ok_or_else(|| LoadError::invalid("listing.page_size", "must be nonzero"))?;

    let ttl_secs = overrides
        .listing_ttl_secs
        .or(raw.listing.ttl_secs)
        .unwrap_or(DEFAULT_LISTING_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid("listing.ttl_secs", "must be nonzero"));
    }

    Ok(Settings {
        server: ServerSettings { bind },
        logging,
        database: DatabaseSettings {
            url,
            max_connections,
        },
        cache,
        listing: ListingSettings {
            page_size,
            ttl: Duration::from_secs(ttl_secs),
        },
    })
}

fn build_logging_settings(
    raw: RawLoggingSettings,
    overrides: &Overrides,
) -> Result<LoggingSettings, LoadError> {
    let level = match overrides.log_level.clone().or(raw.level) {
        Some(value) => LevelFilter::from_str(&value)
            .map_err(|err| LoadError::invalid("logging.level", err.to_string()))?,
        None => LevelFilter::INFO,
    };

    let format = match overrides
        .log_format
        .clone()
        .or(raw.format)
        .as_deref()
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        None | Some("compact") => LogFormat::Compact,
        Some("json") => LogFormat::Json,
        Some(other) => {
            return Err(LoadError::invalid(
                "logging.format",
                format!("unknown format `{other}`, expected `json` or `compact`"),
            ));
        }
    };

    Ok(LoggingSettings { level, format })
}
