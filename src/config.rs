//! Service configuration, read from the environment once at startup.
//!
//! Settings are grouped by the component that consumes them. Each group
//! reads its own variables and rejects invalid values while loading, so a
//! [`Config`] that exists is a usable one.
//!
//! | Group | Variables |
//! |---|---|
//! | [`HttpConfig`] | `LISTEN`, `BEHIND_PROXY` |
//! | [`LogConfig`] | `RUST_LOG`, `LOG_FORMAT` |
//! | [`DatabaseConfig`] | `DATABASE_URL` or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`, `DB_MAX_CONNECTIONS`, `DB_CONNECT_TIMEOUT`, `DB_IDLE_TIMEOUT`, `DB_MAX_LIFETIME`, `STORE_TIMEOUT_MS` |
//! | [`CacheConfig`] | `REDIS_URL` or `REDIS_HOST`/`REDIS_PORT`/`REDIS_DB`/`REDIS_PASSWORD`, `CACHE_TTL_SECONDS` |
//! | [`AuthMode`] | `TOKEN_SIGNING_SECRET`, `BYPASS_AUTH` |
//! | [`PageConfig`] | `PUBLIC_BASE_URL`, `DEFAULT_COUNTRY`, `VIEW_QUEUE_CAPACITY` |
//! | [`LookupConfig`] | `ODESLI_API_BASE`, `ODESLI_TIMEOUT_SECS` |
//!
//! Unset or blank variables take their defaults. A set variable that does
//! not parse is an error rather than a silent fallback.

use anyhow::{Context, Result, anyhow, bail, ensure};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ODESLI_API_BASE: &str = "https://api.song.link/v1-alpha.1";

/// Trimmed value of `name`, `None` when unset or blank.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{name}: cannot parse '{raw}': {e}")),
        None => Ok(default),
    }
}

fn seconds(name: &str, default: u64) -> Result<Duration> {
    let secs = parsed(name, default)?;
    ensure!(secs > 0, "{name} must be greater than 0");
    Ok(Duration::from_secs(secs))
}

fn flag(name: &str) -> bool {
    var(name).is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

/// Replaces the password of a connection URL with `***`.
fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => raw.to_string(),
    }
}

fn require_scheme(name: &str, raw: &str, schemes: &[&str]) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("{name} is not a valid URL"))?;
    ensure!(
        schemes.contains(&url.scheme()),
        "{name} must use one of {:?}, got '{}'",
        schemes,
        redact(raw)
    );
    Ok(())
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub listen: SocketAddr,
    /// Rate limit on `X-Forwarded-For`/`X-Real-IP` instead of the peer
    /// address. Only safe behind a trusted reverse proxy.
    pub behind_proxy: bool,
}

impl HttpConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            listen: parsed("LISTEN", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            behind_proxy: flag("BEHIND_PROXY"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
    pub format: LogFormat,
}

impl LogConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            filter: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            format: parsed("LOG_FORMAT", LogFormat::Text)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Upper bound for a single store call made on behalf of a request.
    pub store_timeout: Duration,
}

impl DatabaseConfig {
    /// Also used by the admin CLI, which shares the server's variables.
    pub fn from_env() -> Result<Self> {
        let url = match var("DATABASE_URL") {
            Some(url) => url,
            None => Self::url_from_parts()?,
        };
        require_scheme("DATABASE_URL", &url, &["postgres", "postgresql"])?;

        let max_connections = parsed("DB_MAX_CONNECTIONS", 10u32)?;
        ensure!(max_connections > 0, "DB_MAX_CONNECTIONS must be at least 1");

        let store_timeout_ms = parsed("STORE_TIMEOUT_MS", 5000u64)?;
        ensure!(store_timeout_ms > 0, "STORE_TIMEOUT_MS must be greater than 0");

        Ok(Self {
            url,
            max_connections,
            acquire_timeout: seconds("DB_CONNECT_TIMEOUT", 30)?,
            idle_timeout: seconds("DB_IDLE_TIMEOUT", 600)?,
            max_lifetime: seconds("DB_MAX_LIFETIME", 1800)?,
            store_timeout: Duration::from_millis(store_timeout_ms),
        })
    }

    fn url_from_parts() -> Result<String> {
        let required = |name: &str| {
            var(name).with_context(|| format!("{name} must be set when DATABASE_URL is not"))
        };
        let user = required("DB_USER")?;
        let password = required("DB_PASSWORD")?;
        let name = required("DB_NAME")?;
        let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
        let port: u16 = parsed("DB_PORT", 5432)?;

        Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `None` disables Redis; lookups then always reach the database.
    pub redis_url: Option<String>,
    pub ttl_seconds: u64,
}

impl CacheConfig {
    pub fn from_env() -> Result<Self> {
        let redis_url = Self::redis_url()?;
        if let Some(url) = &redis_url {
            require_scheme("REDIS_URL", url, &["redis", "rediss"])?;
        }

        let ttl_seconds = parsed("CACHE_TTL_SECONDS", 3600u64)?;
        ensure!(ttl_seconds > 0, "CACHE_TTL_SECONDS must be greater than 0");

        Ok(Self {
            redis_url,
            ttl_seconds,
        })
    }

    fn redis_url() -> Result<Option<String>> {
        if let Some(url) = var("REDIS_URL") {
            return Ok(Some(url));
        }
        let Some(host) = var("REDIS_HOST") else {
            return Ok(None);
        };
        let port: u16 = parsed("REDIS_PORT", 6379)?;
        let db: u32 = parsed("REDIS_DB", 0)?;

        let auth = var("REDIS_PASSWORD")
            .map(|password| format!(":{password}@"))
            .unwrap_or_default();
        Ok(Some(format!("redis://{auth}{host}:{port}/{db}")))
    }
}

/// How admin requests are authenticated.
#[derive(Clone)]
pub enum AuthMode {
    /// Bearer tokens, stored as HMACs keyed by this secret.
    Token { signing_secret: String },
    /// Every request runs as the development admin.
    Bypass,
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { .. } => f.write_str("Token { signing_secret: *** }"),
            Self::Bypass => f.write_str("Bypass"),
        }
    }
}

impl AuthMode {
    /// Bypass needs `BYPASS_AUTH` to be exactly `true` (any case); anything
    /// else falls through to token authentication.
    pub fn from_env() -> Result<Self> {
        if var("BYPASS_AUTH").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            return Ok(Self::Bypass);
        }
        let signing_secret = var("TOKEN_SIGNING_SECRET")
            .context("TOKEN_SIGNING_SECRET must be set unless BYPASS_AUTH=true")?;
        Ok(Self::Token { signing_secret })
    }
}

#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Base for canonical and share links. Derived from the request when unset.
    pub public_base_url: Option<String>,
    /// Visitor country when no geolocation header is present.
    pub default_country: String,
    pub view_queue_capacity: usize,
}

impl PageConfig {
    pub fn from_env() -> Result<Self> {
        let public_base_url = var("PUBLIC_BASE_URL")
            .map(|base| base.trim_end_matches('/').to_string());
        if let Some(base) = &public_base_url {
            require_scheme("PUBLIC_BASE_URL", base, &["http", "https"])?;
        }

        let default_country = var("DEFAULT_COUNTRY")
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| "FR".to_string());
        if default_country.len() != 2 || !default_country.bytes().all(|b| b.is_ascii_uppercase())
        {
            bail!("DEFAULT_COUNTRY must be a two-letter country code, got '{default_country}'");
        }

        let view_queue_capacity = parsed("VIEW_QUEUE_CAPACITY", 10_000usize)?;
        ensure!(
            (100..=1_000_000).contains(&view_queue_capacity),
            "VIEW_QUEUE_CAPACITY must be between 100 and 1000000, got {view_queue_capacity}"
        );

        Ok(Self {
            public_base_url,
            default_country,
            view_queue_capacity,
        })
    }
}

/// Platform link resolver (Odesli).
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub api_base: String,
    pub timeout: Duration,
}

impl LookupConfig {
    pub fn from_env() -> Result<Self> {
        let api_base = var("ODESLI_API_BASE").unwrap_or_else(|| DEFAULT_ODESLI_API_BASE.into());
        require_scheme("ODESLI_API_BASE", &api_base, &["http", "https"])?;
        Ok(Self {
            api_base,
            timeout: seconds("ODESLI_TIMEOUT_SECS", 10)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub log: LogConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthMode,
    pub pages: PageConfig,
    pub lookup: LookupConfig,
}

impl Config {
    /// Expects `.env` to be loaded already (`dotenvy::dotenv()` in `main.rs`).
    ///
    /// # Errors
    ///
    /// Names the first missing or invalid variable.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http: HttpConfig::from_env()?,
            log: LogConfig::from_env()?,
            database: DatabaseConfig::from_env().context("Invalid database configuration")?,
            cache: CacheConfig::from_env().context("Invalid cache configuration")?,
            auth: AuthMode::from_env()?,
            pages: PageConfig::from_env()?,
            lookup: LookupConfig::from_env()?,
        })
    }

    /// Logs the effective settings with credentials redacted.
    pub fn log_summary(&self) {
        tracing::info!(
            listen = %self.http.listen,
            behind_proxy = self.http.behind_proxy,
            log_format = ?self.log.format,
            "HTTP"
        );
        tracing::info!(
            url = %redact(&self.database.url),
            max_connections = self.database.max_connections,
            store_timeout_ms = self.database.store_timeout.as_millis() as u64,
            "Database"
        );
        match &self.cache.redis_url {
            Some(url) => tracing::info!(
                url = %redact(url),
                ttl_seconds = self.cache.ttl_seconds,
                "Cache"
            ),
            None => tracing::info!("Cache: disabled"),
        }
        tracing::info!(
            base_url = self.pages.public_base_url.as_deref().unwrap_or("(from request)"),
            default_country = %self.pages.default_country,
            view_queue_capacity = self.pages.view_queue_capacity,
            "Public pages"
        );
        tracing::info!(api_base = %self.lookup.api_base, "Link resolver");
        if matches!(self.auth, AuthMode::Bypass) {
            tracing::warn!("Authentication: BYPASSED (development only)");
        }
    }
}
