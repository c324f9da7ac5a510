//! Application configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Validation problems are collected
//! and reported together in a single startup error.

/// Top-level application configuration.
///
/// Loaded once at startup via [`AppConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment name (`development`, `production`, ...).
    pub app_env: String,

    /// TCP port the HTTP server binds to.
    pub port: u16,

    /// PostgreSQL connection string.
    pub database_url: String,

    /// Secret used to sign session cookies. At least 12 characters.
    pub session_secret: String,

    /// Default page size for hotel listings.
    pub hotels_page_size: u32,

    /// Maximum page size for hotel listings.
    pub hotels_page_max: u32,

    /// Default page size for booking listings.
    pub bookings_page_size: u32,

    /// Maximum page size for booking listings.
    pub bookings_page_max: u32,

    /// Master switch for the presence admission subsystem.
    pub presence_enabled: bool,

    /// Presence lease duration in seconds.
    pub presence_ttl_seconds: u64,

    /// Number of concurrent viewers admitted per hotel.
    pub presence_capacity: u32,

    /// Minimum interval between presence status/heartbeat calls per caller.
    pub presence_min_interval_seconds: u64,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns a single error enumerating every missing or out-of-range
    /// value, so a misconfigured deployment fails fast with the full
    /// picture.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let app_env = env_string("APP_ENV", "development");

        let config = Self {
            port: parse_env("PORT", 3000),
            database_url: env_string("DATABASE_URL", ""),
            session_secret: std::env::var("SESSION_SECRET").unwrap_or_default(),
            hotels_page_size: parse_env("HOTELS_PAGE_SIZE", 6),
            hotels_page_max: parse_env("HOTELS_PAGE_MAX_SIZE", 20),
            bookings_page_size: parse_env("BOOKINGS_PAGE_SIZE", 8),
            bookings_page_max: parse_env("BOOKINGS_PAGE_MAX_SIZE", 25),
            presence_enabled: parse_env_bool("PRESENCE_ENABLED", true),
            presence_ttl_seconds: parse_env("PRESENCE_TTL_SECONDS", 60),
            presence_capacity: parse_env("PRESENCE_CAPACITY", 1),
            presence_min_interval_seconds: parse_env("PRESENCE_MIN_INTERVAL_SECONDS", 2),
            app_env,
        };

        let mut problems = Vec::new();
        if config.database_url.is_empty() {
            problems.push("DATABASE_URL is required.");
        }
        if config.session_secret.len() < 12 {
            problems.push("SESSION_SECRET is required and must be at least 12 characters.");
        }
        if config.presence_ttl_seconds == 0 {
            problems.push("PRESENCE_TTL_SECONDS must be greater than 0.");
        }
        if config.presence_capacity == 0 {
            problems.push("PRESENCE_CAPACITY must be greater than 0.");
        }
        if config.presence_min_interval_seconds == 0 {
            problems.push("PRESENCE_MIN_INTERVAL_SECONDS must be greater than 0.");
        }

        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError { problems })
        }
    }

    /// Returns `true` when running with `APP_ENV=production`.
    ///
    /// Controls the `Secure` flag on cookies.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

/// Aggregated environment validation failure.
#[derive(Debug)]
pub struct ConfigError {
    problems: Vec<&'static str>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("environment validation failed:")?;
        for problem in &self.problems {
            write!(f, " {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

fn env_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"yes"`, `"on"` and their negations (case-insensitive). Returns
/// `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1" | "yes" | "on") => true,
        Some("false" | "0" | "no" | "off") => false,
        _ => default,
    }
}
