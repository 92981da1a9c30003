/// Configuration for the API server
///
/// Loaded once at startup from environment variables (and a `.env` file when
/// present).
///
/// # Environment Variables
///
/// | Variable | Default |
/// |----------|---------|
/// | `DATABASE_URL` | required |
/// | `DATABASE_MAX_CONNECTIONS` | 10 |
/// | `DATABASE_MIN_CONNECTIONS` | 1 |
/// | `DATABASE_IDLE_TIMEOUT_SECONDS` | 600 |
/// | `DATABASE_MAX_LIFETIME_SECONDS` | 1800 |
/// | `JWT_SECRET` | required, at least 32 characters |
/// | `API_HOST` | 0.0.0.0 |
/// | `API_PORT` | 8080 |
/// | `CORS_ORIGINS` | `*` (comma separated) |
/// | `POSTAL_LOOKUP_URL` | `https://viacep.com.br` |
/// | `POSTAL_LOOKUP_TIMEOUT_SECONDS` | 5 |
/// | `RUN_MIGRATIONS` | true |
/// | `RUST_LOG` | `ava_api=debug,ava_shared=debug,tower_http=debug` |
/// | `LOG_FORMAT` | text; `json` for JSON lines |
///
/// # Example
///
/// ```no_run
/// use ava_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::{bail, Context};
use ava_shared::db::pool::DatabaseConfig;
use std::{env, str::FromStr, time::Duration};

/// Minimum accepted signing secret length
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub postal: PostalConfig,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HS256 secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"<redacted>").finish()
    }
}

/// Outbound postal lookup configuration
#[derive(Debug, Clone)]
pub struct PostalConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or `JWT_SECRET` is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 1)?,
                idle_timeout_seconds: Some(parse_or(&lookup, "DATABASE_IDLE_TIMEOUT_SECONDS", 600)?),
                max_lifetime_seconds: Some(parse_or(&lookup, "DATABASE_MAX_LIFETIME_SECONDS", 1800)?),
                ..Default::default()
            },
            jwt: JwtConfig { secret: jwt_secret },
            postal: PostalConfig {
                base_url: lookup("POSTAL_LOOKUP_URL").unwrap_or_else(|| "https://viacep.com.br".to_string()),
                timeout: Duration::from_secs(parse_or(&lookup, "POSTAL_LOOKUP_TIMEOUT_SECONDS", 5)?),
            },
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/ava"), ("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.idle_timeout_seconds, Some(600));
        assert_eq!(config.database.max_lifetime_seconds, Some(1800));
        assert_eq!(config.postal.base_url, "https://viacep.com.br");
        assert_eq!(config.postal.timeout, Duration::from_secs(5));
        assert!(config.run_migrations);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/ava"),
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("CORS_ORIGINS", "https://admin.example.com, https://ava.example.com"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("RUN_MIGRATIONS", "false"),
            ("POSTAL_LOOKUP_TIMEOUT_SECONDS", "2"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://admin.example.com", "https://ava.example.com"]
        );
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.postal.timeout, Duration::from_secs(2));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_required_variables() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/ava")]).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[("DATABASE_URL", "postgresql://localhost/ava"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/ava"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/ava"), ("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
