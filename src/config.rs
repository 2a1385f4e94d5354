use std::net::SocketAddr;

/// Longest accepted session lifetime, ten years.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// Credentials for the admin account created at startup, if configured.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Server configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub environment: String,
    pub token_ttl_hours: i64,
    pub cors_origins: Vec<String>,
    /// Login attempts allowed per client IP per minute.
    pub login_rate_limit: u32,
    pub admin: Option<AdminBootstrap>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8002)),
            database_url: "sqlite://airwatch.db".to_string(),
            environment: "development".to_string(),
            token_ttl_hours: 24,
            cors_origins: vec!["http://localhost:5173".to_string()],
            login_rate_limit: 20,
            admin: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Unset variables fall back to [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => addr
                .parse()
                .map_err(|_| ConfigError::Invalid("LISTEN_ADDR", "must be a valid socket address"))?,
            Err(_) => defaults.listen_addr,
        };

        let environment = std::env::var("AIRWATCH_ENVIRONMENT").unwrap_or(defaults.environment);

        let token_ttl_hours = match std::env::var("AIRWATCH_TOKEN_TTL_HOURS") {
            Ok(hours) => parse_token_ttl(&hours)?,
            Err(_) => defaults.token_ttl_hours,
        };

        let cors_origins = match std::env::var("AIRWATCH_CORS_ORIGINS") {
            Ok(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => defaults.cors_origins,
        };

        let login_rate_limit = match std::env::var("AIRWATCH_LOGIN_RATE_LIMIT") {
            Ok(limit) => limit
                .parse::<u32>()
                .ok()
                .filter(|l| *l > 0)
                .ok_or(ConfigError::Invalid(
                    "AIRWATCH_LOGIN_RATE_LIMIT",
                    "must be a positive integer",
                ))?,
            Err(_) => defaults.login_rate_limit,
        };

        Ok(Config {
            listen_addr,
            database_url,
            environment,
            token_ttl_hours,
            cors_origins,
            login_rate_limit,
            admin: Self::parse_admin()?,
        })
    }

    fn parse_admin() -> Result<Option<AdminBootstrap>, ConfigError> {
        let username = match std::env::var("AIRWATCH_ADMIN_USERNAME") {
            Ok(u) if !u.is_empty() => u,
            _ => return Ok(None),
        };

        let password = std::env::var("AIRWATCH_ADMIN_PASSWORD")
            .map_err(|_| ConfigError::Missing("AIRWATCH_ADMIN_PASSWORD"))?;
        let email = std::env::var("AIRWATCH_ADMIN_EMAIL")
            .unwrap_or_else(|_| format!("{}@localhost.localdomain", username));

        Ok(Some(AdminBootstrap {
            username,
            password,
            email,
        }))
    }
}

fn parse_token_ttl(value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|h| (1..=MAX_TOKEN_TTL_HOURS).contains(h))
        .ok_or(ConfigError::Invalid(
            "AIRWATCH_TOKEN_TTL_HOURS",
            "must be between 1 and 87600 hours",
        ))
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => {
                write!(f, "Missing required environment variable: {}", var)
            }
            ConfigError::Invalid(var, msg) => write!(f, "Invalid value for {}: {}", var, msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr.port(), 8002);
        assert_eq!(config.database_url, "sqlite://airwatch.db");
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.login_rate_limit, 20);
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_token_ttl_bounds() {
        assert_eq!(parse_token_ttl("24").unwrap(), 24);
        assert_eq!(
            parse_token_ttl(&MAX_TOKEN_TTL_HOURS.to_string()).unwrap(),
            MAX_TOKEN_TTL_HOURS
        );
        assert!(parse_token_ttl(&(MAX_TOKEN_TTL_HOURS + 1).to_string()).is_err());
        assert!(parse_token_ttl("3000000000").is_err());
        assert!(parse_token_ttl("0").is_err());
        assert!(parse_token_ttl("-5").is_err());
        assert!(parse_token_ttl("forever").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::Invalid("LISTEN_ADDR", "must be a valid socket address");
        assert_eq!(
            err.to_string(),
            "Invalid value for LISTEN_ADDR: must be a valid socket address"
        );
        let err = ConfigError::Missing("AIRWATCH_ADMIN_PASSWORD");
        assert!(err.to_string().contains("AIRWATCH_ADMIN_PASSWORD"));
    }
}
