use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;

use crate::users::password::PasswordScheme;

/// Deployment profile; only `Development` may fall back to local defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "testing" | "test" => Ok(Self::Testing),
            "production" | "prod" => Ok(Self::Production),
            other => anyhow::bail!(
                "{other} is not a supported environment; use development, testing or production"
            ),
        }
    }
}

/// A validated table identifier. Statements always emit it double-quoted
/// (see [`TableName::quoted`]), so reserved words such as `order` or `user`
/// work, and the name is matched case-sensitively: `Users` and `users` are
/// different tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    pub fn new(raw: &str) -> anyhow::Result<Self> {
        lazy_static! {
            static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
        }
        anyhow::ensure!(IDENT_RE.is_match(raw), "invalid table name: {raw:?}");
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a quoted SQL identifier. The pattern in [`TableName::new`]
    /// admits no `"`, so no escaping is needed.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub table: TableName,
}

impl DbConfig {
    pub fn from_env(env: Environment) -> anyhow::Result<Self> {
        Self::from_lookup(env, |key| std::env::var(key).ok())
    }

    /// Builds the store settings from an arbitrary variable source.
    pub fn from_lookup<F>(env: Environment, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, dev_default: &str| -> anyhow::Result<String> {
            match lookup(key).filter(|v| !v.trim().is_empty()) {
                Some(v) => Ok(v),
                None if env == Environment::Development => Ok(dev_default.to_string()),
                None => anyhow::bail!("missing required environment variable {key}"),
            }
        };

        let port = var("DB_PORT", "5432")?;
        let port = port
            .parse::<u16>()
            .with_context(|| format!("DB_PORT is not a valid port: {port}"))?;

        Ok(Self {
            host: var("DB_HOST", "localhost")?,
            user: var("DB_USER", "postgres")?,
            password: var("DB_PASSWORD", "postgres")?,
            database: var("DB_NAME", "userdesk")?,
            port,
            table: TableName::new(&var("DB_TABLE", "users")?)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub db: DbConfig,
    pub password_scheme: PasswordScheme,
    pub app_host: String,
    pub app_port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment =
            Environment::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()))?;
        let db = DbConfig::from_env(environment)?;
        let password_scheme = std::env::var("PASSWORD_SCHEME")
            .ok()
            .map(|v| PasswordScheme::parse(&v))
            .transpose()?
            .unwrap_or_default();
        let app_host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let app_port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self {
            environment,
            db,
            password_scheme,
            app_host,
            app_port,
        })
    }
}
