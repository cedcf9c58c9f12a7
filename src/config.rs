//! Layered configuration.
//!
//! Values come from an optional YAML file (`configs/config.yaml`, or the file
//! named by `CONFIG_PATH`) overlaid by the process environment, which
//! `dotenv` may have populated from a `.env` file. Everything is read once at
//! startup and handed to the rest of the application as immutable data.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Relative location searched for in the working directory and its parents.
pub const DEFAULT_CONFIG_FILE: &str = "configs/config.yaml";

/// Embedded migrations are used unless a directory is configured.
pub const DEFAULT_MIGRATIONS_PATH: &str = "./migrations";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set (or is empty).
    #[error("{0} must be set")]
    Missing(&'static str),
    /// A variable is set but cannot be parsed or is out of range.
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    /// The config file exists but cannot be read or parsed.
    #[error("cannot load {path}: {message}")]
    File { path: String, message: String },
}

/// The symmetric key used to sign and verify bearer tokens.
///
/// `Debug` is redacted so the secret never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}

/// YAML values accept both `port: 5432` and `port: "5432"`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
enum Scalar {
    Number(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseSection {
    host: Option<Scalar>,
    port: Option<Scalar>,
    user: Option<Scalar>,
    password: Option<Scalar>,
    name: Option<Scalar>,
    sslmode: Option<Scalar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MigrationsSection {
    path: Option<String>,
}

/// Contents of the YAML config file:
///
/// ```yaml
/// database:
///   host: localhost
///   port: 5432
///   user: app
///   password: secret
///   name: tasks
///   sslmode: disable
/// migrations:
///   path: ./migrations
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    database: DatabaseSection,
    migrations: MigrationsSection,
}

impl FileConfig {
    pub fn parse(path: &str, yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::File {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let yaml = fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: display.clone(),
            message: e.to_string(),
        })?;
        Self::parse(&display, &yaml)
    }

    /// Finds and loads the config file.
    ///
    /// An explicit `CONFIG_PATH` must exist. Without it the nearest
    /// `configs/config.yaml` above `start` is used, and having none at all
    /// yields an empty file layer.
    pub fn discover<F>(lookup: F, start: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match locate(lookup("CONFIG_PATH").filter(|p| !p.trim().is_empty()), start) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => {
                log::debug!("no {} found, using environment only", DEFAULT_CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    /// The file's value for an environment key, if it sets one.
    fn get(&self, key: &str) -> Option<String> {
        let db = &self.database;
        let value = match key {
            "DB_HOST" => db.host.as_ref(),
            "DB_PORT" => db.port.as_ref(),
            "DB_USER" => db.user.as_ref(),
            "DB_PASSWORD" => db.password.as_ref(),
            "DB_NAME" => db.name.as_ref(),
            "DB_SSLMODE" => db.sslmode.as_ref(),
            "MIGRATIONS_PATH" => return self.migrations.path.clone(),
            _ => None,
        };
        value.map(Scalar::to_string)
    }
}

/// `explicit` wins; otherwise walks up from `start` looking for
/// `configs/config.yaml`.
pub fn locate(explicit: Option<String>, start: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Where the database lives and where its schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    /// `None` means the migrations compiled into the binary.
    pub migrations_path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn from_env(file: &FileConfig) -> Result<Self, ConfigError> {
        Self::from_sources(|key| env::var(key).ok(), file)
    }

    /// Environment values override the file's.
    pub fn from_sources<F>(lookup: F, file: &FileConfig) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = layered(&lookup, file);

        let url = match get("DATABASE_URL") {
            Some(url) => url,
            None => compose_dsn(&get)?,
        };

        Ok(Self {
            url,
            migrations_path: get("MIGRATIONS_PATH").map(PathBuf::from),
        })
    }

    /// The migrations directory as it would be printed for tooling.
    pub fn migrations_dir(&self) -> PathBuf {
        self.migrations_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATIONS_PATH))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub migrations_path: Option<PathBuf>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: SigningSecret,
    pub token_ttl: Duration,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;

impl Config {
    /// Reads the process environment on top of `file`.
    pub fn from_env(file: &FileConfig) -> Result<Self, ConfigError> {
        Self::from_sources(|key| env::var(key).ok(), file)
    }

    /// Builds the configuration from an arbitrary key lookup, with no file
    /// layer. Tests use it to avoid touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_sources(lookup, &FileConfig::default())
    }

    pub fn from_sources<F>(lookup: F, file: &FileConfig) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig::from_sources(&lookup, file)?;
        let get = layered(&lookup, file);

        let jwt_secret = get("JWT_SECRET")
            .map(SigningSecret::new)
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let token_ttl_secs: u64 = parse_or("TOKEN_TTL_SECS", get("TOKEN_TTL_SECS"), DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: "0".into(),
            });
        }

        Ok(Self {
            database_url: database.url,
            migrations_path: database.migrations_path,
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), 8080)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?,
            db_acquire_timeout: Duration::from_secs(parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                5,
            )?),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Loads `explicit` if given, otherwise discovers the file from
/// `CONFIG_PATH` or the working directory.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        log::info!("Loading configuration from {}", path.display());
        return FileConfig::load(path);
    }
    let cwd = env::current_dir().map_err(|e| ConfigError::File {
        path: ".".into(),
        message: e.to_string(),
    })?;
    FileConfig::discover(|key| env::var(key).ok(), &cwd)
}

/// Non-empty environment value first, then the file's.
fn layered<'a, F>(lookup: &'a F, file: &'a FileConfig) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String>,
{
    move |key| {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| file.get(key).filter(|v| !v.trim().is_empty()))
    }
}

/// Falls back to the split `DB_*` settings when `DATABASE_URL` is absent.
fn compose_dsn<G>(get: &G) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let host = get("DB_HOST").ok_or(ConfigError::Missing("DATABASE_URL"))?;
    let user = get("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
    let name = get("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;
    let port: u16 = parse_or("DB_PORT", get("DB_PORT"), 5432)?;
    let password = get("DB_PASSWORD").unwrap_or_default();
    let sslmode = get("DB_SSLMODE").unwrap_or_else(|| "disable".to_string());

    Ok(format!(
        "postgres://{}:{}@{}:{}/{}?sslmode={}",
        user, password, host, port, name, sslmode
    ))
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
