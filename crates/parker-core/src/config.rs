use figment::{providers::Env, Figment};
use serde::Deserialize;

/// Connection and logging settings (DB_* / MYSQL_ROOT_PASSWORD / LOG_LEVEL
/// environment variables).
#[derive(Debug, Clone, Deserialize)]
pub struct ParkerConfig {
    #[serde(default = "default_db_user")]
    pub db_user: String,
    #[serde(default)]
    pub mysql_root_password: String,
    #[serde(default = "default_db_host")]
    pub db_host: String,
    #[serde(default = "default_db_port")]
    pub db_port: u16,
    /// Severity name for the logging bootstrap. `None` means unset.
    pub log_level: Option<String>,
}

impl ParkerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> crate::error::Result<Self> {
        Self::extract(Figment::new().merge(env_provider()))
    }

    fn extract(figment: Figment) -> crate::error::Result<Self> {
        figment
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))
    }
}

fn env_provider() -> Env {
    Env::raw().only(&[
        "db_user",
        "mysql_root_password",
        "db_host",
        "db_port",
        "log_level",
    ])
}

fn default_db_user() -> String {
    "root".to_string()
}
fn default_db_host() -> String {
    "127.0.0.1".to_string()
}
fn default_db_port() -> u16 {
    3306
}
