//! Application settings.
//!
//! Read from an optional TOML file (`settings.toml` unless `--config` says
//! otherwise) and overridden by `MOSHIMO__SECTION__KEY` environment
//! variables, e.g. `MOSHIMO__SERVER__PORT=8080`.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use engine::{AuthPolicy, Limits};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "moshimo", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the log level (e.g. debug).
    #[arg(long)]
    level: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: None,
            port: 3000,
            database: Database::Sqlite("moshimo.db".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub limits: Limits,
    pub auth: AuthPolicy,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("MOSHIMO")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.bootstrap_admins")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        if let Some(level) = args.level {
            settings.app.level = level;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.limits, Limits::default());
        assert_eq!(settings.auth, AuthPolicy::default());
    }

    #[test]
    fn sections_override_defaults() {
        let settings = from_toml(
            r#"
            [server]
            port = 8080
            database = "memory"

            [limits]
            max_goals_per_user = 3

            [auth]
            max_failed_attempts = 2
            bootstrap_admins = ["root@example.com"]
            "#,
        );
        assert_eq!(settings.server.port, 8080);
        assert!(matches!(settings.server.database, Database::Memory));
        assert_eq!(settings.limits.max_goals_per_user, 3);
        assert_eq!(settings.limits.max_feedback_per_user, 5);
        assert_eq!(settings.auth.max_failed_attempts, 2);
        assert_eq!(settings.auth.bootstrap_admins, ["root@example.com"]);
    }
}
