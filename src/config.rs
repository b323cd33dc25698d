use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::database::DB_FILENAME;

pub const ENV_PREFIX: &str = "HOUSE_SCHEDULE_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub house_schedule: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const DEFAULT_LEVEL: &str = "info";

    fn default() -> Self {
        LoggingConfig {
            house_schedule: Self::DEFAULT_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        let str_original = self.house_schedule.clone();
        self.house_schedule = self.house_schedule.trim().to_ascii_lowercase();
        if !Self::LOG_LEVELS.contains(&self.house_schedule.as_str()) {
            eprintln!(
                "Config error: house_schedule log level of '{}' is invalid - using default of '{}'",
                str_original,
                Self::DEFAULT_LEVEL
            );
            self.house_schedule = Self::DEFAULT_LEVEL.to_owned();
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Empty means `schedules.db` in the application data directory
    pub path: String,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

impl DatabaseConfig {
    const POOL_SIZE: u32 = 8;
    const CONNECTION_TIMEOUT_SECS: u64 = 30;

    fn default() -> Self {
        DatabaseConfig {
            path: String::new(),
            pool_size: Self::POOL_SIZE,
            connection_timeout_secs: Self::CONNECTION_TIMEOUT_SECS,
        }
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// The configured path, or `schedules.db` under `data_dir` when unset.
    pub fn resolve_path(&self, data_dir: &Path) -> PathBuf {
        if self.path.trim().is_empty() {
            data_dir.join(DB_FILENAME)
        } else {
            PathBuf::from(self.path.trim())
        }
    }

    fn ensure_valid(&mut self) {
        if self.pool_size == 0 {
            eprintln!("Config error: database pool_size of 0 is invalid - using 1");
            self.pool_size = 1;
        }
        if self.connection_timeout_secs == 0 {
            eprintln!("Config error: database connection_timeout_secs of 0 is invalid - using 1");
            self.connection_timeout_secs = 1;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "house-schedule")
    }

    /// Loads the configuration from `config.toml` in the app's data directory,
    /// then applies `HOUSE_SCHEDULE_*` environment overrides.
    /// If the file is missing the defaults are written to it; if it fails to
    /// parse, defaults are used.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        let config_path = project_dirs.data_local_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Self {
        let default_config = Config::default();

        if !config_path.exists() {
            Self::write_default(config_path, &default_config);
        }

        // Defaults, overlaid by the TOML file, overlaid by the environment
        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn write_default(config_path: &Path, default_config: &Config) {
        if let Some(parent) = config_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    parent.display(),
                    e
                );
            }
        }
        match toml::to_string_pretty(default_config) {
            Ok(toml_string) => {
                if let Err(e) = fs::write(config_path, toml_string) {
                    eprintln!(
                        "Failed to write default config to {}: {}",
                        config_path.display(),
                        e
                    );
                }
            }
            Err(_) => eprintln!("Failed to serialize default config."),
        }
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.database.ensure_valid();
    }
}
