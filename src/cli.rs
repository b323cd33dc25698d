use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use log::{debug, info};
use uuid::Uuid;

use crate::api::envelope::PagedResponseModel;
use crate::api::schedules::ScheduleView;
use crate::api::AppState;
use crate::config::Config;
use crate::database::Database;
use crate::error::ScheduleError;
use crate::notify::LogPublisher;
use crate::paging::PagedResult;
use crate::repository::{ScheduleRepository, SqliteScheduleRepository};
use crate::schedules::Schedule;
use crate::server::WebServer;
use crate::service::{DefaultScheduleService, ScheduleService};

#[derive(Parser)]
#[command(
    name = "house-schedule",
    version,
    about = "House Schedule: stores value-range schedules and serves them over HTTP"
)]
pub struct Cli {
    /// Database file (overrides the configured path)
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve {
        /// Address to bind (overrides the configured host)
        #[arg(long = "host")]
        host: Option<String>,

        /// Port to listen on (overrides the configured port)
        #[arg(long = "port", short = 'p')]
        port: Option<u16>,
    },

    /// Add a schedule to the database
    Add {
        /// Display name (at most 255 characters)
        #[arg(long = "name", short = 'n')]
        name: String,

        /// Default minimum value
        #[arg(long = "min", allow_negative_numbers = true)]
        min: f64,

        /// Default maximum value
        #[arg(long = "max", allow_negative_numbers = true)]
        max: Option<f64>,

        /// Minimum difference between min and max (non-negative)
        #[arg(long = "min-diff", default_value_t = 0.0)]
        min_diff: f64,

        /// Schedule key to use (default: a new random key)
        #[arg(long = "key", short = 'k')]
        key: Option<Uuid>,
    },

    /// Print one page of schedules as JSON
    List {
        /// Zero-based page index
        #[arg(long = "page", default_value_t = 0)]
        page: u32,

        /// Number of schedules per page (1-1000)
        #[arg(
            long = "size",
            default_value_t = 10,
            value_parser = clap::value_parser!(u32).range(1..=1000)
        )]
        size: u32,
    },
}

impl Cli {
    pub fn handle_command_line() -> Result<(), ScheduleError> {
        let args = Cli::parse();

        let (config, data_dir) = match Config::project_dirs() {
            Some(project_dirs) => (
                Config::load_config(&project_dirs),
                project_dirs.data_local_dir().to_path_buf(),
            ),
            None => {
                eprintln!("Could not determine the application data directory - using defaults");
                (Config::default(), PathBuf::from("."))
            }
        };

        let _logger = Self::start_logger(&config)?;
        debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

        let db_path = args
            .db
            .clone()
            .unwrap_or_else(|| config.database.resolve_path(&data_dir));

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| ScheduleError::Error(format!("Failed to create runtime: {}", e)))?;

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve {
            host: None,
            port: None,
        }) {
            Command::Serve { host, port } => {
                let host = host.unwrap_or_else(|| config.server.host.clone());
                let port = port.unwrap_or(config.server.port);
                rt.block_on(Self::serve(&config, &db_path, host, port))
            }
            Command::Add {
                name,
                min,
                max,
                min_diff,
                key,
            } => {
                let schedule_key = key.unwrap_or_else(Uuid::new_v4);
                let schedule = Schedule::new(schedule_key, name, min, max, min_diff);
                rt.block_on(Self::add(&config, &db_path, schedule))
            }
            Command::List { page, size } => rt.block_on(Self::list(&config, &db_path, page, size)),
        }
    }

    fn start_logger(config: &Config) -> Result<LoggerHandle, ScheduleError> {
        // RUST_LOG wins over the configured level when set
        Logger::try_with_env_or_str(&config.logging.house_schedule)
            .and_then(|logger| logger.format(flexi_logger::detailed_format).start())
            .map_err(|e| ScheduleError::Error(format!("Failed to start logger: {}", e)))
    }

    fn open_database(config: &Config, db_path: &Path) -> Result<Database, ScheduleError> {
        Database::new(
            db_path,
            config.database.pool_size,
            config.database.connection_timeout(),
        )
    }

    fn build_service(db: &Database) -> Arc<dyn ScheduleService> {
        let repository = Arc::new(SqliteScheduleRepository::new(db.clone()));
        Arc::new(DefaultScheduleService::new(repository, Arc::new(LogPublisher)))
    }

    async fn serve(
        config: &Config,
        db_path: &Path,
        host: String,
        port: u16,
    ) -> Result<(), ScheduleError> {
        info!("Starting server on {}:{}", host, port);

        let db = Self::open_database(config, db_path)?;
        let state = AppState::new(Self::build_service(&db), db);

        WebServer::new(host, port, state).start().await
    }

    async fn add(config: &Config, db_path: &Path, schedule: Schedule) -> Result<(), ScheduleError> {
        let db = Self::open_database(config, db_path)?;
        let repository = SqliteScheduleRepository::new(db);
        let schedule_key = schedule.schedule_key;

        match repository.add_schedule(Some(schedule)).await? {
            Some(stored_key) => {
                println!("Added schedule {}", stored_key);
                Ok(())
            }
            None => Err(ScheduleError::Error(format!(
                "A schedule with key {} already exists",
                schedule_key
            ))),
        }
    }

    async fn list(
        config: &Config,
        db_path: &Path,
        page: u32,
        size: u32,
    ) -> Result<(), ScheduleError> {
        let db = Self::open_database(config, db_path)?;
        let service = Self::build_service(&db);

        let result = service
            .get_schedules(page, size)
            .await?
            .unwrap_or_else(|| PagedResult::empty(page, size));
        let envelope =
            PagedResponseModel::from_page(result.map(|s| ScheduleView::from_schedule(&s)));

        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| ScheduleError::Error(format!("Failed to format schedules: {}", e)))?;
        println!("{}", json);

        Ok(())
    }
}
