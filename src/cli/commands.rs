//! CLI command implementations

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::documents::{DocumentStore, JsonRecordStore};
use crate::file_storage::LocalBackend;
use crate::http_server::{DocumentsState, HttpServer, HttpServerConfig, UrlBuilder};
use crate::observability::{log_event, log_event_with_fields, Event, Logger, Severity};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Directory under the data dir holding stored files
pub const MEDIA_DIR: &str = "media";

/// Records file under the data dir
pub const RECORDS_FILE: &str = "documents.json";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Lowest log severity emitted (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP settings, flattened into the top-level object
    #[serde(flatten)]
    pub server: HttpServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| CliError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::InvalidConfig(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::InvalidConfig("data_dir must not be empty".into()));
        }
        self.severity()?;
        self.server.validate().map_err(CliError::InvalidConfig)
    }

    /// Parsed log level
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(CliError::InvalidConfig)
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn media_path(&self) -> PathBuf {
        self.data_path().join(MEDIA_DIR)
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_path().join(RECORDS_FILE)
    }
}

/// Run the CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Whether the data directory has been set up by `init`
pub fn is_initialized(config: &Config) -> bool {
    config.media_path().is_dir() && config.records_path().is_file()
}

/// Initialize a new data directory: `media/` and an empty records file
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::AlreadyInitialized(config.data_path().to_path_buf()));
    }

    fs::create_dir_all(config.media_path()).map_err(|source| CliError::Layout {
        path: config.media_path(),
        source,
    })?;

    if !config.records_path().exists() {
        fs::write(config.records_path(), "[]\n").map_err(|source| CliError::Layout {
            path: config.records_path(),
            source,
        })?;
    }

    log_event_with_fields(Event::DataDirInitialized, &[("data_dir", &config.data_dir)]);
    Ok(())
}

/// Open the store described by `config` and wrap it in handler state
pub fn open_state(config: &Config) -> CliResult<Arc<DocumentsState>> {
    let records = JsonRecordStore::open(config.records_path())?;
    log_event_with_fields(
        Event::RecordsLoaded,
        &[
            ("path", &config.records_path().display().to_string()),
            ("count", &records.len()?.to_string()),
        ],
    );

    let store = DocumentStore::new(LocalBackend::new(config.media_path()), records);
    let urls = UrlBuilder::from_config(&config.server);
    Ok(Arc::new(DocumentsState::new(store, urls)))
}

/// Boot and serve the HTTP API until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    log_event(Event::BootStart);

    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_dir", &config.data_dir),
            ("port", &config.server.port.to_string()),
        ],
    );

    if !is_initialized(&config) {
        return Err(CliError::NotInitialized(config.data_path().to_path_buf()));
    }

    let state = open_state(&config)?;
    let server = HttpServer::new(config.server.clone(), state);

    let rt = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;

    rt.block_on(async { server.start().await.map_err(CliError::Server) })
}
