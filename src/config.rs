use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const STATE_FILE_NAME: &str = "previous_run.json";

/// Settings shared by every command, layered from `Config.toml` and
/// `PODSYNC_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extension: String,
    pub ignore_patterns: Vec<String>,
    pub state_path: Option<String>,
    pub app_dir_marker: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            extension: "mp3".to_string(),
            ignore_patterns: Vec::new(),
            state_path: None,
            app_dir_marker: "marekchlebik.podcasttime".to_string(),
        }
    }
}

impl AppConfig {
    /// Where the run state lives when nothing overrides it: next to the
    /// executable, or the current directory if that can't be determined.
    pub fn resolved_state_path(&self) -> PathBuf {
        if let Some(path) = &self.state_path {
            return PathBuf::from(path);
        }
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(STATE_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME))
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("PODSYNC"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Everything one `sync` run needs, built once at startup.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub source_dirs: Vec<PathBuf>,
    pub dest_dir: PathBuf,
    pub state_path: PathBuf,
    pub extension: String,
    pub ignore_patterns: Vec<String>,
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn new(source_dirs: Vec<PathBuf>, dest_dir: PathBuf, state_path: PathBuf) -> Self {
        let defaults = AppConfig::default();
        Self {
            source_dirs,
            dest_dir,
            state_path,
            extension: defaults.extension,
            ignore_patterns: defaults.ignore_patterns,
            dry_run: false,
        }
    }
}

/// Everything one `uniq_copier` run needs.
#[derive(Debug, Clone)]
pub struct CopierConfig {
    pub src_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub extension: String,
    pub ignore_patterns: Vec<String>,
    pub print_dest_files: bool,
    pub print_dupe_notifications: bool,
    pub print_new_files: bool,
    pub dry_run: bool,
}

impl CopierConfig {
    pub fn new(src_dir: PathBuf, dest_dir: PathBuf) -> Self {
        let defaults = AppConfig::default();
        Self {
            src_dir,
            dest_dir,
            extension: defaults.extension,
            ignore_patterns: defaults.ignore_patterns,
            print_dest_files: false,
            print_dupe_notifications: false,
            print_new_files: true,
            dry_run: false,
        }
    }
}
