use std::path::PathBuf;

use api_types::ledger::CsvStyle;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use engine::CsvScope;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/extrato_tui.toml";
const ENV_PREFIX: &str = "EXTRATO_TUI";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Ledger opened at startup when none was stored.
    pub ledger_id: Option<String>,
    pub username: String,
    pub timezone: String,
    pub csv_style: CsvStyle,
    pub page_size: u32,
    pub state_path: String,
    pub log_file: String,
    pub log_level: String,
    pub download_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            ledger_id: None,
            username: String::new(),
            timezone: "America/Sao_Paulo".to_string(),
            csv_style: CsvStyle::Br,
            page_size: engine::filters::DEFAULT_PAGE_SIZE,
            state_path: "config/extrato_state.json".to_string(),
            log_file: "extrato_tui.log".to_string(),
            log_level: "info".to_string(),
            download_dir: ".".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| AppError::Invalid(format!("timezone {}: {err}", self.timezone)))
    }

    pub fn download_path(&self, file_name: &str) -> PathBuf {
        PathBuf::from(&self.download_dir).join(file_name)
    }
}

#[derive(Debug, Parser)]
#[command(name = "extrato_tui", disable_version_flag = true)]
pub struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000).
    #[arg(long)]
    pub base_url: Option<String>,
    /// Override ledger id.
    #[arg(long)]
    pub ledger_id: Option<String>,
    /// Override username (password is never read from CLI).
    #[arg(long)]
    pub username: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    pub timezone: Option<String>,
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Probe `GET /api/v1/health`.
    Health,
    /// List wallets visible to the stored token, with owner and balance.
    Wallets,
    /// Download the server-side CSV for the stored filters.
    Export {
        #[arg(long, value_enum, default_value_t = ScopeArg::All)]
        scope: ScopeArg,
        /// Destination file; defaults to `<download_dir>/extrato_<scope>.csv`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Forget stored tokens.
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Page,
    All,
}

impl From<ScopeArg> for CsvScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Page => Self::Page,
            ScopeArg::All => Self::All,
        }
    }
}

pub fn load(args: &Args) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(ledger_id) = &args.ledger_id {
        settings.ledger_id = Some(ledger_id.clone());
    }
    if let Some(username) = &args.username {
        settings.username = username.clone();
    }
    if let Some(timezone) = &args.timezone {
        settings.timezone = timezone.clone();
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }

    settings.tz()?;
    Ok(settings)
}
