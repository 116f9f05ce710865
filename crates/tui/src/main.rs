mod app;
mod client;
mod config;
mod error;
mod local_state;
mod session;
mod ui;

use std::{fs::OpenOptions, sync::Mutex};

use clap::Parser;
use engine::CsvScope;

use crate::{
    client::{Client, normalize_base_url},
    config::{AppConfig, Args, Command},
    error::{AppError, Result},
    local_state::{JsonFileStore, KeyValueStore, LocalState},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load(&args)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "extrato_tui={level},engine={level}",
            level = config.log_level
        ))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let mut local = LocalState::new(JsonFileStore::open(&config.state_path)?);
    if let Some(base_url) = &args.base_url {
        local.set_base_url(&normalize_base_url(base_url))?;
    }

    match args.command {
        None => {
            tracing::info!("starting dashboard against {}", config.base_url);
            let mut app = app::App::new(config, local)?;
            app.run().await
        }
        Some(command) => run_command(command, &config, &mut local).await,
    }
}

/// One-shot commands sharing the dashboard's stored session and filters.
async fn run_command<S: KeyValueStore>(
    command: Command,
    config: &AppConfig,
    local: &mut LocalState<S>,
) -> Result<()> {
    let base_url = local.base_url().unwrap_or_else(|| config.base_url.clone());
    let mut client = Client::new(&base_url)?;
    client.set_token(local.token());

    match command {
        Command::Health => {
            client.health().await?;
            println!("{base_url}: OK");
        }
        Command::Wallets => {
            for wallet in client.wallets().await? {
                println!("{}", app::wallet_summary(&wallet));
            }
        }
        Command::Export { scope, out } => {
            if !client.has_token() {
                return Err(AppError::Invalid(
                    "sem token salvo, faça login no dashboard".to_string(),
                ));
            }
            let ledger_id = local
                .ledger_id()
                .or_else(|| config.ledger_id.clone())
                .ok_or_else(|| AppError::Invalid("nenhum ledger configurado".to_string()))?;
            let filters = local.filters().unwrap_or_default();
            let style = local.csv_style().unwrap_or(config.csv_style);
            let scope = CsvScope::from(scope);
            let dest =
                out.unwrap_or_else(|| config.download_path(&format!("{}.csv", scope.file_stem())));

            let bytes = client
                .download_csv(&ledger_id, &filters, scope, style, &dest)
                .await?;
            println!("{} ({bytes} bytes)", dest.display());
        }
        Command::Logout => {
            local.clear_tokens()?;
            println!("Sessão encerrada.");
        }
    }
    Ok(())
}
