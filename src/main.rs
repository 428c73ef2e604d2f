use anyhow::Context;
use clap::Parser;
use serde_json::json;
use song_library::config::cli::{Cli, Command};
use song_library::utils::{logger, validation::Validate};
use song_library::{AppConfig, HttpEnrichmentClient, SongError, SongService, SqliteSongRepository};
use std::sync::Arc;

fn load_config(cli: &Cli) -> song_library::Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, config: &AppConfig) -> anyhow::Result<()> {
    command.validate()?;

    let repo = Arc::new(
        SqliteSongRepository::from_config(&config.database)
            .map_err(|e| SongError::persistence("open_database", e))?,
    );
    let enrichment = HttpEnrichmentClient::from_config(&config.enrichment)
        .map_err(|e| SongError::dependency("configure_enrichment", e))?;

    let mut service = SongService::new(repo.clone(), Arc::new(enrichment));
    if let Some(timeout) = config.operation_timeout() {
        service = service.with_operation_timeout(timeout);
    }

    match &command {
        Command::Create { group, song } => {
            let id = service.create_song(group, song).await?;
            print_json(&json!({ "id": id }))
        }
        Command::Get { id } => {
            let song = service.get_song(*id).await?;
            print_json(&serde_json::to_value(song)?)
        }
        Command::List { .. } => {
            let (filter, pagination) = command.filter().context("list arguments")?;
            let songs = service.list_songs(&filter, pagination).await?;
            print_json(&json!({ "songs": songs }))
        }
        Command::Update { id, .. } => {
            let update = command.song_update().context("update arguments")?;
            service.update_song(update).await?;
            print_json(&json!({ "updated": id }))
        }
        Command::Delete { id } => {
            service.delete_song(*id).await?;
            print_json(&json!({ "deleted": id }))
        }
        Command::Lyrics { id, page, page_size } => {
            let lyrics = service.get_lyrics(*id, *page, *page_size).await?;
            print_json(&serde_json::to_value(lyrics)?)
        }
        Command::Stats => {
            let count = repo
                .count()
                .await
                .map_err(|e| SongError::persistence("stats", e))?;
            print_json(&json!({
                "songs": count,
                "database": config.database.path.display().to_string(),
            }))
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };

    logger::init_logger(&config.logging.level, config.log_format(), cli.verbose);
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = run(cli.command, &config).await {
        let exit_code = match e.downcast_ref::<SongError>() {
            Some(song_error) => {
                tracing::error!(
                    "❌ Command failed: {} (category: {:?})",
                    song_error,
                    song_error.category()
                );
                song_error.exit_code()
            }
            None => {
                tracing::error!("❌ Command failed: {:#}", e);
                1
            }
        };
        eprintln!("❌ {}", e);
        std::process::exit(exit_code);
    }
}
