use crate::config::AppConfig;
use crate::domain::model::{Pagination, SongFilter, SongUpdate, DEFAULT_LIMIT};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "song-library")]
#[command(about = "Song catalogue with metadata enrichment")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "SONG_LIBRARY_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Base URL of the enrichment provider
    #[arg(long)]
    pub api_base_url: Option<String>,

    #[arg(long)]
    pub api_timeout_secs: Option<u64>,

    #[arg(long)]
    pub operation_timeout_secs: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Enrich a song from the provider and store it
    Create {
        #[arg(long)]
        group: String,
        #[arg(long)]
        song: String,
    },
    /// Show one song
    Get { id: i64 },
    /// List songs, newest first
    List {
        /// Case-insensitive substring of the group name
        #[arg(long)]
        group: Option<String>,
        /// Case-insensitive substring of the title
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Change fields of a song; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long, default_value = "")]
        group: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        release_date: String,
        #[arg(long, default_value = "")]
        link: String,
        #[arg(long, default_value = "")]
        text: String,
    },
    /// Delete a song
    Delete { id: i64 },
    /// Show one page of verses
    Lyrics {
        id: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 1)]
        page_size: u32,
    },
    /// Show catalogue statistics
    Stats,
}

impl Cli {
    /// CLI flags take precedence over file and environment settings.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.database {
            config.database.path = path.clone();
        }
        if let Some(url) = &self.api_base_url {
            config.enrichment.base_url = url.clone();
        }
        if let Some(secs) = self.api_timeout_secs {
            config.enrichment.timeout_secs = secs;
        }
        if let Some(secs) = self.operation_timeout_secs {
            config.service.operation_timeout_secs = Some(secs);
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
    }
}

impl Command {
    pub fn filter(&self) -> Option<(SongFilter, Pagination)> {
        match self {
            Command::List {
                group,
                title,
                limit,
                offset,
            } => Some((
                SongFilter::new(group.clone(), title.clone()),
                Pagination::new(*limit, *offset),
            )),
            _ => None,
        }
    }

    pub fn song_update(&self) -> Option<SongUpdate> {
        match self {
            Command::Update {
                id,
                group,
                title,
                release_date,
                link,
                text,
            } => Some(SongUpdate {
                id: *id,
                group_name: group.clone(),
                title: title.clone(),
                release_date: release_date.clone(),
                link: link.clone(),
                text: text.clone(),
            }),
            _ => None,
        }
    }
}

impl Validate for Command {
    fn validate(&self) -> Result<()> {
        if let Command::Create { group, song } = self {
            validate_non_empty_string("group", group)?;
            validate_non_empty_string("song", song)?;
        }
        Ok(())
    }
}
