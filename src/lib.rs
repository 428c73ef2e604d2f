pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::Cli;
pub use crate::config::AppConfig;

pub use crate::adapters::{HttpEnrichmentClient, SqliteSongRepository};
pub use crate::core::{lyrics, service::SongService};
pub use crate::domain::{
    EnrichmentClient, LyricsPage, NewSong, Pagination, Song, SongFilter, SongInfo, SongRepository,
    SongUpdate,
};
pub use crate::utils::error::{EnrichmentError, ErrorCategory, Result, SongError, StoreError};
