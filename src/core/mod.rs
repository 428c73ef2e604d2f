pub mod lyrics;
pub mod service;

pub use crate::domain::model::{LyricsPage, NewSong, Pagination, Song, SongFilter, SongInfo, SongUpdate};
pub use crate::domain::ports::{EnrichmentClient, SongRepository};
pub use crate::utils::error::Result;
pub use service::SongService;
