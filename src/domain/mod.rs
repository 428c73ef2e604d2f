pub mod model;
pub mod ports;

pub use model::{LyricsPage, NewSong, Pagination, Song, SongFilter, SongInfo, SongUpdate};
pub use ports::{EnrichmentClient, SongRepository};
