use crate::core::lyrics::{paginate_verses, split_verses};
use crate::domain::model::{LyricsPage, NewSong, Pagination, Song, SongFilter, SongUpdate};
use crate::domain::ports::{EnrichmentClient, SongRepository};
use crate::utils::error::{Result, SongError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Business rules for the song catalogue.
///
/// Holds no mutable state of its own; every operation is a function of its
/// inputs and what the two ports answer.
///
/// `update_song` and `delete_song` check existence and then mutate in two
/// separate store calls. A concurrent delete in between turns the update
/// into a silent no-op, and lets two deletes of the same id both succeed.
#[derive(Clone)]
pub struct SongService {
    repo: Arc<dyn SongRepository>,
    enrichment: Arc<dyn EnrichmentClient>,
    operation_timeout: Option<Duration>,
}

impl SongService {
    pub fn new(repo: Arc<dyn SongRepository>, enrichment: Arc<dyn EnrichmentClient>) -> Self {
        Self {
            repo,
            enrichment,
            operation_timeout: None,
        }
    }

    /// Bounds every operation end-to-end. Outstanding store and provider calls
    /// are dropped when the deadline passes.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.operation_timeout {
            Some(after) => match tokio::time::timeout(after, work).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("{} cancelled after {:?}", operation, after);
                    Err(SongError::Timeout { operation, after })
                }
            },
            None => work.await,
        }
    }

    async fn find_existing(&self, operation: &'static str, id: i64) -> Result<Song> {
        self.repo
            .get_by_id(id)
            .await
            .map_err(|e| SongError::persistence(operation, e))?
            .ok_or(SongError::NotFound { id })
    }

    /// Enriches and stores a new song. Nothing is written when enrichment
    /// fails.
    pub async fn create_song(&self, group_name: &str, title: &str) -> Result<i64> {
        self.bounded("create_song", async {
            info!("create_song: group={}, title={}", group_name, title);

            let info = self
                .enrichment
                .fetch_info(group_name, title)
                .await
                .map_err(|e| SongError::dependency("create_song", e))?;

            let song = NewSong::enriched(group_name, title, info);
            let id = self
                .repo
                .create(&song)
                .await
                .map_err(|e| SongError::persistence("create_song", e))?;

            info!("Created song with id={}", id);
            Ok(id)
        })
        .await
    }

    pub async fn get_song(&self, id: i64) -> Result<Song> {
        self.bounded("get_song", async {
            debug!("get_song: id={}", id);
            self.find_existing("get_song", id).await
        })
        .await
    }

    pub async fn list_songs(&self, filter: &SongFilter, pagination: Pagination) -> Result<Vec<Song>> {
        self.bounded("list_songs", async {
            debug!(
                "list_songs: filter={:?}, limit={}, offset={}",
                filter, pagination.limit, pagination.offset
            );
            self.repo
                .get_all(filter, pagination)
                .await
                .map_err(|e| SongError::persistence("list_songs", e))
        })
        .await
    }

    /// Applies `update` over the stored record; empty fields keep their
    /// stored value.
    pub async fn update_song(&self, update: SongUpdate) -> Result<()> {
        self.bounded("update_song", async {
            info!("update_song: id={}", update.id);

            let existing = self.find_existing("update_song", update.id).await?;
            let merged = update.merge_into(existing);

            self.repo
                .update(&merged)
                .await
                .map_err(|e| SongError::persistence("update_song", e))
        })
        .await
    }

    pub async fn delete_song(&self, id: i64) -> Result<()> {
        self.bounded("delete_song", async {
            info!("delete_song: id={}", id);

            self.find_existing("delete_song", id).await?;
            self.repo
                .delete(id)
                .await
                .map_err(|e| SongError::persistence("delete_song", e))?;

            info!("Song with id={} deleted", id);
            Ok(())
        })
        .await
    }

    /// One page of verses from the stored lyric text.
    pub async fn get_lyrics(&self, id: i64, page: u32, page_size: u32) -> Result<LyricsPage> {
        self.bounded("get_lyrics", async {
            debug!("get_lyrics: id={}, page={}, page_size={}", id, page, page_size);

            let song = self.find_existing("get_lyrics", id).await?;
            Ok(paginate_verses(split_verses(&song.text), page, page_size))
        })
        .await
    }
}
