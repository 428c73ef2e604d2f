use crate::domain::model::{NewSong, Pagination, Song, SongFilter, SongInfo};
use crate::utils::error::{EnrichmentError, StoreError};
use async_trait::async_trait;

/// Durable catalogue storage.
///
/// Dropping a returned future cancels the call; adapters must not leave the
/// underlying statement running past that point.
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Inserts a row and returns the store-assigned id.
    async fn create(&self, song: &NewSong) -> Result<i64, StoreError>;

    /// `Ok(None)` means the row does not exist, which is not an error.
    async fn get_by_id(&self, id: i64) -> Result<Option<Song>, StoreError>;

    /// Rows matching every present filter predicate, newest id first, windowed
    /// by `pagination`.
    async fn get_all(
        &self,
        filter: &SongFilter,
        pagination: Pagination,
    ) -> Result<Vec<Song>, StoreError>;

    /// Replaces the mutable fields of the row with `song.id` and advances its
    /// `updated_at`. A missing row is not detected here.
    async fn update(&self, song: &Song) -> Result<(), StoreError>;

    /// Removes the row; succeeds when it is already gone.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

/// External source of canonical song metadata. One attempt per call.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    async fn fetch_info(&self, group_name: &str, title: &str) -> Result<SongInfo, EnrichmentError>;
}
