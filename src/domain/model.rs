use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 10;

/// A catalogue entry as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: i64,
    pub group_name: String,
    pub title: String,
    /// Opaque, provider-formatted date string.
    pub release_date: String,
    pub link: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields handed to the store on insert; identity and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub group_name: String,
    pub title: String,
    pub release_date: String,
    pub link: String,
    pub text: String,
}

impl NewSong {
    pub fn enriched(group_name: &str, title: &str, info: SongInfo) -> Self {
        Self {
            group_name: group_name.to_string(),
            title: title.to_string(),
            release_date: info.release_date,
            link: info.link,
            text: info.text,
        }
    }
}

/// Incoming changes for an existing song. An empty field keeps the stored
/// value, so a field cannot be cleared through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SongUpdate {
    pub id: i64,
    pub group_name: String,
    pub title: String,
    pub release_date: String,
    pub link: String,
    pub text: String,
}

impl SongUpdate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Overlays the non-empty fields onto `existing`. Identity and timestamps
    /// always come from `existing`.
    pub fn merge_into(self, existing: Song) -> Song {
        fn pick(incoming: String, current: String) -> String {
            if incoming.is_empty() {
                current
            } else {
                incoming
            }
        }

        Song {
            id: existing.id,
            group_name: pick(self.group_name, existing.group_name),
            title: pick(self.title, existing.title),
            release_date: pick(self.release_date, existing.release_date),
            link: pick(self.link, existing.link),
            text: pick(self.text, existing.text),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        }
    }
}

/// Case-insensitive substring predicates over the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongFilter {
    pub group_name: Option<String>,
    pub title: Option<String>,
}

impl SongFilter {
    pub fn new(group_name: Option<String>, title: Option<String>) -> Self {
        Self { group_name, title }
    }

    pub fn group(&self) -> Option<&str> {
        self.group_name.as_deref().filter(|value| !value.is_empty())
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Canonical metadata returned by the enrichment provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    pub release_date: String,
    pub text: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsPage {
    pub verses: Vec<String>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}
