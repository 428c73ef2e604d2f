use crate::config::DatabaseConfig;
use crate::domain::model::{NewSong, Pagination, Song, SongFilter};
use crate::domain::ports::SongRepository;
use crate::utils::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, InterruptHandle, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

const SONG_COLUMNS: &str =
    "id, group_name, title, release_date, link, text, created_at, updated_at";

/// Song catalogue backed by a single SQLite connection.
///
/// Statements run on the blocking pool. When the awaiting future is dropped
/// the pending call is skipped, or interrupted if it already started.
pub struct SqliteSongRepository {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

/// Raw row shape; timestamps are microseconds since the Unix epoch.
#[derive(Debug)]
struct SongRow {
    id: i64,
    group_name: String,
    title: String,
    release_date: String,
    link: String,
    text: String,
    created_at: i64,
    updated_at: i64,
}

impl SongRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SongRow {
            id: row.get(0)?,
            group_name: row.get(1)?,
            title: row.get(2)?,
            release_date: row.get(3)?,
            link: row.get(4)?,
            text: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

fn micros_to_datetime(id: i64, field: &str, micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| StoreError::Corrupt {
        id,
        message: format!("{} out of range: {}", field, micros),
    })
}

impl TryFrom<SongRow> for Song {
    type Error = StoreError;

    fn try_from(row: SongRow) -> Result<Self, Self::Error> {
        Ok(Song {
            id: row.id,
            created_at: micros_to_datetime(row.id, "created_at", row.created_at)?,
            updated_at: micros_to_datetime(row.id, "updated_at", row.updated_at)?,
            group_name: row.group_name,
            title: row.title,
            release_date: row.release_date,
            link: row.link,
            text: row.text,
        })
    }
}

/// A listing statement and its positional parameters, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds the filtered listing. Filter values are only ever bound, numbered
/// in field order (`group_name`, then `title`), followed by limit and offset.
pub(crate) fn build_list_query(filter: &SongFilter, pagination: Pagination) -> ListQuery {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    let predicates = [("group_name", filter.group()), ("title", filter.title())];
    for (column, needle) in predicates {
        if let Some(needle) = needle {
            params.push(Value::Text(needle.to_string()));
            clauses.push(format!(
                "instr(casefold({}), casefold(?{})) > 0",
                column,
                params.len()
            ));
        }
    }

    let mut sql = format!("SELECT {} FROM songs", SONG_COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    params.push(Value::Integer(i64::from(pagination.limit)));
    let limit_pos = params.len();
    params.push(Value::Integer(i64::from(pagination.offset)));
    sql.push_str(&format!(
        " ORDER BY id DESC LIMIT ?{} OFFSET ?{}",
        limit_pos,
        limit_pos + 1
    ));

    ListQuery { sql, params }
}

fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallPhase {
    Queued,
    Running,
    Done,
    Abandoned,
}

/// Lifecycle of one blocking call. Transitions happen under `phase`, so an
/// interrupt is only ever sent while this call's work is still on the
/// connection.
struct CallState {
    phase: Mutex<CallPhase>,
}

impl CallState {
    fn new() -> Self {
        Self {
            phase: Mutex::new(CallPhase::Queued),
        }
    }

    fn phase(&self) -> std::sync::MutexGuard<'_, CallPhase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns false when the caller went away before the work started.
    fn begin(&self) -> bool {
        let mut phase = self.phase();
        if *phase == CallPhase::Abandoned {
            return false;
        }
        *phase = CallPhase::Running;
        true
    }

    fn finish(&self) {
        *self.phase() = CallPhase::Done;
    }

    fn abandon(&self, interrupt: &InterruptHandle) {
        let mut phase = self.phase();
        match *phase {
            CallPhase::Queued => *phase = CallPhase::Abandoned,
            CallPhase::Running => {
                warn!("Interrupting abandoned SQLite statement");
                interrupt.interrupt();
                *phase = CallPhase::Abandoned;
            }
            CallPhase::Done | CallPhase::Abandoned => {}
        }
    }
}

/// Abandons the call when the awaiting future is dropped early.
struct CancelOnDrop {
    state: Arc<CallState>,
    interrupt: Arc<InterruptHandle>,
    finished: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.finished {
            self.state.abandon(&self.interrupt);
        }
    }
}

impl SqliteSongRepository {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!("Opening SQLite database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let repo = Self::open(&config.path)?;
        {
            let conn = repo.conn.lock().map_err(|_| StoreError::Poisoned)?;
            conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
            if let Some(mode) = &config.journal_mode {
                // PRAGMA values cannot be bound; `mode` is checked against a fixed list at config load.
                let applied: String = conn.query_row(
                    &format!("PRAGMA journal_mode = {}", mode),
                    [],
                    |row| row.get(0),
                )?;
                debug!("SQLite journal_mode={}", applied);
            }
        }
        Ok(repo)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize_schema(&conn)?;
        register_functions(&conn)?;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        })
    }

    async fn call<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let state = Arc::new(CallState::new());
        let mut guard = CancelOnDrop {
            state: Arc::clone(&state),
            interrupt: Arc::clone(&self.interrupt),
            finished: false,
        };

        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            if !state.begin() {
                return Err(StoreError::Cancelled);
            }
            let outcome = work(&*conn);
            // Still holding the connection, so a late interrupt cannot reach the next call.
            state.finish();
            outcome
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()));

        guard.finished = true;
        result?
    }

    /// Number of stored songs.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.call(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}

fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_name TEXT NOT NULL,
            title TEXT NOT NULL,
            release_date TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// `casefold(x)`: Unicode lower-casing, which SQLite's own `lower()` and
/// `LIKE` only do for ASCII.
fn register_functions(conn: &Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: String = ctx.get(0)?;
            Ok(value.to_lowercase())
        },
    )?;
    Ok(())
}

#[async_trait]
impl SongRepository for SqliteSongRepository {
    async fn create(&self, song: &NewSong) -> Result<i64, StoreError> {
        let song = song.clone();
        self.call(move |conn| {
            let now = now_micros();
            conn.execute(
                "INSERT INTO songs (group_name, title, release_date, link, text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    song.group_name,
                    song.title,
                    song.release_date,
                    song.link,
                    song.text,
                    now
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Song>, StoreError> {
        let row = self
            .call(move |conn| {
                let sql = format!("SELECT {} FROM songs WHERE id = ?1", SONG_COLUMNS);
                Ok(conn
                    .query_row(&sql, params![id], SongRow::from_row)
                    .optional()?)
            })
            .await?;

        row.map(Song::try_from).transpose()
    }

    async fn get_all(
        &self,
        filter: &SongFilter,
        pagination: Pagination,
    ) -> Result<Vec<Song>, StoreError> {
        let query = build_list_query(filter, pagination);
        debug!("Listing songs: {}", query.sql);

        let rows = self
            .call(move |conn| {
                let mut stmt = conn.prepare(&query.sql)?;
                let rows = stmt.query_map(params_from_iter(query.params.iter()), SongRow::from_row)?;

                let mut songs = Vec::new();
                for row in rows {
                    songs.push(row?);
                }
                Ok(songs)
            })
            .await?;

        rows.into_iter().map(Song::try_from).collect()
    }

    async fn update(&self, song: &Song) -> Result<(), StoreError> {
        let song = song.clone();
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE songs
                 SET group_name = ?1, title = ?2, release_date = ?3, link = ?4, text = ?5,
                     updated_at = MAX(?6, updated_at + 1)
                 WHERE id = ?7",
                params![
                    song.group_name,
                    song.title,
                    song.release_date,
                    song.link,
                    song.text,
                    now_micros(),
                    song.id
                ],
            )?;
            if changed == 0 {
                debug!("Update matched no row for id={}", song.id);
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.call(move |conn| {
            conn.execute("DELETE FROM songs WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }
}
