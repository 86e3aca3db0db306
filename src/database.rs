//! Database initialization, table definitions and record access
//!
//! This module handles the setup of the embedded redb database and the reads
//! and writes the handlers need. Every value is stored as a JSON string.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{distr::Alphanumeric, Rng};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::comments_tree::{build_forest, CommentForest};
use crate::error::AppError;
use crate::event_url::{self, EventStamp, ShortCodeQuery};
use crate::model::{Comment, EventRecord};

/// Main table for storing events
///
/// Key: Event id
/// Value: JSON-serialized EventRecord
pub const TABLE_EVENTS: TableDefinition<&str, &str> = TableDefinition::new("events_v1");

/// Ordinal ledger used to assign short codes
///
/// Key: Composite key in format "{MMDD}:{created_at_micros:020}:{event_id}"
/// Value: JSON-serialized EventStamp
///
/// Example:
/// - Key: "1219:00001733000000000000:k3J9xQ2mLp0a"
///
/// Entries are never removed, not even when the event is deleted, so an
/// ordinal is never handed out twice. The key spans every year, so events on
/// the same month/day in different years get different ordinals.
pub const TABLE_EVENT_DAYS: TableDefinition<&str, &str> = TableDefinition::new("event_days_v1");

/// Short code to event id
pub const TABLE_SHORT_CODES: TableDefinition<&str, &str> = TableDefinition::new("short_codes_v1");

/// Comments grouped by post
///
/// Key: Composite key in format "{post_id}:{created_at_micros:020}:{comment_id}"
/// Value: JSON-serialized Comment
///
/// The timestamp in the key keeps a post's comments in chronological order.
pub const TABLE_COMMENTS: TableDefinition<&str, &str> = TableDefinition::new("comments_v1");

/// Comment id to its key in [`TABLE_COMMENTS`]
pub const TABLE_COMMENT_IDS: TableDefinition<&str, &str> = TableDefinition::new("comment_ids_v1");

const ID_LEN: usize = 12;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database
    pub db: Arc<Database>,

    /// Public origin used to build event links, without trailing slash
    pub base_url: Arc<str>,
}

impl AppState {
    pub fn new(db: Database, base_url: &str) -> Self {
        AppState {
            db: Arc::new(db),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    /// Shareable short link of an event
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/e/{}", self.base_url, short_code)
    }

    /// Page of an event on the community site
    pub fn event_url(&self, event_id: &str) -> String {
        format!("{}/events/{}", self.base_url, event_id)
    }
}

/// Initializes the embedded database and creates required tables
///
/// # Example
///
/// ```no_run
/// # use founders_links::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_EVENTS)?;
        write_txn.open_table(TABLE_EVENT_DAYS)?;
        write_txn.open_table(TABLE_SHORT_CODES)?;
        write_txn.open_table(TABLE_COMMENTS)?;
        write_txn.open_table(TABLE_COMMENT_IDS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

fn random_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

fn ledger_key(event_date: NaiveDate, created_at: DateTime<Utc>, id: &str) -> String {
    format!(
        "{}:{:020}:{}",
        ShortCodeQuery::month_day_of(event_date),
        created_at.timestamp_micros(),
        id
    )
}

fn comment_key(post_id: &str, created_at: DateTime<Utc>, id: &str) -> String {
    format!("{}:{:020}:{}", post_id, created_at.timestamp_micros(), id)
}

/// Collects the values of every key starting with "{prefix}:"
///
/// The upper bound "{prefix}:{" works because '{' sorts after every
/// character used in the rest of the key.
fn prefixed<T>(table: &impl ReadableTable<&'static str, &'static str>, prefix: &str) -> Result<Vec<T>, AppError>
where
    T: serde::de::DeserializeOwned,
{
    let start_key = format!("{}:", prefix);
    let end_key = format!("{}:{{", prefix);

    let mut values = Vec::new();
    for entry in table.range(start_key.as_str()..end_key.as_str())? {
        let (_, value) = entry?;
        values.push(serde_json::from_str(value.value())?);
    }
    Ok(values)
}

/// Stores a new event and assigns its short code
///
/// The code is computed inside the insert transaction from the ordinal
/// ledger and persisted. redb admits one writer at a time, so two events
/// created concurrently for the same day cannot get the same ordinal.
pub fn insert_event(
    db: &Database,
    title: String,
    description: Option<String>,
    location: Option<String>,
    event_date: NaiveDate,
) -> Result<EventRecord, AppError> {
    let write_txn = db.begin_write()?;
    let record = {
        let mut events = write_txn.open_table(TABLE_EVENTS)?;
        let mut ledger = write_txn.open_table(TABLE_EVENT_DAYS)?;
        let mut codes = write_txn.open_table(TABLE_SHORT_CODES)?;

        // Draw random ids until one is free
        let mut id = random_id();
        while events.get(id.as_str())?.is_some() {
            id = random_id();
        }

        let month_day = ShortCodeQuery::month_day_of(event_date);

        // Keep creation times strictly increasing within a month/day so the
        // new event always sorts last, even if the clock stalls or steps back
        let mut created_at = Utc::now();
        let earlier: Vec<EventStamp> = prefixed(&ledger, &month_day)?;
        if let Some(latest) = earlier.iter().map(|e| e.created_at).max() {
            if created_at <= latest {
                created_at = latest + Duration::microseconds(1);
            }
        }

        let stamp = EventStamp {
            id: id.clone(),
            created_at,
            event_date,
        };
        // Record the event in the ledger first, then number it against
        // every ledger entry for the same month/day
        let stamp_json = serde_json::to_string(&stamp)?;
        ledger.insert(
            ledger_key(event_date, stamp.created_at, &id).as_str(),
            stamp_json.as_str(),
        )?;

        let same_day: Vec<EventStamp> = prefixed(&ledger, &month_day)?;
        let short_code = event_url::generate(&id, event_date, &same_day);

        // A taken code means the ledger and the code table disagree
        if let Some(owner) = codes.get(short_code.as_str())? {
            return Err(AppError::Conflict(format!(
                "short code {} is already assigned to event {}",
                short_code,
                owner.value()
            )));
        }
        codes.insert(short_code.as_str(), id.as_str())?;

        // Store the event itself with its code
        let record = EventRecord {
            id: id.clone(),
            title,
            description,
            location,
            event_date,
            created_at: stamp.created_at,
            short_code,
        };
        events.insert(id.as_str(), serde_json::to_string(&record)?.as_str())?;

        record
    };
    write_txn.commit()?;

    tracing::info!(
        event_id = %record.id,
        short_code = %record.short_code,
        event_date = %record.event_date,
        "event created"
    );

    Ok(record)
}

/// Loads one event by id
pub fn find_event(db: &Database, id: &str) -> Result<Option<EventRecord>, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_EVENTS)?;

    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_str(value.value())?)),
        None => Ok(None),
    }
}

/// Finds the event a short code points at
///
/// The persisted code mapping is consulted first. Codes that are not in the
/// mapping are resolved the derived way: the `ordinal`-th ledger entry for
/// the month/day, in `created_at` order.
pub fn resolve_short_code(
    db: &Database,
    query: &ShortCodeQuery,
    short_code: &str,
) -> Result<Option<EventRecord>, AppError> {
    // Begin a read-only transaction so both lookups see the same snapshot
    let read_txn = db.begin_read()?;
    let codes = read_txn.open_table(TABLE_SHORT_CODES)?;

    let event_id = match codes.get(short_code)? {
        // Persisted mapping, the usual case
        Some(id) => Some(id.value().to_string()),
        // Derived lookup: the ordinal-th same month/day entry of the ledger
        None => {
            let ledger = read_txn.open_table(TABLE_EVENT_DAYS)?;
            let same_day: Vec<EventStamp> = prefixed(&ledger, &query.month_day)?;
            query
                .ordinal
                .checked_sub(1)
                .and_then(|index| same_day.into_iter().nth(index as usize))
                .map(|stamp| stamp.id)
        }
    };

    let Some(event_id) = event_id else {
        return Ok(None);
    };

    // The event may have been deleted since the code was assigned
    let events = read_txn.open_table(TABLE_EVENTS)?;
    match events.get(event_id.as_str())? {
        Some(value) => Ok(Some(serde_json::from_str(value.value())?)),
        None => Ok(None),
    }
}

/// Lists events in id order, one page at a time
pub fn list_events(db: &Database, offset: usize, limit: usize) -> Result<Vec<EventRecord>, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_EVENTS)?;

    let mut events = Vec::new();
    for entry in table.iter()?.skip(offset).take(limit) {
        let (_, value) = entry?;
        events.push(serde_json::from_str(value.value())?);
    }
    Ok(events)
}

/// Removes an event and its short code mapping
///
/// The ledger entry stays, so the freed ordinal is not reassigned and the
/// code keeps resolving to nothing.
pub fn delete_event(db: &Database, id: &str) -> Result<EventRecord, AppError> {
    let write_txn = db.begin_write()?;
    let record: EventRecord = {
        let mut events = write_txn.open_table(TABLE_EVENTS)?;
        let record: EventRecord = match events.remove(id)? {
            Some(value) => serde_json::from_str(value.value())?,
            None => return Err(AppError::NotFound("Event not found")),
        };

        let mut codes = write_txn.open_table(TABLE_SHORT_CODES)?;
        codes.remove(record.short_code.as_str())?;

        record
    };
    write_txn.commit()?;

    tracing::info!(event_id = %id, short_code = %record.short_code, "event deleted");

    Ok(record)
}

/// Longest post id accepted in comment routes
pub const MAX_POST_ID_LEN: usize = 128;

/// Checks that a post id can be used as a comment key prefix
///
/// Only ASCII letters, digits, '-', '_' and '.' are accepted. All of them
/// sort before ':' or between ':' and '{', and none is ':' itself, so the
/// key range of one post never covers the keys of another.
pub fn validate_post_id(post_id: &str) -> Result<(), AppError> {
    let valid_char = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');

    if post_id.is_empty() || post_id.len() > MAX_POST_ID_LEN || !post_id.chars().all(valid_char) {
        return Err(AppError::Validation(format!(
            "post id must be 1 to {} characters of letters, digits, '-', '_' or '.'",
            MAX_POST_ID_LEN
        )));
    }
    Ok(())
}

/// Reads the comment stored under `key`, if any
fn stored_comment(
    table: &impl ReadableTable<&'static str, &'static str>,
    key: &str,
) -> Result<Option<Comment>, AppError> {
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_str(value.value())?)),
        None => Ok(None),
    }
}

/// Stores a comment on a post
///
/// A `parent_id` must name a comment of the same post at the time of
/// writing. Replies whose parent is deleted later are kept.
pub fn insert_comment(
    db: &Database,
    post_id: &str,
    author_id: String,
    content: String,
    parent_id: Option<String>,
) -> Result<Comment, AppError> {
    validate_post_id(post_id)?;

    let write_txn = db.begin_write()?;
    let comment = {
        let mut comments = write_txn.open_table(TABLE_COMMENTS)?;
        let mut ids = write_txn.open_table(TABLE_COMMENT_IDS)?;

        // A reply must point at a comment stored for this very post
        if let Some(parent_id) = &parent_id {
            let parent_key = ids.get(parent_id.as_str())?.map(|key| key.value().to_string());
            let parent = match parent_key {
                Some(key) => stored_comment(&comments, &key)?,
                None => None,
            };
            if !parent.is_some_and(|parent| parent.post_id == post_id) {
                return Err(AppError::NotFound("Parent comment not found"));
            }
        }

        // Draw random ids until one is free
        let mut id = random_id();
        while ids.get(id.as_str())?.is_some() {
            id = random_id();
        }

        let comment = Comment {
            id: id.clone(),
            post_id: post_id.to_string(),
            parent_id,
            content,
            author_id,
            created_at: Utc::now(),
        };
        let key = comment_key(post_id, comment.created_at, &id);

        // Write the comment and the id lookup together
        comments.insert(key.as_str(), serde_json::to_string(&comment)?.as_str())?;
        ids.insert(id.as_str(), key.as_str())?;

        comment
    };
    write_txn.commit()?;

    tracing::debug!(
        comment_id = %comment.id,
        post_id,
        parent_id = ?comment.parent_id,
        "comment created"
    );

    Ok(comment)
}

/// Flat comments of a post, oldest first
pub fn post_comments(db: &Database, post_id: &str) -> Result<Vec<Comment>, AppError> {
    validate_post_id(post_id)?;

    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_COMMENTS)?;

    let comments: Vec<Comment> = prefixed(&table, post_id)?;
    Ok(comments
        .into_iter()
        .filter(|comment| comment.post_id == post_id)
        .collect())
}

/// Reply forest of a post
pub fn comment_thread(db: &Database, post_id: &str) -> Result<(usize, CommentForest), AppError> {
    let comments = post_comments(db, post_id)?;
    let total = comments.len();
    Ok((total, build_forest(comments)))
}

/// Removes one comment of a post; its replies are left in place
pub fn delete_comment(db: &Database, post_id: &str, id: &str) -> Result<(), AppError> {
    validate_post_id(post_id)?;

    let write_txn = db.begin_write()?;
    {
        let mut ids = write_txn.open_table(TABLE_COMMENT_IDS)?;
        let mut comments = write_txn.open_table(TABLE_COMMENTS)?;

        let key = match ids.get(id)? {
            Some(key) => key.value().to_string(),
            None => return Err(AppError::NotFound("Comment not found")),
        };

        // The comment must belong to the post named in the path
        let belongs = stored_comment(&comments, &key)?.is_some_and(|c| c.post_id == post_id);
        if !belongs {
            return Err(AppError::NotFound("Comment not found"));
        }

        ids.remove(id)?;
        comments.remove(key.as_str())?;
    }
    write_txn.commit()?;

    tracing::debug!(comment_id = %id, post_id, "comment deleted");

    Ok(())
}
