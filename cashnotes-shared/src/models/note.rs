/// Note model, lifecycle state machine, and database operations
///
/// A note is a user-owned financial memo: title, amount, description, date,
/// tags, and a lifecycle status. The status governs visibility in listings
/// and which transitions are legal.
///
/// # State Machine
///
/// ```text
/// active   → archive   → archived
/// archived → unarchive → active
/// any      → trash     → trashed   (stamps trashed_at)
/// trashed  → restore   → active    (clears trashed_at)
/// ```
///
/// Archiving a trashed note is rejected; it must be restored first. Permanent
/// delete is not a state: it removes the row entirely. Status changes flow
/// exclusively through [`NoteStatus::apply`] — the generic update path does
/// not accept a status.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE note_status AS ENUM ('active', 'archived', 'trashed');
///
/// CREATE TABLE notes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     amount DOUBLE PRECISION NOT NULL DEFAULT 0,
///     description TEXT NOT NULL,
///     date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     status note_status NOT NULL DEFAULT 'active',
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     trashed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::search::{NoteFilter, NoteFilterQueryBuilder, QueryParam, Sort};

/// Note lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "note_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    /// Visible in default listings
    Active,

    /// Hidden from default listings, reachable via the archived listing and
    /// `includeArchived` searches
    Archived,

    /// Soft-deleted; only reachable via the trash listing
    Trashed,
}

/// Lifecycle operations on a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTransition {
    Archive,
    Unarchive,
    Trash,
    Restore,
}

/// Error type for rejected lifecycle transitions
///
/// Each variant's message is the human-readable text returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot archive a note that is in trash. Please restore it first.")]
    ArchiveTrashed,

    #[error("Note is not in archived status.")]
    NotArchived,

    #[error("Note is not in trash status.")]
    NotTrashed,
}

impl NoteStatus {
    /// Status as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Active => "active",
            NoteStatus::Archived => "archived",
            NoteStatus::Trashed => "trashed",
        }
    }

    /// Applies a lifecycle transition, enforcing the guards
    ///
    /// Pure: returns the next status or the guard violation. Persistence is
    /// the caller's concern.
    pub fn apply(self, transition: NoteTransition) -> Result<NoteStatus, TransitionError> {
        match transition {
            NoteTransition::Archive => match self {
                NoteStatus::Trashed => Err(TransitionError::ArchiveTrashed),
                _ => Ok(NoteStatus::Archived),
            },
            NoteTransition::Unarchive => match self {
                NoteStatus::Archived => Ok(NoteStatus::Active),
                _ => Err(TransitionError::NotArchived),
            },
            NoteTransition::Trash => Ok(NoteStatus::Trashed),
            NoteTransition::Restore => match self {
                NoteStatus::Trashed => Ok(NoteStatus::Active),
                _ => Err(TransitionError::NotTrashed),
            },
        }
    }
}

/// Normalizes a tag sequence: trim, drop empties, de-duplicate
///
/// One uniqueness policy for every write path (create, full-replace update,
/// add-tag). First occurrence wins, insertion order is preserved.
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Note model representing a financial memo record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique note ID
    pub id: Uuid,

    /// Owning user (many-to-one)
    pub user_id: Uuid,

    /// Note title
    pub title: String,

    /// Monetary amount (non-negative)
    pub amount: f64,

    /// Free-text description
    pub description: String,

    /// Date the note refers to (defaults to creation time)
    pub date: DateTime<Utc>,

    /// Current lifecycle status
    pub status: NoteStatus,

    /// Trimmed, de-duplicated tags
    pub tags: Vec<String>,

    /// When the note was last moved to trash (None while not trashed)
    pub trashed_at: Option<DateTime<Utc>>,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// When the note was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new note
#[derive(Debug, Clone)]
pub struct CreateNote {
    /// Owning user
    pub user_id: Uuid,

    /// Title (validated non-empty at the boundary)
    pub title: String,

    /// Amount (validated non-negative at the boundary)
    pub amount: f64,

    /// Description
    pub description: String,

    /// Note date; None defaults to the creation time
    pub date: Option<DateTime<Utc>>,

    /// Tags (normalized before insert)
    pub tags: Vec<String>,
}

/// Input for a partial update
///
/// Only non-None fields are written. Status is deliberately absent: lifecycle
/// changes go through the guarded transitions, never through update.
#[derive(Debug, Clone, Default)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    pub description: Option<String>,

    /// When supplied, fully replaces the tag sequence (after normalization)
    pub tags: Option<Vec<String>>,
}

const NOTE_COLUMNS: &str = "id, user_id, title, amount, description, date, status, tags, \
                            trashed_at, created_at, updated_at";

impl Note {
    /// Creates a new note in active status
    pub async fn create(pool: &PgPool, data: CreateNote) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO notes (user_id, title, amount, description, date, tags)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6)
            RETURNING {NOTE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(data.user_id)
            .bind(data.title)
            .bind(data.amount)
            .bind(data.description)
            .bind(data.date)
            .bind(normalize_tags(&data.tags))
            .fetch_one(pool)
            .await
    }

    /// Finds a note by ID regardless of status
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a note by ID while it is active or archived
    ///
    /// Trashed notes are invisible to the plain lookup endpoint.
    pub async fn find_visible_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND status IN ('active', 'archived')"
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Counts notes in a given status
    pub async fn count_by_status(pool: &PgPool, status: NoteStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }

    /// Lists all notes in a given status, sorted
    pub async fn list_by_status(
        pool: &PgPool,
        status: NoteStatus,
        sort: Sort,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE status = $1 {}",
            sort.order_by_sql()
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    /// Lists one page of notes in a given status, sorted
    pub async fn list_by_status_page(
        pool: &PgPool,
        status: NoteStatus,
        sort: Sort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE status = $1 {} LIMIT $2 OFFSET $3",
            sort.order_by_sql()
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts all notes matching a search filter, independent of the page
    /// window
    pub async fn count_matching(pool: &PgPool, filter: &NoteFilter) -> Result<i64, sqlx::Error> {
        let (where_sql, params) = NoteFilterQueryBuilder::new(filter, 0).build();
        let sql = format!("SELECT COUNT(*) FROM notes WHERE {where_sql}");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            query = match param {
                QueryParam::String(v) => query.bind(v),
                QueryParam::StringArray(v) => query.bind(v),
                QueryParam::Float(v) => query.bind(v),
                QueryParam::Timestamp(v) => query.bind(v),
            };
        }
        query.fetch_one(pool).await
    }

    /// Runs a search filter and returns one page of matches
    pub async fn search(
        pool: &PgPool,
        filter: &NoteFilter,
        sort: Sort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (where_sql, params) = NoteFilterQueryBuilder::new(filter, 0).build();
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE {where_sql} {} LIMIT ${} OFFSET ${}",
            sort.order_by_sql(),
            params.len() + 1,
            params.len() + 2,
        );

        let mut query = sqlx::query_as::<_, Note>(&sql);
        for param in params {
            query = match param {
                QueryParam::String(v) => query.bind(v),
                QueryParam::StringArray(v) => query.bind(v),
                QueryParam::Float(v) => query.bind(v),
                QueryParam::Timestamp(v) => query.bind(v),
            };
        }
        query.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Applies a partial update
    ///
    /// Supplied tags replace the stored sequence after normalization.
    /// Returns None when no note with the given ID exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateNote,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE notes
            SET title = COALESCE($2, title),
                date = COALESCE($3, date),
                amount = COALESCE($4, amount),
                description = COALESCE($5, description),
                tags = COALESCE($6, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {NOTE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(data.title)
            .bind(data.date)
            .bind(data.amount)
            .bind(data.description)
            .bind(data.tags.map(|tags| normalize_tags(&tags)))
            .fetch_optional(pool)
            .await
    }

    /// Persists a status change decided by [`NoteStatus::apply`]
    ///
    /// `trashed_at` is stamped when entering trash and cleared otherwise.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: NoteStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let trashed_at = if status == NoteStatus::Trashed {
            Some(Utc::now())
        } else {
            None
        };

        let sql = format!(
            r#"
            UPDATE notes
            SET status = $2, trashed_at = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {NOTE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(status)
            .bind(trashed_at)
            .fetch_optional(pool)
            .await
    }

    /// Persists a tags-only change, leaving every other attribute untouched
    pub async fn set_tags(
        pool: &PgPool,
        id: Uuid,
        tags: Vec<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE notes
            SET tags = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {NOTE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(tags)
            .fetch_optional(pool)
            .await
    }

    /// Permanently removes a note
    ///
    /// Returns false when nothing was deleted, so a second delete reports
    /// not-found.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_allowed_from_active_and_archived() {
        assert_eq!(
            NoteStatus::Active.apply(NoteTransition::Archive),
            Ok(NoteStatus::Archived)
        );
        assert_eq!(
            NoteStatus::Archived.apply(NoteTransition::Archive),
            Ok(NoteStatus::Archived)
        );
    }

    #[test]
    fn test_archive_rejected_on_trashed() {
        assert_eq!(
            NoteStatus::Trashed.apply(NoteTransition::Archive),
            Err(TransitionError::ArchiveTrashed)
        );
    }

    #[test]
    fn test_unarchive_requires_archived() {
        assert_eq!(
            NoteStatus::Archived.apply(NoteTransition::Unarchive),
            Ok(NoteStatus::Active)
        );
        assert_eq!(
            NoteStatus::Active.apply(NoteTransition::Unarchive),
            Err(TransitionError::NotArchived)
        );
        assert_eq!(
            NoteStatus::Trashed.apply(NoteTransition::Unarchive),
            Err(TransitionError::NotArchived)
        );
    }

    #[test]
    fn test_trash_is_unconditional() {
        for status in [NoteStatus::Active, NoteStatus::Archived, NoteStatus::Trashed] {
            assert_eq!(status.apply(NoteTransition::Trash), Ok(NoteStatus::Trashed));
        }
    }

    #[test]
    fn test_restore_requires_trashed() {
        assert_eq!(
            NoteStatus::Trashed.apply(NoteTransition::Restore),
            Ok(NoteStatus::Active)
        );
        assert_eq!(
            NoteStatus::Active.apply(NoteTransition::Restore),
            Err(TransitionError::NotTrashed)
        );
        assert_eq!(
            NoteStatus::Archived.apply(NoteTransition::Restore),
            Err(TransitionError::NotTrashed)
        );
    }

    #[test]
    fn test_archive_unarchive_round_trip() {
        let archived = NoteStatus::Active.apply(NoteTransition::Archive).unwrap();
        assert_eq!(
            archived.apply(NoteTransition::Unarchive),
            Ok(NoteStatus::Active)
        );
    }

    #[test]
    fn test_trash_restore_round_trip() {
        let trashed = NoteStatus::Active.apply(NoteTransition::Trash).unwrap();
        assert_eq!(trashed.apply(NoteTransition::Restore), Ok(NoteStatus::Active));
    }

    #[test]
    fn test_normalize_tags_trims_and_drops_empties() {
        let raw = vec![" rent ".to_string(), "".to_string(), "  ".to_string(), "may".to_string()];
        assert_eq!(normalize_tags(&raw), vec!["rent", "may"]);
    }

    #[test]
    fn test_normalize_tags_deduplicates_preserving_order() {
        let raw = vec!["rent".to_string(), "may".to_string(), " rent".to_string()];
        assert_eq!(normalize_tags(&raw), vec!["rent", "may"]);
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(NoteStatus::Active.as_str(), "active");
        assert_eq!(NoteStatus::Archived.as_str(), "archived");
        assert_eq!(NoteStatus::Trashed.as_str(), "trashed");
    }
}
