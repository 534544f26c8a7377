/// Note endpoints
///
/// CRUD over user-owned notes plus the lifecycle operations, tag mutations,
/// search, and paged listings. All routes here sit behind the bearer-token
/// gate; the authenticated identity arrives via request extensions.
///
/// # Endpoints
///
/// - `POST /notes/create` - Create a note owned by the caller
/// - `GET /notes` - All active notes, sortable
/// - `GET /notes/paginated` - One page of active notes
/// - `GET /notes/search` - Filtered search over active (and optionally
///   archived) notes
/// - `GET /notes/archived`, `GET /notes/trashed` - Paged status listings
/// - `GET|PUT|DELETE /notes/:id` - Lookup, partial update, permanent delete
/// - `PUT /notes/add-tag/:id`, `PUT /notes/remove-tag/:id` - Tag mutations
/// - `PUT /notes/{archive,unarchive,trash,restore}/:id` - Lifecycle
///   transitions
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cashnotes_shared::{
    auth::middleware::AuthContext,
    models::note::{CreateNote, Note, NoteStatus, NoteTransition, UpdateNote},
    pagination::Pagination,
    search::{NoteSearch, NoteSearchParams, Sort},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create note request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    /// Title, required, at most 255 characters
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title is required and must be at most 255 characters."
    ))]
    pub title: String,

    /// Note date; defaults to the creation time
    pub date: Option<DateTime<Utc>>,

    /// Amount; defaults to 0
    #[validate(range(min = 0.0, message = "Amount must be a non-negative number."))]
    pub amount: Option<f64>,

    /// Description, required
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,

    /// Tags (normalized before insert)
    pub tags: Option<Vec<String>>,
}

/// Partial update request
///
/// `status` is accepted by the deserializer only so a supplied value can be
/// rejected explicitly: lifecycle changes go through the guarded transition
/// endpoints, never through update.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title is required and must be at most 255 characters."
    ))]
    pub title: Option<String>,

    pub date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0, message = "Amount must be a non-negative number."))]
    pub amount: Option<f64>,

    #[validate(length(min = 1, message = "Description is required."))]
    pub description: Option<String>,

    /// When supplied, fully replaces the tag sequence
    pub tags: Option<Vec<String>>,

    pub status: Option<serde_json::Value>,
}

/// Tag mutation request
#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub tag: Option<String>,
}

/// Sort parameters for the unpaged listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Page + sort parameters for the paged listings
///
/// Page and limit stay raw strings: unparsable values fall back to the
/// defaults instead of producing a framework 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PagedQuery {
    fn sort(&self) -> Sort {
        Sort::from_params(self.sort_by.as_deref(), self.sort_order.as_deref())
    }
}

/// Create a new note owned by the authenticated user
pub async fn create_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Note>>)> {
    req.validate()?;

    let note = Note::create(
        &state.db,
        CreateNote {
            user_id: auth.user_id,
            title: req.title,
            amount: req.amount.unwrap_or(0.0),
            description: req.description,
            date: req.date,
            tags: req.tags.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(note_id = %note.id, user_id = %auth.user_id, "Note created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Create successfully", note)),
    ))
}

/// Look up a single note while it is active or archived
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    let note = Note::find_visible_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok("Notes Found", note)))
}

/// List all active notes, sortable
pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Note>>>> {
    let sort = Sort::from_params(query.sort_by.as_deref(), query.sort_order.as_deref());
    let notes = Note::list_by_status(&state.db, NoteStatus::Active, sort).await?;

    if notes.is_empty() {
        return Err(not_found());
    }

    Ok(Json(ApiResponse::ok("Notes Found", notes)))
}

/// List one page of active notes
///
/// Distinguishes "page out of range" from "no records at all" in the 404
/// message.
pub async fn list_notes_paginated(
    State(state): State<AppState>,
    Query(query): Query<PagedQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Note>>>> {
    let total = Note::count_by_status(&state.db, NoteStatus::Active).await?;
    let pagination = Pagination::from_raw(total, query.page.as_deref(), query.limit.as_deref());

    let notes = Note::list_by_status_page(
        &state.db,
        NoteStatus::Active,
        query.sort(),
        pagination.per_page,
        pagination.offset,
    )
    .await?;

    if notes.is_empty() {
        if total > 0 {
            return Err(ApiError::NotFound(
                "No notes found for this page.".to_string(),
            ));
        }
        return Err(not_found());
    }

    Ok(Json(ApiResponse::paged("Notes Found", notes, pagination)))
}

/// Search notes with filters, sort, and pagination
pub async fn search_notes(
    State(state): State<AppState>,
    Query(params): Query<NoteSearchParams>,
) -> ApiResult<Json<ApiResponse<Vec<Note>>>> {
    let search = NoteSearch::from_params(&params)?;

    let total = Note::count_matching(&state.db, &search.filter).await?;
    let pagination = Pagination::from_raw(total, search.page.as_deref(), search.limit.as_deref());

    let notes = Note::search(
        &state.db,
        &search.filter,
        search.sort,
        pagination.per_page,
        pagination.offset,
    )
    .await?;

    if notes.is_empty() {
        return Err(ApiError::NotFound(
            "No notes found matching your search criteria.".to_string(),
        ));
    }

    Ok(Json(ApiResponse::paged(
        "Notes found based on your search criteria.",
        notes,
        pagination,
    )))
}

/// List one page of archived notes
pub async fn list_archived(
    State(state): State<AppState>,
    Query(query): Query<PagedQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Note>>>> {
    status_listing(
        &state,
        NoteStatus::Archived,
        &query,
        "Archived notes retrieved successfully.",
        "No archived notes found.",
    )
    .await
}

/// List one page of trashed notes
pub async fn list_trashed(
    State(state): State<AppState>,
    Query(query): Query<PagedQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Note>>>> {
    status_listing(
        &state,
        NoteStatus::Trashed,
        &query,
        "Trashed notes retrieved successfully.",
        "Trash is empty.",
    )
    .await
}

async fn status_listing(
    state: &AppState,
    status: NoteStatus,
    query: &PagedQuery,
    ok_message: &str,
    empty_message: &str,
) -> ApiResult<Json<ApiResponse<Vec<Note>>>> {
    let total = Note::count_by_status(&state.db, status).await?;
    let pagination = Pagination::from_raw(total, query.page.as_deref(), query.limit.as_deref());

    let notes = Note::list_by_status_page(
        &state.db,
        status,
        query.sort(),
        pagination.per_page,
        pagination.offset,
    )
    .await?;

    if notes.is_empty() {
        return Err(ApiError::NotFound(empty_message.to_string()));
    }

    Ok(Json(ApiResponse::paged(ok_message, notes, pagination)))
}

/// Partially update a note
///
/// A supplied status is rejected outright; lifecycle changes have their own
/// guarded endpoints.
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    if req.status.is_some() {
        return Err(ApiError::BadRequest(
            "Status cannot be changed through update. Use the archive, trash or restore endpoints."
                .to_string(),
        ));
    }

    req.validate()?;

    let note = Note::update(
        &state.db,
        id,
        UpdateNote {
            title: req.title,
            date: req.date,
            amount: req.amount,
            description: req.description,
            tags: req.tags,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(Json(ApiResponse::ok("Update successfully", note)))
}

/// Add a tag to a note (idempotent)
pub async fn add_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TagRequest>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    let tag = clean_tag(req.tag.as_deref()).ok_or_else(|| {
        ApiError::BadRequest("Tag to add is required and must be a non-empty string.".to_string())
    })?;

    let note = Note::find_by_id(&state.db, id)
        .await?
        .ok_or_else(note_not_found)?;

    // Set-union: adding an existing tag is a no-op success.
    if note.tags.iter().any(|t| t == &tag) {
        return Ok(Json(ApiResponse::ok("Tag added successfully.", note)));
    }

    let mut tags = note.tags.clone();
    tags.push(tag);

    let note = Note::set_tags(&state.db, id, tags)
        .await?
        .ok_or_else(note_not_found)?;

    Ok(Json(ApiResponse::ok("Tag added successfully.", note)))
}

/// Remove a tag from a note
pub async fn remove_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TagRequest>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    let tag = clean_tag(req.tag.as_deref()).ok_or_else(|| {
        ApiError::BadRequest(
            "Tag to remove is required and must be a non-empty string.".to_string(),
        )
    })?;

    let note = Note::find_by_id(&state.db, id)
        .await?
        .ok_or_else(note_not_found)?;

    if !note.tags.iter().any(|t| t == &tag) {
        return Err(ApiError::NotFound("Tag not found on this note.".to_string()));
    }

    let tags: Vec<String> = note.tags.into_iter().filter(|t| t != &tag).collect();

    let note = Note::set_tags(&state.db, id, tags)
        .await?
        .ok_or_else(note_not_found)?;

    Ok(Json(ApiResponse::ok("Tag removed successfully.", note)))
}

/// Archive a note
pub async fn archive_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    transition(&state, id, NoteTransition::Archive, "Note archived successfully.").await
}

/// Unarchive a note back to active
pub async fn unarchive_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    transition(&state, id, NoteTransition::Unarchive, "Note unarchived successfully.").await
}

/// Move a note to trash
pub async fn trash_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    transition(&state, id, NoteTransition::Trash, "Note moved to trash successfully.").await
}

/// Restore a trashed note to active
pub async fn restore_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Note>>> {
    transition(&state, id, NoteTransition::Restore, "Note restored from trash successfully.").await
}

async fn transition(
    state: &AppState,
    id: Uuid,
    transition: NoteTransition,
    message: &str,
) -> ApiResult<Json<ApiResponse<Note>>> {
    let note = Note::find_by_id(&state.db, id)
        .await?
        .ok_or_else(note_not_found)?;

    let next = note.status.apply(transition)?;

    let note = Note::set_status(&state.db, id, next)
        .await?
        .ok_or_else(note_not_found)?;

    tracing::info!(note_id = %note.id, status = note.status.as_str(), "Note status changed");

    Ok(Json(ApiResponse::ok(message, note)))
}

/// Permanently delete a note
///
/// A second delete of the same note reports not-found.
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    if !Note::delete(&state.db, id).await? {
        return Err(not_found());
    }

    Ok(Json(ApiResponse::message_only("Delete successfully")))
}

/// Miss message for the lookup/listing/update/delete endpoints
fn not_found() -> ApiError {
    ApiError::NotFound("Notes not found".to_string())
}

/// Miss message for the single-note tag and lifecycle endpoints
fn note_not_found() -> ApiError {
    ApiError::NotFound("Note not found.".to_string())
}

fn clean_tag(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_requires_title_and_description() {
        let req = CreateNoteRequest {
            title: "".to_string(),
            date: None,
            amount: None,
            description: "groceries for the week".to_string(),
            tags: None,
        };
        assert!(req.validate().is_err());

        let req = CreateNoteRequest {
            title: "Groceries".to_string(),
            date: None,
            amount: None,
            description: "".to_string(),
            tags: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_negative_amount() {
        let req = CreateNoteRequest {
            title: "Groceries".to_string(),
            date: None,
            amount: Some(-12.5),
            description: "groceries".to_string(),
            tags: None,
        };
        assert!(req.validate().is_err());

        let req = CreateNoteRequest {
            title: "Groceries".to_string(),
            date: None,
            amount: Some(0.0),
            description: "groceries".to_string(),
            tags: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_validates_supplied_fields_only() {
        let req = UpdateNoteRequest {
            title: None,
            date: None,
            amount: None,
            description: None,
            tags: None,
            status: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateNoteRequest {
            title: Some("".to_string()),
            date: None,
            amount: None,
            description: None,
            tags: None,
            status: None,
        };
        assert!(req.validate().is_err());

        let req = UpdateNoteRequest {
            title: None,
            date: None,
            amount: Some(-1.0),
            description: None,
            tags: None,
            status: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_not_found_messages_per_endpoint_family() {
        // Listings and lookup/update/delete vs. the single-note tag and
        // lifecycle endpoints use different miss texts.
        assert_eq!(not_found().to_string(), "Not found: Notes not found");
        assert_eq!(note_not_found().to_string(), "Not found: Note not found.");
    }

    #[test]
    fn test_clean_tag_trims_and_rejects_blanks() {
        assert_eq!(clean_tag(Some("  rent ")), Some("rent".to_string()));
        assert_eq!(clean_tag(Some("   ")), None);
        assert_eq!(clean_tag(Some("")), None);
        assert_eq!(clean_tag(None), None);
    }
}
