//! Note and comment handlers.
//!
//! ```text
//! GET    /api/v1/orgs/{org_id}/notes?status=OPEN
//! POST   /api/v1/orgs/{org_id}/notes          {"title":"Roadmap","content":"Q3 goals"}
//! GET    /api/v1/notes/{note_id}
//! PUT    /api/v1/notes/{note_id}              {"title":"Roadmap","content":"Q4 goals"}
//! DELETE /api/v1/notes/{note_id}
//! POST   /api/v1/notes/{note_id}/toggle-status
//! POST   /api/v1/notes/{note_id}/comments     {"content":"+1","parentId":null}
//! DELETE /api/v1/comments/{comment_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CommentBody, CommentId, Error, NoteDraft, NoteId, NoteStatus, OrganizationId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CommentResponse, MessageResponse, NoteDetailResponse, NoteResponse, NoteSummaryResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_value, reject};

const NOTE_ID: FieldName = FieldName::new("noteId");

/// Body for creating or editing a note.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    /// Note title.
    #[schema(example = "Roadmap")]
    pub title: String,
    /// Note body.
    #[schema(example = "Q3 goals")]
    pub content: String,
}

/// Body for commenting on a note.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    /// Comment text.
    pub content: String,
    /// Comment being replied to; must belong to the same note.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Query filter for the note list.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NoteListParams {
    /// `OPEN` or `CLOSED`.
    pub status: Option<String>,
}

/// List notes of an organization.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/notes",
    params(("org_id" = String, Path, description = "Organization id"), NoteListParams),
    responses(
        (status = 200, description = "Notes, newest first", body = [NoteSummaryResponse]),
        (status = 404, description = "Unknown or not a member", body = Error)
    ),
    tags = ["notes"],
    operation_id = "listNotes"
)]
#[get("/orgs/{org_id}/notes")]
pub async fn list_notes(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<NoteListParams>,
) -> ApiResult<web::Json<Vec<NoteSummaryResponse>>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, FieldName::new("orgId"))?;
    let status: Option<NoteStatus> = query
        .status
        .as_deref()
        .map(|raw| parse_value(raw, FieldName::new("status")))
        .transpose()?;
    let notes = state.notes_query.list_notes(&caller, &org_id, status).await?;
    Ok(web::Json(notes.into_iter().map(Into::into).collect()))
}

/// Create a note.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/notes",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = NoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Invalid title or content", body = Error),
        (status = 403, description = "Viewers cannot create notes", body = Error)
    ),
    tags = ["notes"],
    operation_id = "createNote"
)]
#[post("/orgs/{org_id}/notes")]
pub async fn create_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<NoteRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, FieldName::new("orgId"))?;
    let draft = NoteDraft::new(&payload.title, &payload.content).map_err(reject)?;
    let note = state.notes.create_note(&caller, &org_id, &draft).await?;
    Ok(HttpResponse::Created().json(NoteResponse::from(note)))
}

/// Note with its threaded comments.
#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note detail", body = NoteDetailResponse),
        (status = 404, description = "Unknown note or not a member", body = Error)
    ),
    tags = ["notes"],
    operation_id = "getNote"
)]
#[get("/notes/{note_id}")]
pub async fn get_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NoteDetailResponse>> {
    let caller = session.require_user_id()?;
    let note_id: NoteId = parse_id(&path, NOTE_ID)?;
    let detail = state.notes_query.get_note(&caller, &note_id).await?;
    Ok(web::Json(detail.into()))
}

/// Edit a note.
#[utoipa::path(
    put,
    path = "/api/v1/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    request_body = NoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NoteResponse),
        (status = 403, description = "Only the author or an admin", body = Error)
    ),
    tags = ["notes"],
    operation_id = "updateNote"
)]
#[put("/notes/{note_id}")]
pub async fn update_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<NoteRequest>,
) -> ApiResult<web::Json<NoteResponse>> {
    let caller = session.require_user_id()?;
    let note_id: NoteId = parse_id(&path, NOTE_ID)?;
    let draft = NoteDraft::new(&payload.title, &payload.content).map_err(reject)?;
    let note = state.notes.update_note(&caller, &note_id, &draft).await?;
    Ok(web::Json(note.into()))
}

/// Delete a note and its comments.
#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "Note and comments deleted", body = MessageResponse),
        (status = 403, description = "Only the author or an admin", body = Error)
    ),
    tags = ["notes"],
    operation_id = "deleteNote"
)]
#[delete("/notes/{note_id}")]
pub async fn delete_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let note_id: NoteId = parse_id(&path, NOTE_ID)?;
    state.notes.delete_note(&caller, &note_id).await?;
    Ok(web::Json(MessageResponse::new("Note deleted")))
}

/// Flip a note between open and closed.
#[utoipa::path(
    post,
    path = "/api/v1/notes/{note_id}/toggle-status",
    params(("note_id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "Status flipped", body = NoteResponse),
        (status = 403, description = "Only the author or an admin", body = Error)
    ),
    tags = ["notes"],
    operation_id = "toggleNoteStatus"
)]
#[post("/notes/{note_id}/toggle-status")]
pub async fn toggle_note_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NoteResponse>> {
    let caller = session.require_user_id()?;
    let note_id: NoteId = parse_id(&path, NOTE_ID)?;
    let note = state.notes.toggle_note_status(&caller, &note_id).await?;
    Ok(web::Json(note.into()))
}

/// Comment on a note or reply to a comment.
#[utoipa::path(
    post,
    path = "/api/v1/notes/{note_id}/comments",
    params(("note_id" = String, Path, description = "Note id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Blank comment or foreign parent", body = Error),
        (status = 404, description = "Unknown note or not a member", body = Error)
    ),
    tags = ["notes"],
    operation_id = "addComment"
)]
#[post("/notes/{note_id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_user_id()?;
    let note_id: NoteId = parse_id(&path, NOTE_ID)?;
    let body = CommentBody::new(&payload.content).map_err(reject)?;
    let parent_id: Option<CommentId> = payload
        .parent_id
        .as_deref()
        .map(|raw| parse_id(raw, FieldName::new("parentId")))
        .transpose()?;
    let comment = state
        .notes
        .add_comment(&caller, &note_id, &body, parent_id)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

/// Delete a comment and its replies.
#[utoipa::path(
    delete,
    path = "/api/v1/comments/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment and replies deleted", body = MessageResponse),
        (status = 403, description = "Only the author or an admin", body = Error)
    ),
    tags = ["notes"],
    operation_id = "deleteComment"
)]
#[delete("/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let comment_id: CommentId = parse_id(&path, FieldName::new("commentId"))?;
    state.notes.delete_comment(&caller, &comment_id).await?;
    Ok(web::Json(MessageResponse::new("Comment deleted")))
}
