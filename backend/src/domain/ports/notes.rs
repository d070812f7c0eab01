//! Driving ports for notes and comments.

use async_trait::async_trait;

use crate::domain::{
    Comment, CommentBody, CommentId, Error, Note, NoteDetail, NoteDraft, NoteId, NoteStatus,
    NoteSummary, OrganizationId, UserId,
};

/// Mutating note operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotesCommand: Send + Sync {
    /// Create an open note (requires `create:content`).
    async fn create_note(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        draft: &NoteDraft,
    ) -> Result<Note, Error>;

    /// Replace title and content (author, owner, or admin).
    async fn update_note(&self, caller: &UserId, note_id: &NoteId, draft: &NoteDraft) -> Result<Note, Error>;

    /// Delete a note with its comments (author, owner, or admin).
    async fn delete_note(&self, caller: &UserId, note_id: &NoteId) -> Result<(), Error>;

    /// Flip open/closed (author, owner, or admin).
    async fn toggle_note_status(&self, caller: &UserId, note_id: &NoteId) -> Result<Note, Error>;

    /// Comment on a note, optionally replying to a comment on the same note.
    async fn add_comment(
        &self,
        caller: &UserId,
        note_id: &NoteId,
        body: &CommentBody,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, Error>;

    /// Delete a comment and its replies (author, owner, or admin).
    async fn delete_comment(&self, caller: &UserId, comment_id: &CommentId) -> Result<(), Error>;
}

/// Note reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotesQuery: Send + Sync {
    /// Notes of an organization, newest first, optionally filtered by status.
    async fn list_notes(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        status: Option<NoteStatus>,
    ) -> Result<Vec<NoteSummary>, Error>;

    /// Note with its comment threads.
    async fn get_note(&self, caller: &UserId, note_id: &NoteId) -> Result<NoteDetail, Error>;
}
