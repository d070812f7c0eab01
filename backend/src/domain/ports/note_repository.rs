//! Port for note and comment persistence.

use async_trait::async_trait;

use crate::domain::{Comment, CommentId, Note, NoteId, NoteStatus, OrganizationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by note repository adapters.
    pub enum NoteRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "note repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "note repository query failed: {message}",
    }
}

/// Storage for notes and their comments.
///
/// Deleting a note removes its comments; deleting a comment removes its
/// replies, recursively.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a note.
    async fn insert(&self, note: &Note) -> Result<(), NoteRepositoryError>;

    /// Fetch a note by id.
    async fn find_by_id(&self, id: &NoteId) -> Result<Option<Note>, NoteRepositoryError>;

    /// Notes of an organization with their comment counts, newest first.
    async fn list_for_org(
        &self,
        org_id: &OrganizationId,
        status: Option<NoteStatus>,
    ) -> Result<Vec<(Note, u64)>, NoteRepositoryError>;

    /// Persist title, content, status, and `updated_at`.
    async fn update(&self, note: &Note) -> Result<bool, NoteRepositoryError>;

    /// Delete a note and its comments.
    async fn delete(&self, id: &NoteId) -> Result<bool, NoteRepositoryError>;

    /// Insert a comment.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), NoteRepositoryError>;

    /// Fetch a comment by id.
    async fn find_comment(&self, id: &CommentId) -> Result<Option<Comment>, NoteRepositoryError>;

    /// Comments of a note, oldest first.
    async fn list_comments(&self, note_id: &NoteId) -> Result<Vec<Comment>, NoteRepositoryError>;

    /// Delete a comment and all of its replies.
    async fn delete_comment(&self, id: &CommentId) -> Result<bool, NoteRepositoryError>;
}
