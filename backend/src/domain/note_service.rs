//! Notes and comments service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::directory::label_for;
use super::ports::{
    IdentityProvider, NoteRepository, NoteRepositoryError, NotesCommand, NotesQuery,
    OrganizationRepository,
};
use super::{
    Authorizer, Comment, CommentBody, CommentId, CommentView, Error, Note, NoteDetail, NoteDraft,
    NoteId, NoteStatus, NoteSummary, OrganizationId, Permission, UserDirectory, UserId,
    build_comment_tree,
};

fn map_note_error(error: NoteRepositoryError) -> Error {
    match error {
        NoteRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("note repository unavailable: {message}"))
        }
        NoteRepositoryError::Query { message } => {
            Error::internal(format!("note repository error: {message}"))
        }
    }
}

/// Domain service for notes and their comment threads.
pub struct NoteService<N, O, I> {
    notes: Arc<N>,
    authorizer: Authorizer<O>,
    directory: UserDirectory<I>,
    clock: Arc<dyn Clock>,
}

impl<N, O, I> NoteService<N, O, I>
where
    N: NoteRepository,
    O: OrganizationRepository,
    I: IdentityProvider,
{
    /// Create the service.
    pub fn new(notes: Arc<N>, organizations: Arc<O>, identity: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            notes,
            authorizer: Authorizer::new(organizations),
            directory: UserDirectory::new(identity),
            clock,
        }
    }

    async fn load(&self, note_id: &NoteId) -> Result<Note, Error> {
        self.notes
            .find_by_id(note_id)
            .await
            .map_err(map_note_error)?
            .ok_or_else(|| Error::not_found("note not found"))
    }

    /// Load a note the caller may edit.
    async fn load_for_edit(&self, caller: &UserId, note_id: &NoteId) -> Result<Note, Error> {
        let note = self.load(note_id).await?;
        self.authorizer
            .require_can_modify(caller, &note.org_id, &note.author_id)
            .await?;
        Ok(note)
    }

    async fn persist(&self, note: &Note) -> Result<(), Error> {
        let updated = self.notes.update(note).await.map_err(map_note_error)?;
        if updated {
            Ok(())
        } else {
            Err(Error::not_found("note not found"))
        }
    }
}

#[async_trait]
impl<N, O, I> NotesCommand for NoteService<N, O, I>
where
    N: NoteRepository,
    O: OrganizationRepository,
    I: IdentityProvider,
{
    async fn create_note(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        draft: &NoteDraft,
    ) -> Result<Note, Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::CreateContent)
            .await?;
        let note = Note::create(draft, *caller, *org_id, self.clock.utc());
        self.notes.insert(&note).await.map_err(map_note_error)?;
        Ok(note)
    }

    async fn update_note(&self, caller: &UserId, note_id: &NoteId, draft: &NoteDraft) -> Result<Note, Error> {
        let mut note = self.load_for_edit(caller, note_id).await?;
        note.revise(draft, self.clock.utc());
        self.persist(&note).await?;
        Ok(note)
    }

    async fn delete_note(&self, caller: &UserId, note_id: &NoteId) -> Result<(), Error> {
        let note = self.load_for_edit(caller, note_id).await?;
        if !self.notes.delete(&note.id).await.map_err(map_note_error)? {
            return Err(Error::not_found("note not found"));
        }
        info!(%note_id, org_id = %note.org_id, by = %caller, "note deleted");
        Ok(())
    }

    async fn toggle_note_status(&self, caller: &UserId, note_id: &NoteId) -> Result<Note, Error> {
        let mut note = self.load_for_edit(caller, note_id).await?;
        note.toggle_status(self.clock.utc());
        self.persist(&note).await?;
        Ok(note)
    }

    async fn add_comment(
        &self,
        caller: &UserId,
        note_id: &NoteId,
        body: &CommentBody,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, Error> {
        let note = self.load(note_id).await?;
        self.authorizer
            .require_permission(caller, &note.org_id, Permission::CreateContent)
            .await?;
        if let Some(parent) = parent_id {
            let parent_comment = self
                .notes
                .find_comment(&parent)
                .await
                .map_err(map_note_error)?;
            if parent_comment.is_none_or(|found| found.note_id != note.id) {
                return Err(Error::invalid_request("parent comment does not belong to this note")
                    .with_details(json!({ "field": "parentId", "code": "invalid_parent" })));
            }
        }
        let comment = Comment::create(body, *caller, note.id, parent_id, self.clock.utc());
        self.notes
            .insert_comment(&comment)
            .await
            .map_err(map_note_error)?;
        Ok(comment)
    }

    async fn delete_comment(&self, caller: &UserId, comment_id: &CommentId) -> Result<(), Error> {
        let comment = self
            .notes
            .find_comment(comment_id)
            .await
            .map_err(map_note_error)?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        let note = self.load(&comment.note_id).await?;
        self.authorizer
            .require_can_modify(caller, &note.org_id, &comment.author_id)
            .await?;
        if !self
            .notes
            .delete_comment(comment_id)
            .await
            .map_err(map_note_error)?
        {
            return Err(Error::not_found("comment not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl<N, O, I> NotesQuery for NoteService<N, O, I>
where
    N: NoteRepository,
    O: OrganizationRepository,
    I: IdentityProvider,
{
    async fn list_notes(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        status: Option<NoteStatus>,
    ) -> Result<Vec<NoteSummary>, Error> {
        self.authorizer.require_member(caller, org_id).await?;
        let rows = self
            .notes
            .list_for_org(org_id, status)
            .await
            .map_err(map_note_error)?;
        let authors: Vec<UserId> = rows.iter().map(|(note, _)| note.author_id).collect();
        let profiles = self.directory.profiles(&authors).await;
        Ok(rows
            .into_iter()
            .map(|(note, comment_count)| NoteSummary {
                author_name: label_for(&profiles, &note.author_id),
                note,
                comment_count,
            })
            .collect())
    }

    async fn get_note(&self, caller: &UserId, note_id: &NoteId) -> Result<NoteDetail, Error> {
        let note = self.load(note_id).await?;
        self.authorizer.require_member(caller, &note.org_id).await?;
        let comments = self
            .notes
            .list_comments(note_id)
            .await
            .map_err(map_note_error)?;

        let mut people: Vec<UserId> = comments.iter().map(|comment| comment.author_id).collect();
        people.push(note.author_id);
        let profiles = self.directory.profiles(&people).await;

        let views = comments
            .into_iter()
            .map(|comment| CommentView {
                author_name: label_for(&profiles, &comment.author_id),
                comment,
            })
            .collect();
        Ok(NoteDetail {
            author_name: label_for(&profiles, &note.author_id),
            note,
            comments: build_comment_tree(views),
        })
    }
}

#[cfg(test)]
#[path = "note_service_tests.rs"]
mod tests;
