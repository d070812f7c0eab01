//! PostgreSQL-backed `NoteRepository`.
//!
//! Comment threads are removed by foreign-key cascades: deleting a note drops
//! its comments and deleting a comment drops its replies.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{NoteRepository, NoteRepositoryError};
use crate::domain::{Comment, CommentId, Note, NoteId, NoteStatus, OrganizationId};

use super::diesel_basic_error_mapping::{
    classify_diesel_error, pool_error_message, DieselFailure,
};
use super::models::{CommentRow, NoteRow, NoteUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{comments, notes};

/// Diesel implementation of [`NoteRepository`].
#[derive(Clone)]
pub struct DieselNoteRepository {
    pool: DbPool,
}

impl DieselNoteRepository {
    /// Build a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NoteRepositoryError {
    NoteRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> NoteRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => NoteRepositoryError::connection(message),
        DieselFailure::UniqueViolation { .. } => NoteRepositoryError::query("unique constraint violated"),
        DieselFailure::Query(message) => NoteRepositoryError::query(message),
    }
}

fn decode(row: NoteRow) -> Result<Note, NoteRepositoryError> {
    Note::try_from(row).map_err(|err| NoteRepositoryError::query(err.to_string()))
}

#[async_trait]
impl NoteRepository for DieselNoteRepository {
    async fn insert(&self, note: &Note) -> Result<(), NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(notes::table)
            .values(&NoteRow::from(note))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &NoteId) -> Result<Option<Note>, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<NoteRow> = notes::table
            .find(id.as_uuid())
            .select(NoteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode).transpose()
    }

    async fn list_for_org(
        &self,
        org_id: &OrganizationId,
        status: Option<NoteStatus>,
    ) -> Result<Vec<(Note, u64)>, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = notes::table
            .filter(notes::org_id.eq(org_id.as_uuid()))
            .order(notes::created_at.desc())
            .select(NoteRow::as_select())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(notes::status.eq(status.as_str()));
        }
        let rows: Vec<NoteRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let counts: HashMap<Uuid, i64> = comments::table
            .filter(comments::note_id.eq_any(&ids))
            .group_by(comments::note_id)
            .select((comments::note_id, count_star()))
            .load::<(Uuid, i64)>(&mut conn)
            .await
            .map_err(map_diesel_error)?
            .into_iter()
            .collect();

        rows.into_iter()
            .map(|row| {
                let count = counts.get(&row.id).copied().unwrap_or_default();
                Ok((decode(row)?, u64::try_from(count).unwrap_or_default()))
            })
            .collect()
    }

    async fn update(&self, note: &Note) -> Result<bool, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = NoteUpdate {
            title: &note.title,
            content: &note.content,
            status: note.status.as_str(),
            updated_at: note.updated_at,
        };
        let affected = diesel::update(notes::table.find(note.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn delete(&self, id: &NoteId) -> Result<bool, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(notes::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(comments::table)
            .values(&CommentRow::from(comment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_comment(&self, id: &CommentId) -> Result<Option<Comment>, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CommentRow> = comments::table
            .find(id.as_uuid())
            .select(CommentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Comment::from))
    }

    async fn list_comments(&self, note_id: &NoteId) -> Result<Vec<Comment>, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CommentRow> = comments::table
            .filter(comments::note_id.eq(note_id.as_uuid()))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select(CommentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<bool, NoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(comments::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }
}
