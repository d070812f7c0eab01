//! PostgreSQL-backed `InviteRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{InviteRepository, InviteRepositoryError};
use crate::domain::{Email, Invite, InviteId, InviteToken, Membership, OrganizationId};

use super::diesel_basic_error_mapping::{
    classify_diesel_error, pool_error_message, DieselFailure,
};
use super::models::{InviteRow, MembershipRow};
use super::pool::{DbPool, PoolError};
use super::schema::{invites, memberships};

const PENDING_CONSTRAINT: &str = "invites_email_org_id_key";
const MEMBERSHIP_CONSTRAINT: &str = "memberships_pkey";

/// Diesel implementation of [`InviteRepository`].
#[derive(Clone)]
pub struct DieselInviteRepository {
    pool: DbPool,
}

impl DieselInviteRepository {
    /// Build a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> InviteRepositoryError {
    InviteRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> InviteRepositoryError {
    let failure = classify_diesel_error(error);
    if failure.violates(PENDING_CONSTRAINT) {
        return InviteRepositoryError::duplicate_invite();
    }
    if failure.violates(MEMBERSHIP_CONSTRAINT) {
        return InviteRepositoryError::duplicate_membership();
    }
    match failure {
        DieselFailure::Connection(message) => InviteRepositoryError::connection(message),
        DieselFailure::UniqueViolation { .. } => InviteRepositoryError::query("unique constraint violated"),
        DieselFailure::Query(message) => InviteRepositoryError::query(message),
    }
}

/// The accept transaction signals a missing invite row with `NotFound`.
fn map_accept_error(error: diesel::result::Error) -> InviteRepositoryError {
    match error {
        diesel::result::Error::NotFound => InviteRepositoryError::consumed(),
        other => map_diesel_error(other),
    }
}

fn decode(row: InviteRow) -> Result<Invite, InviteRepositoryError> {
    Invite::try_from(row).map_err(|err| InviteRepositoryError::query(err.to_string()))
}

#[async_trait]
impl InviteRepository for DieselInviteRepository {
    async fn insert(&self, invite: &Invite) -> Result<(), InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(invites::table)
            .values(&InviteRow::from(invite))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_token(&self, token: &InviteToken) -> Result<Option<Invite>, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<InviteRow> = invites::table
            .filter(invites::token.eq(token.as_str()))
            .select(InviteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode).transpose()
    }

    async fn find_for_email(
        &self,
        org_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<Invite>, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<InviteRow> = invites::table
            .filter(invites::org_id.eq(org_id.as_uuid()))
            .filter(invites::email.eq(email.as_ref()))
            .select(InviteRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode).transpose()
    }

    async fn list_for_org(&self, org_id: &OrganizationId) -> Result<Vec<Invite>, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<InviteRow> = invites::table
            .filter(invites::org_id.eq(org_id.as_uuid()))
            .order(invites::created_at.desc())
            .select(InviteRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(decode).collect()
    }

    async fn delete(&self, id: &InviteId) -> Result<bool, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(invites::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn delete_in_org(
        &self,
        org_id: &OrganizationId,
        id: &InviteId,
    ) -> Result<bool, InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(
            invites::table
                .filter(invites::id.eq(id.as_uuid()))
                .filter(invites::org_id.eq(org_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn accept(&self, invite: &Invite, membership: &Membership) -> Result<(), InviteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let invite_id = *invite.id.as_uuid();
        let membership_row = MembershipRow::from(membership);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                // Deleting first makes a concurrent second accept find nothing.
                let removed = diesel::delete(invites::table.find(invite_id))
                    .execute(conn)
                    .await?;
                if removed == 0 {
                    return Err(diesel::result::Error::NotFound);
                }
                diesel::insert_into(memberships::table)
                    .values(&membership_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_accept_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug)]
    struct Violation(&'static str);

    impl diesel::result::DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "duplicate key"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            None
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[rstest]
    #[case(PENDING_CONSTRAINT, InviteRepositoryError::duplicate_invite())]
    #[case(MEMBERSHIP_CONSTRAINT, InviteRepositoryError::duplicate_membership())]
    #[case("invites_token_key", InviteRepositoryError::query("unique constraint violated"))]
    fn unique_violations_map_by_constraint(
        #[case] constraint: &'static str,
        #[case] expected: InviteRepositoryError,
    ) {
        let error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new(Violation(constraint)),
        );
        assert_eq!(map_diesel_error(error), expected);
    }

    #[test]
    fn missing_invite_row_during_accept_is_consumed() {
        assert_eq!(
            map_accept_error(diesel::result::Error::NotFound),
            InviteRepositoryError::consumed()
        );
    }

    #[test]
    fn membership_clash_during_accept_keeps_its_meaning() {
        let error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new(Violation(MEMBERSHIP_CONSTRAINT)),
        );
        assert_eq!(map_accept_error(error), InviteRepositoryError::duplicate_membership());
    }
}
