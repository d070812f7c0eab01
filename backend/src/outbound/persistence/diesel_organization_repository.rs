//! PostgreSQL-backed `OrganizationRepository`.
//!
//! Organization creation writes the tenant row and the owner's membership in
//! one transaction. Deletion relies on `ON DELETE CASCADE` for everything
//! scoped to the organization.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{OrganizationRepository, OrganizationRepositoryError};
use crate::domain::{
    Membership, MembershipWithOrganization, OrgRole, Organization, OrganizationId, UserId,
};

use super::diesel_basic_error_mapping::{
    classify_diesel_error, pool_error_message, DieselFailure,
};
use super::models::{MembershipRow, OrganizationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{memberships, organizations};

const SLUG_CONSTRAINT: &str = "organizations_slug_key";
const MEMBERSHIP_CONSTRAINT: &str = "memberships_pkey";

/// Diesel implementation of [`OrganizationRepository`].
#[derive(Clone)]
pub struct DieselOrganizationRepository {
    pool: DbPool,
}

impl DieselOrganizationRepository {
    /// Build a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganizationRepositoryError {
    OrganizationRepositoryError::connection(pool_error_message(error))
}

fn map_failure(failure: DieselFailure, slug: Option<&str>) -> OrganizationRepositoryError {
    if failure.violates(MEMBERSHIP_CONSTRAINT) {
        return OrganizationRepositoryError::duplicate_membership();
    }
    if let (true, Some(slug)) = (failure.violates(SLUG_CONSTRAINT), slug) {
        return OrganizationRepositoryError::duplicate_slug(slug);
    }
    match failure {
        DieselFailure::Connection(message) => OrganizationRepositoryError::connection(message),
        DieselFailure::UniqueViolation { .. } => {
            OrganizationRepositoryError::query("unique constraint violated")
        }
        DieselFailure::Query(message) => OrganizationRepositoryError::query(message),
    }
}

fn map_diesel_error(error: diesel::result::Error) -> OrganizationRepositoryError {
    map_failure(classify_diesel_error(error), None)
}

fn decode_membership(row: MembershipRow) -> Result<Membership, OrganizationRepositoryError> {
    Membership::try_from(row).map_err(|err| OrganizationRepositoryError::query(err.to_string()))
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[async_trait]
impl OrganizationRepository for DieselOrganizationRepository {
    async fn create_with_owner(
        &self,
        organization: &Organization,
        owner: &Membership,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let org_row = OrganizationRow::from(organization);
        let owner_row = MembershipRow::from(owner);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(organizations::table)
                    .values(&org_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(memberships::table)
                    .values(&owner_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_failure(classify_diesel_error(err), Some(&organization.slug)))
    }

    async fn find_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<OrganizationRow> = organizations::table
            .find(id.as_uuid())
            .select(OrganizationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(Organization::from))
    }

    async fn update(&self, organization: &Organization) -> Result<bool, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::update(organizations::table.find(organization.id.as_uuid()))
            .set((
                organizations::name.eq(&organization.name),
                organizations::slug.eq(&organization.slug),
                organizations::updated_at.eq(organization.updated_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_failure(classify_diesel_error(err), Some(&organization.slug)))?;

        Ok(affected > 0)
    }

    async fn delete(&self, id: &OrganizationId) -> Result<bool, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(organizations::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn find_membership(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<MembershipRow> = memberships::table
            .find((user_id.as_uuid(), org_id.as_uuid()))
            .select(MembershipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode_membership).transpose()
    }

    async fn list_memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipWithOrganization>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(MembershipRow, OrganizationRow)> = memberships::table
            .inner_join(organizations::table)
            .filter(memberships::user_id.eq(user_id.as_uuid()))
            .order(memberships::joined_at.desc())
            .select((MembershipRow::as_select(), OrganizationRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(membership, organization)| {
                Ok(MembershipWithOrganization {
                    membership: decode_membership(membership)?,
                    organization: organization.into(),
                })
            })
            .collect()
    }

    async fn list_members(
        &self,
        org_id: &OrganizationId,
    ) -> Result<Vec<Membership>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MembershipRow> = memberships::table
            .filter(memberships::org_id.eq(org_id.as_uuid()))
            .order(memberships::joined_at.asc())
            .select(MembershipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(decode_membership).collect()
    }

    async fn count_members(&self, org_id: &OrganizationId) -> Result<u64, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let count: i64 = memberships::table
            .filter(memberships::org_id.eq(org_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(count_to_u64(count))
    }

    async fn update_member_role(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
        role: OrgRole,
    ) -> Result<bool, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::update(memberships::table.find((user_id.as_uuid(), org_id.as_uuid())))
            .set(memberships::role.eq(role.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn remove_member(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<bool, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(memberships::table.find((user_id.as_uuid(), org_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn remove_all_memberships(&self, user_id: &UserId) -> Result<u64, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let of_user = memberships::table.filter(memberships::user_id.eq(user_id.as_uuid()));
        let affected = diesel::delete(of_user)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(u64::try_from(affected).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unique(constraint: &str) -> DieselFailure {
        DieselFailure::UniqueViolation {
            constraint: Some(constraint.to_owned()),
        }
    }

    #[rstest]
    fn slug_clash_reports_the_slug() {
        let err = map_failure(unique(SLUG_CONSTRAINT), Some("acme"));
        assert_eq!(err, OrganizationRepositoryError::duplicate_slug("acme"));
    }

    #[rstest]
    fn membership_clash_is_distinguished() {
        let err = map_failure(unique(MEMBERSHIP_CONSTRAINT), Some("acme"));
        assert_eq!(err, OrganizationRepositoryError::duplicate_membership());
    }

    #[rstest]
    fn dropped_connection_maps_to_connection_error() {
        let err = map_failure(DieselFailure::Connection("gone"), None);
        assert_eq!(err, OrganizationRepositoryError::connection("gone"));
    }
}
