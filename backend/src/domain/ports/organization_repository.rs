//! Port for organization and membership persistence.
//!
//! Memberships live with organizations because every authorization check
//! starts from the `(user, organization)` pair.

use async_trait::async_trait;

use crate::domain::{
    Membership, MembershipWithOrganization, OrgRole, Organization, OrganizationId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by organization repository adapters.
    pub enum OrganizationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "organization repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "organization repository query failed: {message}",
        /// Another organization already uses the slug.
        DuplicateSlug { slug: String } =>
            "organization slug already exists: {slug}",
        /// The user already belongs to the organization.
        DuplicateMembership =>
            "membership already exists",
    }
}

/// Storage for organizations and their memberships.
///
/// Deleting an organization removes everything scoped to it (memberships,
/// invites, notes, campaigns) in the same operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Insert `organization` and the owner's membership atomically.
    ///
    /// # Errors
    /// [`OrganizationRepositoryError::DuplicateSlug`] when the slug is taken;
    /// nothing is written in that case.
    async fn create_with_owner(
        &self,
        organization: &Organization,
        owner: &Membership,
    ) -> Result<(), OrganizationRepositoryError>;

    /// Fetch an organization by id.
    async fn find_by_id(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError>;

    /// Persist name, slug, and `updated_at`. Returns `false` if the row is gone.
    async fn update(&self, organization: &Organization) -> Result<bool, OrganizationRepositoryError>;

    /// Delete an organization and cascade. Returns `false` if it did not exist.
    async fn delete(&self, id: &OrganizationId) -> Result<bool, OrganizationRepositoryError>;

    /// Membership of `user_id` in `org_id`, if any.
    async fn find_membership(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, OrganizationRepositoryError>;

    /// All memberships of a user, most recently joined first.
    async fn list_memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipWithOrganization>, OrganizationRepositoryError>;

    /// Members of an organization, earliest joiner first.
    async fn list_members(
        &self,
        org_id: &OrganizationId,
    ) -> Result<Vec<Membership>, OrganizationRepositoryError>;

    /// Number of members in an organization.
    async fn count_members(&self, org_id: &OrganizationId) -> Result<u64, OrganizationRepositoryError>;

    /// Set a member's role. Returns `false` if the membership does not exist.
    async fn update_member_role(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
        role: OrgRole,
    ) -> Result<bool, OrganizationRepositoryError>;

    /// Remove a membership. Returns `false` if it did not exist.
    async fn remove_member(
        &self,
        org_id: &OrganizationId,
        user_id: &UserId,
    ) -> Result<bool, OrganizationRepositoryError>;

    /// Remove every membership of `user_id`. Returns how many were removed.
    async fn remove_all_memberships(&self, user_id: &UserId) -> Result<u64, OrganizationRepositoryError>;
}
