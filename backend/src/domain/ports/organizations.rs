//! Driving ports for organization and membership use-cases.

use async_trait::async_trait;

use crate::domain::{
    Error, MemberView, Membership, MembershipWithOrganization, OrgRole, Organization,
    OrganizationId, OrganizationName, OrganizationOverview, UserId,
};

/// Mutating organization operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationsCommand: Send + Sync {
    /// Create an organization with `caller` as its owner.
    ///
    /// # Errors
    /// `conflict` when another organization already has the derived slug.
    async fn create_organization(
        &self,
        caller: &UserId,
        name: &OrganizationName,
    ) -> Result<Organization, Error>;

    /// Rename an organization (owner or admin).
    async fn rename_organization(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        name: &OrganizationName,
    ) -> Result<Organization, Error>;

    /// Delete an organization and everything in it (owner only).
    async fn delete_organization(&self, caller: &UserId, org_id: &OrganizationId) -> Result<(), Error>;

    /// Confirm `caller` may make `org_id` their active organization.
    async fn switch_active(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Membership, Error>;

    /// Change another member's role (owner only, never to owner).
    async fn change_member_role(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        target: &UserId,
        role: OrgRole,
    ) -> Result<Membership, Error>;

    /// Remove a member (owner or admin; the owner cannot be removed).
    async fn remove_member(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        target: &UserId,
    ) -> Result<(), Error>;
}

/// Read-only organization operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationsQuery: Send + Sync {
    /// Organizations `caller` belongs to, highest role first; within a role,
    /// most recently joined first.
    async fn list_my_organizations(&self, caller: &UserId) -> Result<Vec<MembershipWithOrganization>, Error>;

    /// Organization detail with the caller's role and member count.
    async fn get_organization(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
    ) -> Result<OrganizationOverview, Error>;

    /// Members with provider profile data, earliest joiner first.
    async fn list_members(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Vec<MemberView>, Error>;

    /// Resolve the active organization from the session pointer.
    ///
    /// Falls back to the most recently joined membership when the pointer is
    /// absent or stale; `None` when the caller has no memberships.
    async fn resolve_active(
        &self,
        caller: &UserId,
        pointer: Option<OrganizationId>,
    ) -> Result<Option<MembershipWithOrganization>, Error>;
}
