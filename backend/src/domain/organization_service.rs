//! Organization and membership service.
//!
//! Implements [`OrganizationsCommand`] and [`OrganizationsQuery`]. Every
//! operation re-reads the caller's membership through [`Authorizer`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::authorization::map_organization_error;
use super::directory::label_for;
use super::ports::{
    IdentityProvider, OrganizationRepository, OrganizationsCommand, OrganizationsQuery,
};
use super::{
    Authorizer, Error, MemberView, Membership, MembershipWithOrganization, OrgRole, Organization,
    OrganizationId, OrganizationName, OrganizationOverview, Permission, UserDirectory, UserId,
};

/// Domain service for organizations and their members.
pub struct OrganizationService<O, I> {
    organizations: Arc<O>,
    authorizer: Authorizer<O>,
    directory: UserDirectory<I>,
    clock: Arc<dyn Clock>,
}

impl<O, I> OrganizationService<O, I>
where
    O: OrganizationRepository,
    I: IdentityProvider,
{
    /// Create the service.
    pub fn new(organizations: Arc<O>, identity: Arc<I>, clock: Arc<dyn Clock>) -> Self {
        Self {
            authorizer: Authorizer::new(Arc::clone(&organizations)),
            organizations,
            directory: UserDirectory::new(identity),
            clock,
        }
    }

    async fn load(&self, org_id: &OrganizationId) -> Result<Organization, Error> {
        self.organizations
            .find_by_id(org_id)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::not_found("organization not found"))
    }
}

fn owner_only() -> Error {
    Error::forbidden("only the organization owner can do this")
        .with_details(json!({ "code": "owner_required" }))
}

#[async_trait]
impl<O, I> OrganizationsCommand for OrganizationService<O, I>
where
    O: OrganizationRepository,
    I: IdentityProvider,
{
    async fn create_organization(
        &self,
        caller: &UserId,
        name: &OrganizationName,
    ) -> Result<Organization, Error> {
        let now = self.clock.utc();
        let organization = Organization::create(name, *caller, now);
        let owner = Membership {
            user_id: *caller,
            org_id: organization.id,
            role: OrgRole::Owner,
            joined_at: now,
        };
        self.organizations
            .create_with_owner(&organization, &owner)
            .await
            .map_err(map_organization_error)?;
        info!(org_id = %organization.id, slug = %organization.slug, owner = %caller, "organization created");
        Ok(organization)
    }

    async fn rename_organization(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        name: &OrganizationName,
    ) -> Result<Organization, Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::ManageOrg)
            .await?;
        let mut organization = self.load(org_id).await?;
        organization.rename(name, self.clock.utc());
        let updated = self
            .organizations
            .update(&organization)
            .await
            .map_err(map_organization_error)?;
        if !updated {
            return Err(Error::not_found("organization not found"));
        }
        Ok(organization)
    }

    async fn delete_organization(&self, caller: &UserId, org_id: &OrganizationId) -> Result<(), Error> {
        let membership = self.authorizer.require_member(caller, org_id).await?;
        if membership.role != OrgRole::Owner {
            return Err(owner_only());
        }
        let deleted = self
            .organizations
            .delete(org_id)
            .await
            .map_err(map_organization_error)?;
        if !deleted {
            return Err(Error::not_found("organization not found"));
        }
        info!(%org_id, by = %caller, "organization deleted");
        Ok(())
    }

    async fn switch_active(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Membership, Error> {
        self.authorizer.require_member(caller, org_id).await
    }

    async fn change_member_role(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        target: &UserId,
        role: OrgRole,
    ) -> Result<Membership, Error> {
        let membership = self.authorizer.require_member(caller, org_id).await?;
        if membership.role != OrgRole::Owner {
            return Err(owner_only());
        }
        if target == caller {
            return Err(Error::invalid_request("you cannot change your own role")
                .with_details(json!({ "field": "userId", "code": "self_target" })));
        }
        if role == OrgRole::Owner {
            return Err(Error::invalid_request("ownership cannot be assigned")
                .with_details(json!({ "field": "role", "code": "owner_role" })));
        }
        let mut member = self
            .organizations
            .find_membership(org_id, target)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::not_found("member not found"))?;
        let updated = self
            .organizations
            .update_member_role(org_id, target, role)
            .await
            .map_err(map_organization_error)?;
        if !updated {
            return Err(Error::not_found("member not found"));
        }
        info!(%org_id, user_id = %target, from = %member.role, to = %role, "member role changed");
        member.role = role;
        Ok(member)
    }

    async fn remove_member(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        target: &UserId,
    ) -> Result<(), Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::ManageOrg)
            .await?;
        let organization = self.load(org_id).await?;
        if organization.owner_id == *target {
            return Err(Error::forbidden("the organization owner cannot be removed")
                .with_details(json!({ "code": "owner_protected" })));
        }
        let removed = self
            .organizations
            .remove_member(org_id, target)
            .await
            .map_err(map_organization_error)?;
        if !removed {
            return Err(Error::not_found("member not found"));
        }
        info!(%org_id, user_id = %target, by = %caller, "member removed");
        Ok(())
    }
}

#[async_trait]
impl<O, I> OrganizationsQuery for OrganizationService<O, I>
where
    O: OrganizationRepository,
    I: IdentityProvider,
{
    async fn list_my_organizations(&self, caller: &UserId) -> Result<Vec<MembershipWithOrganization>, Error> {
        let mut memberships = self
            .organizations
            .list_memberships_for_user(caller)
            .await
            .map_err(map_organization_error)?;
        // Stable: ties keep the newest-first order from storage.
        memberships.sort_by_key(|entry| entry.membership.role.rank());
        Ok(memberships)
    }

    async fn get_organization(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
    ) -> Result<OrganizationOverview, Error> {
        let membership = self.authorizer.require_member(caller, org_id).await?;
        let organization = self.load(org_id).await?;
        let member_count = self
            .organizations
            .count_members(org_id)
            .await
            .map_err(map_organization_error)?;
        Ok(OrganizationOverview {
            organization,
            role: membership.role,
            member_count,
        })
    }

    async fn list_members(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Vec<MemberView>, Error> {
        self.authorizer.require_member(caller, org_id).await?;
        let members = self
            .organizations
            .list_members(org_id)
            .await
            .map_err(map_organization_error)?;
        let ids: Vec<UserId> = members.iter().map(|member| member.user_id).collect();
        let profiles = self.directory.profiles(&ids).await;
        Ok(members
            .into_iter()
            .map(|membership| {
                let email = profiles
                    .get(&membership.user_id)
                    .map(|profile| profile.email.as_ref().to_owned())
                    .unwrap_or_default();
                MemberView {
                    name: label_for(&profiles, &membership.user_id),
                    email,
                    membership,
                }
            })
            .collect())
    }

    async fn resolve_active(
        &self,
        caller: &UserId,
        pointer: Option<OrganizationId>,
    ) -> Result<Option<MembershipWithOrganization>, Error> {
        self.authorizer.resolve_active(caller, pointer).await
    }
}

#[cfg(test)]
#[path = "organization_service_tests.rs"]
mod tests;
