//! Organization-scoped authorization.
//!
//! Every service funnels access checks through [`Authorizer`], which re-reads
//! the caller's membership on each call. Non-members get `not_found` so that
//! organization ids cannot be discovered; members lacking a permission get
//! `forbidden`.

use std::sync::Arc;

use serde_json::json;

use super::ports::{OrganizationRepository, OrganizationRepositoryError};
use super::{
    Error, Membership, MembershipWithOrganization, OrgRole, OrganizationId, Permission, UserId,
    can_modify,
};

/// Map organization repository failures onto domain errors.
pub(crate) fn map_organization_error(error: OrganizationRepositoryError) -> Error {
    match error {
        OrganizationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("organization repository unavailable: {message}"))
        }
        OrganizationRepositoryError::Query { message } => {
            Error::internal(format!("organization repository error: {message}"))
        }
        OrganizationRepositoryError::DuplicateSlug { slug } => {
            Error::conflict("an organization with this name already exists").with_details(json!({
                "field": "name",
                "slug": slug,
                "code": "duplicate_slug",
            }))
        }
        OrganizationRepositoryError::DuplicateMembership => {
            Error::conflict("user is already a member").with_details(json!({
                "code": "already_member",
            }))
        }
    }
}

/// Resolves roles and enforces permissions.
pub struct Authorizer<O> {
    organizations: Arc<O>,
}

impl<O> Clone for Authorizer<O> {
    fn clone(&self) -> Self {
        Self {
            organizations: Arc::clone(&self.organizations),
        }
    }
}

impl<O> Authorizer<O>
where
    O: OrganizationRepository,
{
    /// Build an authorizer reading memberships from `organizations`.
    pub fn new(organizations: Arc<O>) -> Self {
        Self { organizations }
    }

    /// Role of `user_id` in `org_id`, if they are a member.
    pub async fn resolve_role(&self, user_id: &UserId, org_id: &OrganizationId) -> Result<Option<OrgRole>, Error> {
        Ok(self
            .organizations
            .find_membership(org_id, user_id)
            .await
            .map_err(map_organization_error)?
            .map(|membership| membership.role))
    }

    /// Membership of `user_id` in `org_id`, or `not_found`.
    pub async fn require_member(&self, user_id: &UserId, org_id: &OrganizationId) -> Result<Membership, Error> {
        self.organizations
            .find_membership(org_id, user_id)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::not_found("organization not found"))
    }

    /// Membership of `user_id` in `org_id` holding `permission`.
    ///
    /// # Errors
    /// `not_found` for non-members, `forbidden` when the role lacks the
    /// permission.
    pub async fn require_permission(
        &self,
        user_id: &UserId,
        org_id: &OrganizationId,
        permission: Permission,
    ) -> Result<Membership, Error> {
        let membership = self.require_member(user_id, org_id).await?;
        if membership.role.has_permission(permission) {
            Ok(membership)
        } else {
            Err(permission_denied(permission))
        }
    }

    /// Membership of `user_id` allowing edits to content by `author_id`.
    pub async fn require_can_modify(
        &self,
        user_id: &UserId,
        org_id: &OrganizationId,
        author_id: &UserId,
    ) -> Result<Membership, Error> {
        let membership = self.require_member(user_id, org_id).await?;
        if can_modify(author_id, user_id, membership.role) {
            Ok(membership)
        } else {
            Err(Error::forbidden("only the author or an admin can change this").with_details(
                json!({ "code": "not_author" }),
            ))
        }
    }

    /// Resolve the active organization.
    ///
    /// Uses `pointer` when the caller is still a member of it, otherwise the
    /// most recently joined membership, otherwise `None`.
    pub async fn resolve_active(
        &self,
        user_id: &UserId,
        pointer: Option<OrganizationId>,
    ) -> Result<Option<MembershipWithOrganization>, Error> {
        let memberships = self
            .organizations
            .list_memberships_for_user(user_id)
            .await
            .map_err(map_organization_error)?;
        let pointed = pointer.and_then(|org_id| {
            memberships
                .iter()
                .position(|entry| entry.organization.id == org_id)
        });
        let chosen = pointed.unwrap_or(0);
        Ok(memberships.into_iter().nth(chosen))
    }
}

fn permission_denied(permission: Permission) -> Error {
    Error::forbidden("your role does not allow this action").with_details(json!({
        "permission": permission.as_str(),
        "code": "missing_permission",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockOrganizationRepository;
    use crate::domain::{ErrorCode, Organization, OrganizationName};
    use chrono::{Duration, Utc};
    use rstest::rstest;

    fn membership(org_id: OrganizationId, user_id: UserId, role: OrgRole) -> Membership {
        Membership {
            user_id,
            org_id,
            role,
            joined_at: Utc::now(),
        }
    }

    fn authorizer_with(found: Option<Membership>) -> Authorizer<MockOrganizationRepository> {
        let mut repo = MockOrganizationRepository::new();
        repo.expect_find_membership()
            .returning(move |_, _| Ok(found.clone()));
        Authorizer::new(Arc::new(repo))
    }

    #[rstest]
    #[tokio::test]
    async fn non_members_get_not_found() {
        let authorizer = authorizer_with(None);
        let err = authorizer
            .require_permission(&UserId::random(), &OrganizationId::random(), Permission::ViewContent)
            .await
            .expect_err("not a member");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(OrgRole::Viewer, Permission::CreateContent, false)]
    #[case(OrgRole::Member, Permission::CreateContent, true)]
    #[case(OrgRole::Member, Permission::InviteMembers, false)]
    #[case(OrgRole::Admin, Permission::ManageOrg, true)]
    #[tokio::test]
    async fn permission_follows_role(#[case] role: OrgRole, #[case] permission: Permission, #[case] allowed: bool) {
        let org_id = OrganizationId::random();
        let user_id = UserId::random();
        let authorizer = authorizer_with(Some(membership(org_id, user_id, role)));
        let result = authorizer.require_permission(&user_id, &org_id, permission).await;
        match (allowed, result) {
            (true, Ok(found)) => assert_eq!(found.role, role),
            (false, Err(err)) => assert_eq!(err.code(), ErrorCode::Forbidden),
            (_, other) => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn author_with_viewer_role_may_modify() {
        let org_id = OrganizationId::random();
        let user_id = UserId::random();
        let authorizer = authorizer_with(Some(membership(org_id, user_id, OrgRole::Viewer)));
        assert!(
            authorizer
                .require_can_modify(&user_id, &org_id, &user_id)
                .await
                .is_ok()
        );
        let err = authorizer
            .require_can_modify(&user_id, &org_id, &UserId::random())
            .await
            .expect_err("not author");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    fn joined(user_id: UserId, name: &str, minutes_ago: i64) -> MembershipWithOrganization {
        let now = Utc::now();
        let organization = Organization::create(
            &OrganizationName::new(name).expect("valid name"),
            user_id,
            now,
        );
        MembershipWithOrganization {
            membership: Membership {
                user_id,
                org_id: organization.id,
                role: OrgRole::Owner,
                joined_at: now - Duration::minutes(minutes_ago),
            },
            organization,
        }
    }

    fn resolver(entries: Vec<MembershipWithOrganization>) -> Authorizer<MockOrganizationRepository> {
        let mut repo = MockOrganizationRepository::new();
        repo.expect_list_memberships_for_user()
            .returning(move |_| Ok(entries.clone()));
        Authorizer::new(Arc::new(repo))
    }

    #[rstest]
    #[tokio::test]
    async fn active_pointer_wins_when_still_a_member() {
        let user_id = UserId::random();
        let newest = joined(user_id, "Newest", 1);
        let older = joined(user_id, "Older", 10);
        let target = older.organization.id;
        let active = resolver(vec![newest, older])
            .resolve_active(&user_id, Some(target))
            .await
            .expect("resolves");
        assert_eq!(active.map(|entry| entry.organization.id), Some(target));
    }

    #[rstest]
    #[tokio::test]
    async fn stale_pointer_falls_back_to_latest_membership() {
        let user_id = UserId::random();
        let newest = joined(user_id, "Newest", 1);
        let expected = newest.organization.id;
        let active = resolver(vec![newest, joined(user_id, "Older", 10)])
            .resolve_active(&user_id, Some(OrganizationId::random()))
            .await
            .expect("resolves");
        assert_eq!(active.map(|entry| entry.organization.id), Some(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn no_memberships_means_no_active_org() {
        let active = resolver(Vec::new())
            .resolve_active(&UserId::random(), None)
            .await
            .expect("resolves");
        assert!(active.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_are_service_unavailable() {
        let mut repo = MockOrganizationRepository::new();
        repo.expect_find_membership()
            .returning(|_, _| Err(OrganizationRepositoryError::connection("refused")));
        let err = Authorizer::new(Arc::new(repo))
            .require_member(&UserId::random(), &OrganizationId::random())
            .await
            .expect_err("connection failure");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
