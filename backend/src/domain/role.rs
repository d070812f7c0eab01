//! Organization roles and the permission table.
//!
//! Roles form a closed set and permissions are a pure function of the role,
//! so every check is a table lookup with no storage access.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Role held by a member inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgRole {
    /// Creator of the organization. Exactly one per organization.
    Owner,
    /// Can manage the organization and invite members.
    Admin,
    /// Can create content.
    Member,
    /// Read-only access.
    Viewer,
}

/// Capability checked before an organization-scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Rename the organization and remove members.
    ManageOrg,
    /// Create and cancel invites.
    InviteMembers,
    /// Create notes, comments, campaigns, and fields.
    CreateContent,
    /// Read anything in the organization.
    ViewContent,
}

impl Permission {
    /// Every permission, for exhaustive checks.
    pub const ALL: [Self; 4] = [
        Self::ManageOrg,
        Self::InviteMembers,
        Self::CreateContent,
        Self::ViewContent,
    ];

    /// Wire name used in error details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageOrg => "manage:org",
            Self::InviteMembers => "invite:members",
            Self::CreateContent => "create:content",
            Self::ViewContent => "view:content",
        }
    }
}

impl OrgRole {
    /// Every role, for exhaustive checks.
    pub const ALL: [Self; 4] = [Self::Owner, Self::Admin, Self::Member, Self::Viewer];

    /// Whether this role grants `permission`.
    ///
    /// # Examples
    /// ```
    /// use orgdesk::domain::{OrgRole, Permission};
    ///
    /// assert!(OrgRole::Member.has_permission(Permission::CreateContent));
    /// assert!(!OrgRole::Viewer.has_permission(Permission::CreateContent));
    /// ```
    #[must_use]
    pub const fn has_permission(self, permission: Permission) -> bool {
        match permission {
            Permission::ManageOrg | Permission::InviteMembers => {
                matches!(self, Self::Owner | Self::Admin)
            }
            Permission::CreateContent => matches!(self, Self::Owner | Self::Admin | Self::Member),
            Permission::ViewContent => true,
        }
    }

    /// Whether this role may edit content authored by someone else.
    #[must_use]
    pub const fn moderates_content(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Sort rank: owners first, viewers last.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Owner => 0,
            Self::Admin => 1,
            Self::Member => 2,
            Self::Viewer => 3,
        }
    }

    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
            Self::Viewer => "VIEWER",
        }
    }
}

/// Raised when a stored or submitted role string is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for OrgRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `caller` may update or delete content written by `author`.
///
/// Authors always may, whatever their current role; otherwise only owners
/// and admins may.
///
/// # Examples
/// ```
/// use orgdesk::domain::{OrgRole, UserId, can_modify};
///
/// let author = UserId::random();
/// assert!(can_modify(&author, &author, OrgRole::Viewer));
/// assert!(!can_modify(&author, &UserId::random(), OrgRole::Member));
/// ```
#[must_use]
pub fn can_modify(author: &UserId, caller: &UserId, caller_role: OrgRole) -> bool {
    author == caller || caller_role.moderates_content()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OrgRole::Owner, [true, true, true, true])]
    #[case(OrgRole::Admin, [true, true, true, true])]
    #[case(OrgRole::Member, [false, false, true, true])]
    #[case(OrgRole::Viewer, [false, false, false, true])]
    fn permission_table(#[case] role: OrgRole, #[case] expected: [bool; 4]) {
        for (permission, allowed) in Permission::ALL.into_iter().zip(expected) {
            assert_eq!(
                role.has_permission(permission),
                allowed,
                "{role} / {}",
                permission.as_str()
            );
        }
    }

    #[rstest]
    #[case(true, OrgRole::Viewer, true)]
    #[case(false, OrgRole::Member, false)]
    #[case(false, OrgRole::Viewer, false)]
    #[case(false, OrgRole::Admin, true)]
    #[case(false, OrgRole::Owner, true)]
    fn can_modify_cases(#[case] is_author: bool, #[case] role: OrgRole, #[case] expected: bool) {
        let author = UserId::random();
        let caller = if is_author { author } else { UserId::random() };
        assert_eq!(can_modify(&author, &caller, role), expected);
    }

    #[rstest]
    fn roles_round_trip_through_strings() {
        for role in OrgRole::ALL {
            assert_eq!(role.as_str().parse::<OrgRole>(), Ok(role));
        }
        assert!("owner".parse::<OrgRole>().is_err());
    }
}
