//! Organizations and memberships.

use chrono::{DateTime, Utc};

use super::{OrgRole, OrganizationId, UserId, is_meaningful_slug, slugify};

/// Minimum organization name length.
pub const ORG_NAME_MIN: usize = 2;
/// Maximum organization name length.
pub const ORG_NAME_MAX: usize = 100;

/// Validation failures for [`OrganizationName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrganizationValidationError {
    /// Name shorter than [`ORG_NAME_MIN`] once trimmed.
    #[error("organization name must be at least {min} characters")]
    NameTooShort { min: usize },
    /// Name longer than [`ORG_NAME_MAX`].
    #[error("organization name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// Name contains no character that survives slug derivation.
    #[error("organization name must contain at least one letter or digit")]
    EmptySlug,
}

/// Validated organization name together with its derived slug.
///
/// # Examples
/// ```
/// use orgdesk::domain::OrganizationName;
///
/// let name = OrganizationName::new("Acme Corp").unwrap();
/// assert_eq!(name.slug(), "acme-corp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationName {
    name: String,
    slug: String,
}

impl OrganizationName {
    /// Trim and validate `raw`, deriving the slug.
    pub fn new(raw: &str) -> Result<Self, OrganizationValidationError> {
        let name = raw.trim();
        let length = name.chars().count();
        if length < ORG_NAME_MIN {
            return Err(OrganizationValidationError::NameTooShort { min: ORG_NAME_MIN });
        }
        if length > ORG_NAME_MAX {
            return Err(OrganizationValidationError::NameTooLong { max: ORG_NAME_MAX });
        }
        let slug = slugify(name);
        if !is_meaningful_slug(&slug) {
            return Err(OrganizationValidationError::EmptySlug);
        }
        Ok(Self {
            name: name.to_owned(),
            slug,
        })
    }

    /// Display name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Slug derived from the name.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// Tenant boundary grouping members and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// Identifier.
    pub id: OrganizationId,
    /// Organization name.
    pub name: String,
    /// URL-safe handle derived from the name.
    pub slug: String,
    /// User who created the organization.
    pub owner_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Build a new organization owned by `owner_id`.
    #[must_use]
    pub fn create(name: &OrganizationName, owner_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: OrganizationId::random(),
            name: name.as_str().to_owned(),
            slug: name.slug().to_owned(),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a rename, re-deriving the slug.
    pub fn rename(&mut self, name: &OrganizationName, now: DateTime<Utc>) {
        name.as_str().clone_into(&mut self.name);
        name.slug().clone_into(&mut self.slug);
        self.updated_at = now;
    }
}

/// A user's role inside one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Member.
    pub user_id: UserId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// Granted role.
    pub role: OrgRole,
    /// When the membership started.
    pub joined_at: DateTime<Utc>,
}

/// Membership joined with the organization it grants access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipWithOrganization {
    /// The membership.
    pub membership: Membership,
    /// The organization.
    pub organization: Organization,
}

/// Organization detail as shown to a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationOverview {
    /// The organization.
    pub organization: Organization,
    /// Caller's role.
    pub role: OrgRole,
    /// Number of members.
    pub member_count: u64,
}

/// Member listing row enriched with provider profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    /// The membership.
    pub membership: Membership,
    /// Display name from the identity provider; empty when unknown.
    pub name: String,
    /// Email from the identity provider; empty when unknown.
    pub email: String,
}
