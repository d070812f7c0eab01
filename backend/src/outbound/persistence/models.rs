//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Enum columns are stored as their
//! SCREAMING_SNAKE names and decoded on the way out.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Campaign, CampaignField, CampaignId, Comment, CommentId, Email, FieldId, Invite, InviteId,
    InviteToken, Membership, Note, NoteId, Organization, OrganizationId, UserId,
};

use super::schema::{
    campaign_fields, campaign_submission_values, campaign_submissions, campaigns, comments,
    invites, memberships, notes, organizations,
};

/// A stored value that no longer decodes into its domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("corrupt {column} value: {value}")]
pub(crate) struct RowDecodeError {
    column: &'static str,
    value: String,
}

impl RowDecodeError {
    fn new(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

fn decode<T: std::str::FromStr>(column: &'static str, raw: &str) -> Result<T, RowDecodeError> {
    raw.parse().map_err(|_| RowDecodeError::new(column, raw))
}

// ---------------------------------------------------------------------------
// Organizations and memberships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Organization> for OrganizationRow {
    fn from(value: &Organization) -> Self {
        Self {
            id: *value.id.as_uuid(),
            name: value.name.clone(),
            slug: value.slug.clone(),
            owner_id: *value.owner_id.as_uuid(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: OrganizationId::from_uuid(row.id),
            name: row.name,
            slug: row.slug,
            owner_id: UserId::from_uuid(row.owner_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MembershipRow {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl From<&Membership> for MembershipRow {
    fn from(value: &Membership) -> Self {
        Self {
            user_id: *value.user_id.as_uuid(),
            org_id: *value.org_id.as_uuid(),
            role: value.role.as_str().to_owned(),
            joined_at: value.joined_at,
        }
    }
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RowDecodeError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::from_uuid(row.user_id),
            org_id: OrganizationId::from_uuid(row.org_id),
            role: decode("memberships.role", &row.role)?,
            joined_at: row.joined_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = invites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InviteRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub token: String,
    pub org_id: Uuid,
    pub inviter_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Invite> for InviteRow {
    fn from(value: &Invite) -> Self {
        Self {
            id: *value.id.as_uuid(),
            email: value.email.as_ref().to_owned(),
            role: value.role.to_string(),
            token: value.token.as_str().to_owned(),
            org_id: *value.org_id.as_uuid(),
            inviter_id: *value.inviter_id.as_uuid(),
            expires_at: value.expires_at,
            created_at: value.created_at,
        }
    }
}

impl TryFrom<InviteRow> for Invite {
    type Error = RowDecodeError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        let email = Email::new(&row.email).map_err(|_| RowDecodeError::new("invites.email", &row.email))?;
        Ok(Self {
            id: InviteId::from_uuid(row.id),
            email,
            role: decode("invites.role", &row.role)?,
            token: InviteToken::from_raw(row.token),
            org_id: OrganizationId::from_uuid(row.org_id),
            inviter_id: UserId::from_uuid(row.inviter_id),
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Notes and comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NoteRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub author_id: Uuid,
    pub org_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable note columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = notes)]
pub(crate) struct NoteUpdate<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub status: &'a str,
    pub updated_at: DateTime<Utc>,
}

impl From<&Note> for NoteRow {
    fn from(value: &Note) -> Self {
        Self {
            id: *value.id.as_uuid(),
            title: value.title.clone(),
            content: value.content.clone(),
            status: value.status.as_str().to_owned(),
            author_id: *value.author_id.as_uuid(),
            org_id: *value.org_id.as_uuid(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl TryFrom<NoteRow> for Note {
    type Error = RowDecodeError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NoteId::from_uuid(row.id),
            title: row.title,
            content: row.content,
            status: decode("notes.status", &row.status)?,
            author_id: UserId::from_uuid(row.author_id),
            org_id: OrganizationId::from_uuid(row.org_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub note_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for CommentRow {
    fn from(value: &Comment) -> Self {
        Self {
            id: *value.id.as_uuid(),
            content: value.content.clone(),
            author_id: *value.author_id.as_uuid(),
            note_id: *value.note_id.as_uuid(),
            parent_id: value.parent_id.map(|parent| *parent.as_uuid()),
            created_at: value.created_at,
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: CommentId::from_uuid(row.id),
            content: row.content,
            author_id: UserId::from_uuid(row.author_id),
            note_id: NoteId::from_uuid(row.note_id),
            parent_id: row.parent_id.map(CommentId::from_uuid),
            created_at: row.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = campaigns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CampaignRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub slug: String,
    pub author_id: Uuid,
    pub org_id: Uuid,
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable campaign columns. `last_viewed_at` has its own write path.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = campaigns)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CampaignUpdate<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub status: &'a str,
    pub updated_at: DateTime<Utc>,
}

impl From<&Campaign> for CampaignRow {
    fn from(value: &Campaign) -> Self {
        Self {
            id: *value.id.as_uuid(),
            name: value.name.clone(),
            description: value.description.clone(),
            status: value.status.as_str().to_owned(),
            slug: value.slug.clone(),
            author_id: *value.author_id.as_uuid(),
            org_id: *value.org_id.as_uuid(),
            last_viewed_at: value.last_viewed_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = RowDecodeError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampaignId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            status: decode("campaigns.status", &row.status)?,
            slug: row.slug,
            author_id: UserId::from_uuid(row.author_id),
            org_id: OrganizationId::from_uuid(row.org_id),
            last_viewed_at: row.last_viewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = campaign_fields)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CampaignFieldRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub field_type: String,
    pub required: bool,
    pub options: Option<String>,
    pub position: i32,
}

/// Field definition columns; position changes go through reorder.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = campaign_fields)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CampaignFieldUpdate<'a> {
    pub name: &'a str,
    pub field_type: &'a str,
    pub required: bool,
    pub options: Option<&'a str>,
}

impl From<&CampaignField> for CampaignFieldRow {
    fn from(value: &CampaignField) -> Self {
        Self {
            id: *value.id.as_uuid(),
            campaign_id: *value.campaign_id.as_uuid(),
            name: value.name.clone(),
            field_type: value.field_type.as_str().to_owned(),
            required: value.required,
            options: value.options.clone(),
            position: value.order,
        }
    }
}

impl TryFrom<CampaignFieldRow> for CampaignField {
    type Error = RowDecodeError;

    fn try_from(row: CampaignFieldRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: FieldId::from_uuid(row.id),
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            name: row.name,
            field_type: decode("campaign_fields.field_type", &row.field_type)?,
            required: row.required,
            options: row.options,
            order: row.position,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = campaign_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubmissionRow {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = campaign_submission_values)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubmissionValueRow {
    pub submission_id: Uuid,
    pub field_id: Uuid,
    pub value: String,
}
