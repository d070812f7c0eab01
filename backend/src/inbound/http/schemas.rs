//! JSON response bodies.
//!
//! Domain entities stay free of serde and utoipa derives; handlers convert
//! them into these camelCase wire types at the edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Campaign, CampaignDetail, CampaignField, CampaignStatus, CampaignSummary, Comment,
    CommentNode, FieldType, InviteRole, InviteView, MemberView, Membership,
    MembershipWithOrganization, Note, NoteDetail, NoteStatus, NoteSummary, OrgRole,
    Organization, OrganizationOverview, PublicCampaign, Submission, UserProfile,
};

/// Signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User id.
    pub id: Uuid,
    /// Login email.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Display name, falling back to the email address.
    pub name: String,
}

impl From<UserProfile> for UserResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.into(),
            name: profile.label().to_owned(),
            email: profile.email.into(),
        }
    }
}

/// Organization as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    /// Identifier.
    pub id: Uuid,
    /// Display name.
    #[schema(example = "Acme Corp")]
    pub name: String,
    /// URL-safe handle derived from the name.
    #[schema(example = "acme-corp")]
    pub slug: String,
    /// User who created the organization.
    pub owner_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Organization> for OrganizationResponse {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id.into(),
            name: org.name,
            slug: org.slug,
            owner_id: org.owner_id.into(),
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

/// Organization as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyOrganizationResponse {
    /// The organization.
    pub organization: OrganizationResponse,
    /// Caller's role.
    pub role: OrgRole,
    /// When the caller joined.
    pub joined_at: DateTime<Utc>,
}

impl From<MembershipWithOrganization> for MyOrganizationResponse {
    fn from(entry: MembershipWithOrganization) -> Self {
        Self {
            organization: entry.organization.into(),
            role: entry.membership.role,
            joined_at: entry.membership.joined_at,
        }
    }
}

/// Organization with member count and caller role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetailResponse {
    /// The organization.
    pub organization: OrganizationResponse,
    /// Role of the caller.
    pub role: OrgRole,
    /// Number of members.
    pub member_count: u64,
}

impl From<OrganizationOverview> for OrganizationDetailResponse {
    fn from(overview: OrganizationOverview) -> Self {
        Self {
            organization: overview.organization.into(),
            role: overview.role,
            member_count: overview.member_count,
        }
    }
}

/// Membership granted by creating or joining an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    /// Member.
    pub user_id: Uuid,
    /// Owning organization.
    pub org_id: Uuid,
    /// Role inside the organization.
    pub role: OrgRole,
    /// When the membership started.
    pub joined_at: DateTime<Utc>,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        Self {
            user_id: membership.user_id.into(),
            org_id: membership.org_id.into(),
            role: membership.role,
            joined_at: membership.joined_at,
        }
    }
}

/// Member row; name and email are empty when the provider has no record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    /// Member user id.
    pub user_id: Uuid,
    /// Display name; empty when unknown.
    pub name: String,
    /// Email; empty when unknown.
    pub email: String,
    /// Role inside the organization.
    pub role: OrgRole,
    /// When the membership started.
    pub joined_at: DateTime<Utc>,
}

impl From<MemberView> for MemberResponse {
    fn from(view: MemberView) -> Self {
        Self {
            user_id: view.membership.user_id.into(),
            name: view.name,
            email: view.email,
            role: view.membership.role,
            joined_at: view.membership.joined_at,
        }
    }
}

/// Pending invite. The token only travels in the invite email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    /// Identifier.
    pub id: Uuid,
    /// Invited address.
    pub email: String,
    /// Role granted on acceptance.
    pub role: InviteRole,
    /// Organization being joined.
    pub org_id: Uuid,
    /// Member who sent the invite.
    pub inviter_id: Uuid,
    /// Inviter display name; empty when unknown.
    pub inviter_name: String,
    /// Acceptance deadline.
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<InviteView> for InviteResponse {
    fn from(view: InviteView) -> Self {
        let invite = view.invite;
        Self {
            id: invite.id.into(),
            email: invite.email.into(),
            role: invite.role,
            org_id: invite.org_id.into(),
            inviter_id: invite.inviter_id.into(),
            inviter_name: view.inviter_name,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}

/// Note as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// Identifier.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Lifecycle status.
    pub status: NoteStatus,
    /// User who created it.
    pub author_id: Uuid,
    /// Owning organization.
    pub org_id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.into(),
            title: note.title,
            content: note.content,
            status: note.status,
            author_id: note.author_id.into(),
            org_id: note.org_id.into(),
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Note listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummaryResponse {
    /// The note.
    #[serde(flatten)]
    pub note: NoteResponse,
    /// Author display name; empty when unknown.
    pub author_name: String,
    /// Number of comments.
    pub comment_count: u64,
}

impl From<NoteSummary> for NoteSummaryResponse {
    fn from(summary: NoteSummary) -> Self {
        Self {
            note: summary.note.into(),
            author_name: summary.author_name,
            comment_count: summary.comment_count,
        }
    }
}

/// Comment as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    /// Identifier.
    pub id: Uuid,
    /// Body text.
    pub content: String,
    /// User who created it.
    pub author_id: Uuid,
    /// Note commented on.
    pub note_id: Uuid,
    /// Comment replied to, if any.
    pub parent_id: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.into(),
            content: comment.content,
            author_id: comment.author_id.into(),
            note_id: comment.note_id.into(),
            parent_id: comment.parent_id.map(Into::into),
            created_at: comment.created_at,
        }
    }
}

/// Comment with its replies, oldest first at every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadResponse {
    /// The comment.
    #[serde(flatten)]
    pub comment: CommentResponse,
    /// Author display name; empty when unknown.
    pub author_name: String,
    /// Direct replies, oldest first.
    #[schema(no_recursion)]
    pub replies: Vec<CommentThreadResponse>,
}

impl From<CommentNode> for CommentThreadResponse {
    fn from(node: CommentNode) -> Self {
        Self {
            comment: node.view.comment.into(),
            author_name: node.view.author_name,
            replies: node.replies.into_iter().map(Into::into).collect(),
        }
    }
}

/// Note with its comment threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetailResponse {
    /// The note.
    #[serde(flatten)]
    pub note: NoteResponse,
    /// Author display name; empty when unknown.
    pub author_name: String,
    /// Top-level threads, oldest first.
    pub comments: Vec<CommentThreadResponse>,
}

impl From<NoteDetail> for NoteDetailResponse {
    fn from(detail: NoteDetail) -> Self {
        Self {
            note: detail.note.into(),
            author_name: detail.author_name,
            comments: detail.comments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Campaign as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    /// Identifier.
    pub id: Uuid,
    /// Campaign name.
    pub name: String,
    /// Optional blurb shown above the form.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Public form slug.
    pub slug: String,
    /// User who created it.
    pub author_id: Uuid,
    /// Owning organization.
    pub org_id: Uuid,
    /// When a member last opened the submissions.
    pub last_viewed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(campaign: Campaign) -> Self {
        Self {
            id: campaign.id.into(),
            name: campaign.name,
            description: campaign.description,
            status: campaign.status,
            slug: campaign.slug,
            author_id: campaign.author_id.into(),
            org_id: campaign.org_id.into(),
            last_viewed_at: campaign.last_viewed_at,
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}

/// Form field as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldResponse {
    /// Identifier.
    pub id: Uuid,
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// Question label.
    pub name: String,
    /// Input kind.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether an answer is mandatory.
    pub required: bool,
    /// Comma-separated choices for SELECT fields.
    pub options: Option<String>,
    /// Zero-based position in the form.
    pub order: i32,
}

impl From<CampaignField> for FieldResponse {
    fn from(field: CampaignField) -> Self {
        Self {
            id: field.id.into(),
            campaign_id: field.campaign_id.into(),
            name: field.name,
            field_type: field.field_type,
            required: field.required,
            options: field.options,
            order: field.order,
        }
    }
}

/// Campaign listing row with counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummaryResponse {
    /// The campaign.
    #[serde(flatten)]
    pub campaign: CampaignResponse,
    /// Number of form fields.
    pub field_count: u64,
    /// All submissions.
    pub submission_count: u64,
    /// Submissions since the last view.
    pub new_submission_count: u64,
}

impl From<CampaignSummary> for CampaignSummaryResponse {
    fn from(summary: CampaignSummary) -> Self {
        Self {
            campaign: summary.campaign.into(),
            field_count: summary.field_count,
            submission_count: summary.submission_count,
            new_submission_count: summary.new_submission_count,
        }
    }
}

/// Campaign with fields and submission count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetailResponse {
    /// The campaign.
    #[serde(flatten)]
    pub campaign: CampaignResponse,
    /// Form fields in display order.
    pub fields: Vec<FieldResponse>,
    /// All submissions.
    pub submission_count: u64,
    /// Submissions that arrived before this view and after the previous one.
    pub new_submission_count: u64,
}

impl From<CampaignDetail> for CampaignDetailResponse {
    fn from(detail: CampaignDetail) -> Self {
        Self {
            campaign: detail.campaign.into(),
            fields: detail.fields.into_iter().map(Into::into).collect(),
            submission_count: detail.submission_count,
            new_submission_count: detail.new_submission_count,
        }
    }
}

/// Unseen submissions across an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmissionTotalResponse {
    /// Submissions newer than each campaign's last view.
    pub new_submissions: u64,
}

/// One stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionValueResponse {
    /// Field answered.
    pub field_id: Uuid,
    /// Answer text.
    pub value: String,
}

/// Submission with its answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// Identifier.
    pub id: Uuid,
    /// Owning campaign.
    pub campaign_id: Uuid,
    /// When the form was submitted.
    pub created_at: DateTime<Utc>,
    /// One answer per field.
    pub values: Vec<SubmissionValueResponse>,
}

impl From<Submission> for SubmissionResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id.into(),
            campaign_id: submission.campaign_id.into(),
            created_at: submission.created_at,
            values: submission
                .values
                .into_iter()
                .map(|value| SubmissionValueResponse {
                    field_id: value.field_id.into(),
                    value: value.value,
                })
                .collect(),
        }
    }
}

/// Public form of an active campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicCampaignResponse {
    /// Campaign id.
    pub id: Uuid,
    /// Campaign name.
    pub name: String,
    /// Optional blurb shown above the form.
    pub description: Option<String>,
    /// Public form slug.
    pub slug: String,
    /// Form fields in display order.
    pub fields: Vec<FieldResponse>,
}

impl From<PublicCampaign> for PublicCampaignResponse {
    fn from(campaign: PublicCampaign) -> Self {
        Self {
            id: campaign.id.into(),
            name: campaign.name,
            description: campaign.description,
            slug: campaign.slug,
            fields: campaign.fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Acknowledgement of a public submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Stored submission id.
    pub id: Uuid,
}

/// Acknowledgement body for mutations without a resource to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    #[schema(example = "Member removed")]
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
