//! Domain primitives, rules, and services.
//!
//! Purpose: hold the business model of the back office (organizations,
//! memberships, invites, notes, campaigns) independent of HTTP and storage.
//! Inbound adapters call services through [`ports`]; outbound adapters
//! implement the driven ports.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: the only error type crossing driving ports.
//! - Entities and validated inputs for each aggregate.
//! - [`Authorizer`]: organization-scoped permission checks.
//! - Services implementing the driving ports.

pub mod authorization;
pub mod ports;

mod account;
mod account_service;
mod auth;
mod campaign_service;
mod campaigns;
mod directory;
mod error;
mod ids;
mod invite;
mod invite_service;
mod login;
mod note_service;
mod notes;
mod organization;
mod organization_service;
mod role;
mod slug;
mod trace_id;
mod user;

pub use self::account::{PasswordChange, PasswordChangeError, ProfileUpdate, UserUpdate};
pub use self::account_service::AccountService;
pub use self::auth::{
    AuthValidationError, LoginCredentials, NAME_MAX, NAME_MIN, PASSWORD_MIN, SignUpDetails,
};
pub use self::authorization::Authorizer;
pub use self::campaign_service::CampaignService;
pub use self::campaigns::{
    AnswerRejection, CAMPAIGN_DESCRIPTION_MAX, CAMPAIGN_NAME_MAX, Campaign, CampaignDetail,
    CampaignDraft, CampaignField, CampaignPatch, CampaignStatus, CampaignSummary,
    CampaignValidationError, FIELD_NAME_MAX, FieldDraft, FieldPatch, FieldType,
    InvalidFieldOrder, InvalidTransition, PublicCampaign, Submission, SubmissionAnswer,
    SubmissionError, SubmissionValue, UnknownCampaignValue, is_new_submission,
    prepare_submission, validate_field_order,
};
pub use self::directory::UserDirectory;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    CampaignId, CommentId, FieldId, InviteId, NoteId, OrganizationId, SubmissionId, UserId,
};
pub use self::invite::{INVITE_TTL_DAYS, Invite, InviteRole, InviteToken, InviteView};
pub use self::invite_service::{InviteService, InviteServiceConfig};
pub use self::login::IdentityLoginService;
pub use self::note_service::NoteService;
pub use self::notes::{
    Comment, CommentBody, CommentNode, CommentView, MAX_THREAD_DEPTH, NOTE_TITLE_MAX, Note,
    NoteDetail, NoteDraft, NoteStatus, NoteSummary, NoteValidationError, UnknownNoteStatus,
    build_comment_tree,
};
pub use self::organization::{
    MemberView, Membership, MembershipWithOrganization, ORG_NAME_MAX, ORG_NAME_MIN,
    Organization, OrganizationName, OrganizationOverview, OrganizationValidationError,
};
pub use self::organization_service::OrganizationService;
pub use self::role::{OrgRole, Permission, UnknownRole, can_modify};
pub use self::slug::{PUBLIC_SLUG_LEN, generate_public_slug, is_meaningful_slug, slugify};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EMAIL_MAX, Email, EmailValidationError, UserProfile};
