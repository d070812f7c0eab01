//! Campaigns: member-defined forms collecting public submissions.
//!
//! This module owns the pure rules: the status state machine, field
//! validation, per-type answer checks, and the "new submission" badge.
//! Services combine them with storage.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::looks_like_email;
use super::{CampaignId, FieldId, OrganizationId, SubmissionId, UserId};

/// Maximum campaign name length.
pub const CAMPAIGN_NAME_MAX: usize = 200;
/// Maximum campaign description length.
pub const CAMPAIGN_DESCRIPTION_MAX: usize = 1000;
/// Maximum field label length.
pub const FIELD_NAME_MAX: usize = 100;
const PHONE_DIGITS_MIN: usize = 7;
const PHONE_DIGITS_MAX: usize = 15;

/// Lifecycle state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    /// Being set up; hidden from the public.
    Draft,
    /// Accepting public submissions.
    Active,
    /// No longer accepting submissions; may be reactivated.
    Closed,
}

impl CampaignStatus {
    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Allowed moves are activate (draft to active), close (active to
    /// closed), and reactivate (closed to active).
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft | Self::Closed, Self::Active) | (Self::Active, Self::Closed)
        )
    }

    /// Whether the public form is reachable.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Closed => "CLOSED",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = UnknownCampaignValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "ACTIVE" => Ok(Self::Active),
            "CLOSED" => Ok(Self::Closed),
            other => Err(UnknownCampaignValue(other.to_owned())),
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored status or field type string is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown campaign value: {0}")]
pub struct UnknownCampaignValue(pub String);

/// Input type of a campaign field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    Textarea,
    /// Finite decimal number.
    Number,
    /// Email address.
    Email,
    /// Phone number with common separators.
    Phone,
    /// Calendar date as `YYYY-MM-DD`.
    Date,
    /// Yes/no answer.
    Boolean,
    /// One of the configured options.
    Select,
    /// Absolute http(s) URL.
    Url,
}

impl FieldType {
    /// Every field type.
    pub const ALL: [Self; 9] = [
        Self::Text,
        Self::Textarea,
        Self::Number,
        Self::Email,
        Self::Phone,
        Self::Date,
        Self::Boolean,
        Self::Select,
        Self::Url,
    ];

    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Textarea => "TEXTAREA",
            Self::Number => "NUMBER",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Date => "DATE",
            Self::Boolean => "BOOLEAN",
            Self::Select => "SELECT",
            Self::Url => "URL",
        }
    }

    /// Check a non-blank answer against this type.
    ///
    /// `options` is only consulted for [`FieldType::Select`].
    pub fn check(self, value: &str, options: &[&str]) -> Result<(), AnswerRejection> {
        let trimmed = value.trim();
        let accepted = match self {
            Self::Text | Self::Textarea => true,
            Self::Number => trimmed.parse::<f64>().is_ok_and(f64::is_finite),
            Self::Email => looks_like_email(trimmed),
            Self::Phone => is_phone_number(trimmed),
            Self::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok(),
            Self::Boolean => matches!(
                trimmed.to_ascii_lowercase().as_str(),
                "true" | "false" | "yes" | "no" | "on" | "off" | "1" | "0"
            ),
            Self::Select => options.contains(&trimmed),
            Self::Url => url::Url::parse(trimmed)
                .is_ok_and(|url| matches!(url.scheme(), "http" | "https")),
        };
        if accepted {
            Ok(())
        } else {
            Err(AnswerRejection { expected: self })
        }
    }
}

fn is_phone_number(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '(' | ')' | '.' | ' '));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    allowed && (PHONE_DIGITS_MIN..=PHONE_DIGITS_MAX).contains(&digits)
}

impl FromStr for FieldType {
    type Err = UnknownCampaignValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCampaignValue(s.to_owned()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An answer did not match its field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRejection {
    /// Type the answer was checked against.
    pub expected: FieldType,
}

/// Validation failures for campaign and field payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CampaignValidationError {
    /// Campaign name blank.
    #[error("name is required")]
    EmptyName,
    /// Campaign name exceeded [`CAMPAIGN_NAME_MAX`].
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// Description exceeded [`CAMPAIGN_DESCRIPTION_MAX`].
    #[error("description must be at most {max} characters")]
    DescriptionTooLong { max: usize },
    /// Field label blank.
    #[error("field name is required")]
    EmptyFieldName,
    /// Field label exceeded [`FIELD_NAME_MAX`].
    #[error("field name must be at most {max} characters")]
    FieldNameTooLong { max: usize },
    /// SELECT field without any options.
    #[error("select fields need at least one option")]
    MissingOptions,
}

impl CampaignValidationError {
    /// Request field the failure refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyName
            | Self::NameTooLong { .. }
            | Self::EmptyFieldName
            | Self::FieldNameTooLong { .. } => "name",
            Self::DescriptionTooLong { .. } => "description",
            Self::MissingOptions => "options",
        }
    }
}

fn campaign_name(raw: &str) -> Result<String, CampaignValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CampaignValidationError::EmptyName);
    }
    if trimmed.chars().count() > CAMPAIGN_NAME_MAX {
        return Err(CampaignValidationError::NameTooLong {
            max: CAMPAIGN_NAME_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

fn campaign_description(raw: Option<&str>) -> Result<Option<String>, CampaignValidationError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > CAMPAIGN_DESCRIPTION_MAX {
        return Err(CampaignValidationError::DescriptionTooLong {
            max: CAMPAIGN_DESCRIPTION_MAX,
        });
    }
    Ok(Some(text.to_owned()))
}

fn field_name(raw: &str) -> Result<String, CampaignValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CampaignValidationError::EmptyFieldName);
    }
    if trimmed.chars().count() > FIELD_NAME_MAX {
        return Err(CampaignValidationError::FieldNameTooLong {
            max: FIELD_NAME_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

fn field_options(raw: Option<&str>) -> Option<String> {
    let cleaned = raw
        .map(|list| split_options(list).collect::<Vec<_>>().join(","))
        .unwrap_or_default();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn split_options(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|option| !option.is_empty())
}

/// Validated input for creating a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDraft {
    name: String,
    description: Option<String>,
}

impl CampaignDraft {
    /// Validate raw inputs. A blank description is treated as absent.
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, CampaignValidationError> {
        Ok(Self {
            name: campaign_name(name)?,
            description: campaign_description(description)?,
        })
    }
}

/// Validated partial update of a campaign's name and description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignPatch {
    name: Option<String>,
    description: Option<Option<String>>,
}

impl CampaignPatch {
    /// Validate supplied parts; `None` leaves the value unchanged.
    pub fn new(name: Option<&str>, description: Option<&str>) -> Result<Self, CampaignValidationError> {
        Ok(Self {
            name: name.map(campaign_name).transpose()?,
            description: description
                .map(|text| campaign_description(Some(text)))
                .transpose()?,
        })
    }
}

/// A campaign owned by an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    /// Identifier.
    pub id: CampaignId,
    /// Campaign name.
    pub name: String,
    /// Optional blurb shown above the form.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// Public form slug.
    pub slug: String,
    /// User who created it.
    pub author_id: UserId,
    /// Owning organization.
    pub org_id: OrganizationId,
    /// When a member last opened the submissions.
    pub last_viewed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Build a new draft campaign published under `slug`.
    #[must_use]
    pub fn create(
        draft: CampaignDraft,
        slug: String,
        author_id: UserId,
        org_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CampaignId::random(),
            name: draft.name,
            description: draft.description,
            status: CampaignStatus::Draft,
            slug,
            author_id,
            org_id,
            last_viewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a name/description patch.
    pub fn apply(&mut self, patch: CampaignPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        self.updated_at = now;
    }

    /// Move to `next`, enforcing the lifecycle.
    pub fn transition(&mut self, next: CampaignStatus, now: DateTime<Utc>) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Rejected lifecycle move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move campaign from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: CampaignStatus,
    /// Requested status.
    pub to: CampaignStatus,
}

/// Validated definition of a new field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDraft {
    name: String,
    field_type: FieldType,
    required: bool,
    options: Option<String>,
}

impl FieldDraft {
    /// Validate raw inputs. Options are normalised to a trimmed comma list.
    pub fn new(
        name: &str,
        field_type: FieldType,
        required: bool,
        options: Option<&str>,
    ) -> Result<Self, CampaignValidationError> {
        let options = field_options(options);
        if field_type == FieldType::Select && options.is_none() {
            return Err(CampaignValidationError::MissingOptions);
        }
        Ok(Self {
            name: field_name(name)?,
            field_type,
            required,
            options,
        })
    }
}

/// Partial update of a field definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPatch {
    /// New label.
    pub name: Option<String>,
    /// New input kind.
    pub field_type: Option<FieldType>,
    /// New required flag.
    pub required: Option<bool>,
    /// `Some(None)` clears the options.
    pub options: Option<Option<String>>,
}

/// A question on a campaign form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignField {
    /// Identifier.
    pub id: FieldId,
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Question label.
    pub name: String,
    /// Input kind.
    pub field_type: FieldType,
    /// Whether an answer is mandatory.
    pub required: bool,
    /// Comma-separated choices for `SELECT` fields.
    pub options: Option<String>,
    /// Zero-based position in the form.
    pub order: i32,
}

impl CampaignField {
    /// Build a field at position `order`.
    #[must_use]
    pub fn create(draft: FieldDraft, campaign_id: CampaignId, order: i32) -> Self {
        Self {
            id: FieldId::random(),
            campaign_id,
            name: draft.name,
            field_type: draft.field_type,
            required: draft.required,
            options: draft.options,
            order,
        }
    }

    /// Apply `patch`, validating the result as a whole.
    ///
    /// Existing answers are not revalidated when the type changes.
    pub fn apply(&mut self, patch: FieldPatch) -> Result<(), CampaignValidationError> {
        let name = patch.name.unwrap_or_else(|| self.name.clone());
        let field_type = patch.field_type.unwrap_or(self.field_type);
        let required = patch.required.unwrap_or(self.required);
        let options = patch.options.unwrap_or_else(|| self.options.clone());
        let draft = FieldDraft::new(&name, field_type, required, options.as_deref())?;
        self.name = draft.name;
        self.field_type = draft.field_type;
        self.required = draft.required;
        self.options = draft.options;
        Ok(())
    }

    /// Individual SELECT options.
    #[must_use]
    pub fn option_list(&self) -> Vec<&str> {
        self.options
            .as_deref()
            .map(|list| split_options(list).collect())
            .unwrap_or_default()
    }
}

/// Reorder request that is not a permutation of the campaign's fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field order must list each campaign field exactly once")]
pub struct InvalidFieldOrder;

/// Check that `requested` is a permutation of `fields`' ids.
pub fn validate_field_order(fields: &[CampaignField], requested: &[FieldId]) -> Result<(), InvalidFieldOrder> {
    let expected: HashSet<FieldId> = fields.iter().map(|field| field.id).collect();
    let mut seen = HashSet::with_capacity(requested.len());
    let all_known = requested
        .iter()
        .all(|id| expected.contains(id) && seen.insert(*id));
    if all_known && seen.len() == expected.len() {
        Ok(())
    } else {
        Err(InvalidFieldOrder)
    }
}

/// One answer in an incoming public submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAnswer {
    /// Field answered.
    pub field_id: FieldId,
    /// Answer text.
    pub value: String,
}

/// Stored answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionValue {
    /// Field answered.
    pub field_id: FieldId,
    /// Answer text.
    pub value: String,
}

/// A public response to a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Identifier.
    pub id: SubmissionId,
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// When the form was submitted.
    pub created_at: DateTime<Utc>,
    /// One answer per field.
    pub values: Vec<SubmissionValue>,
}

/// Reasons a public submission is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// A required field had no non-blank answer.
    #[error("Field \"{name}\" is required")]
    MissingRequired { field_id: FieldId, name: String },
    /// An answer referenced a field not on this campaign.
    #[error("unknown field: {field_id}")]
    UnknownField { field_id: FieldId },
    /// The same field was answered twice.
    #[error("field answered more than once: {field_id}")]
    DuplicateField { field_id: FieldId },
    /// An answer did not match its field type.
    #[error("Field \"{name}\" must be a valid {expected}")]
    InvalidValue {
        field_id: FieldId,
        name: String,
        expected: FieldType,
    },
}

/// Validate `answers` against `fields` and keep the non-blank ones.
///
/// `fields` must be in display order. Required fields are checked first and
/// the first missing one aborts the whole submission; type checks follow.
///
/// # Examples
/// ```
/// use orgdesk::domain::{
///     CampaignField, CampaignId, FieldDraft, FieldType, SubmissionAnswer, prepare_submission,
/// };
///
/// let campaign = CampaignId::random();
/// let email = CampaignField::create(
///     FieldDraft::new("Email", FieldType::Email, true, None).unwrap(),
///     campaign,
///     0,
/// );
/// let err = prepare_submission(&[email], vec![]).unwrap_err();
/// assert_eq!(err.to_string(), "Field \"Email\" is required");
/// ```
pub fn prepare_submission(
    fields: &[CampaignField],
    answers: Vec<SubmissionAnswer>,
) -> Result<Vec<SubmissionValue>, SubmissionError> {
    let known: HashSet<FieldId> = fields.iter().map(|field| field.id).collect();
    let mut answered = HashSet::with_capacity(answers.len());
    for answer in &answers {
        if !known.contains(&answer.field_id) {
            return Err(SubmissionError::UnknownField {
                field_id: answer.field_id,
            });
        }
        if !answered.insert(answer.field_id) {
            return Err(SubmissionError::DuplicateField {
                field_id: answer.field_id,
            });
        }
    }

    let filled = |field: &CampaignField| {
        answers
            .iter()
            .find(|answer| answer.field_id == field.id)
            .filter(|answer| !answer.value.trim().is_empty())
    };

    if let Some(missing) = fields
        .iter()
        .find(|field| field.required && filled(field).is_none())
    {
        return Err(SubmissionError::MissingRequired {
            field_id: missing.id,
            name: missing.name.clone(),
        });
    }

    for field in fields {
        if let Some(answer) = filled(field) {
            field
                .field_type
                .check(&answer.value, &field.option_list())
                .map_err(|rejection| SubmissionError::InvalidValue {
                    field_id: field.id,
                    name: field.name.clone(),
                    expected: rejection.expected,
                })?;
        }
    }

    Ok(fields
        .iter()
        .filter_map(|field| filled(field))
        .map(|answer| SubmissionValue {
            field_id: answer.field_id,
            value: answer.value.clone(),
        })
        .collect())
}

/// Whether a submission created at `created_at` counts as new.
///
/// Everything is new until the campaign has been viewed once.
#[must_use]
pub fn is_new_submission(created_at: DateTime<Utc>, last_viewed_at: Option<DateTime<Utc>>) -> bool {
    last_viewed_at.is_none_or(|viewed| created_at > viewed)
}

/// Campaign listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignSummary {
    /// The campaign.
    pub campaign: Campaign,
    /// Number of form fields.
    pub field_count: u64,
    /// All submissions.
    pub submission_count: u64,
    /// Submissions since the last view.
    pub new_submission_count: u64,
}

/// Campaign with its ordered fields and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDetail {
    /// The campaign.
    pub campaign: Campaign,
    /// Form fields in display order.
    pub fields: Vec<CampaignField>,
    /// All submissions.
    pub submission_count: u64,
    /// Submissions since the last view.
    pub new_submission_count: u64,
}

/// What the public sees of an active campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicCampaign {
    /// Campaign id.
    pub id: CampaignId,
    /// Campaign name.
    pub name: String,
    /// Optional blurb shown above the form.
    pub description: Option<String>,
    /// Public form slug.
    pub slug: String,
    /// Form fields in display order.
    pub fields: Vec<CampaignField>,
}
