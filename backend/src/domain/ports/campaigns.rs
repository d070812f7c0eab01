//! Driving ports for campaigns, their fields, and public submissions.

use async_trait::async_trait;

use crate::domain::{
    Campaign, CampaignDetail, CampaignDraft, CampaignField, CampaignId, CampaignPatch,
    CampaignStatus, CampaignSummary, Error, FieldDraft, FieldId, FieldPatch, OrganizationId,
    PublicCampaign, Submission, SubmissionAnswer, SubmissionId, UserId,
};

/// Mutating campaign operations for members.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignsCommand: Send + Sync {
    /// Create a draft campaign (requires `create:content`).
    async fn create_campaign(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        draft: CampaignDraft,
    ) -> Result<Campaign, Error>;

    /// Update name and description (author, owner, or admin).
    async fn update_campaign(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        patch: CampaignPatch,
    ) -> Result<Campaign, Error>;

    /// Move through the lifecycle (author, owner, or admin).
    ///
    /// # Errors
    /// `conflict` for transitions other than activate, close, reactivate.
    async fn change_campaign_status(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign, Error>;

    /// Delete a campaign in any status (author, owner, or admin).
    async fn delete_campaign(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<(), Error>;

    /// Open the campaign detail and mark it viewed.
    ///
    /// The returned counters reflect the state before this view.
    async fn open_campaign(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<CampaignDetail, Error>;

    /// Append a field (requires `create:content`).
    async fn add_field(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        draft: FieldDraft,
    ) -> Result<CampaignField, Error>;

    /// Update a field definition (requires `create:content`).
    async fn update_field(&self, caller: &UserId, field_id: &FieldId, patch: FieldPatch) -> Result<CampaignField, Error>;

    /// Delete a field (requires `create:content`).
    async fn delete_field(&self, caller: &UserId, field_id: &FieldId) -> Result<(), Error>;

    /// Reorder every field of a campaign (requires `create:content`).
    async fn reorder_fields(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        ordered: Vec<FieldId>,
    ) -> Result<Vec<CampaignField>, Error>;
}

/// Campaign reads for members.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignsQuery: Send + Sync {
    /// Campaigns of an organization with counters, newest first.
    async fn list_campaigns(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Vec<CampaignSummary>, Error>;

    /// New submissions across every campaign of an organization.
    async fn new_submission_total(&self, caller: &UserId, org_id: &OrganizationId) -> Result<u64, Error>;

    /// Submissions of a campaign, newest first.
    async fn list_submissions(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<Vec<Submission>, Error>;
}

/// Unauthenticated access to active campaigns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublicCampaigns: Send + Sync {
    /// Public form of an active campaign.
    ///
    /// # Errors
    /// `not_found` for unknown slugs and for draft or closed campaigns alike.
    async fn public_campaign(&self, slug: &str) -> Result<PublicCampaign, Error>;

    /// Record a submission against an active campaign.
    async fn submit(&self, slug: &str, answers: Vec<SubmissionAnswer>) -> Result<SubmissionId, Error>;
}
