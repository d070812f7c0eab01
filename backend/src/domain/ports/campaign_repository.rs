//! Port for campaign, field, and submission persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Campaign, CampaignField, CampaignId, FieldId, OrganizationId, Submission,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by campaign repository adapters.
    pub enum CampaignRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "campaign repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "campaign repository query failed: {message}",
        /// Public slug collided with an existing campaign.
        DuplicateSlug { slug: String } =>
            "campaign slug already exists: {slug}",
        /// Another writer moved the campaign's fields at the same time.
        FieldOrderConflict =>
            "campaign field order changed concurrently",
    }
}

/// Submission counters for one campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    /// All submissions.
    pub total: u64,
    /// Submissions newer than the last view (all if never viewed).
    pub new: u64,
}

/// Storage for campaigns and everything they own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Insert a campaign.
    async fn insert(&self, campaign: &Campaign) -> Result<(), CampaignRepositoryError>;

    /// Fetch a campaign by id.
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, CampaignRepositoryError>;

    /// Fetch a campaign by public slug, whatever its status.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Campaign>, CampaignRepositoryError>;

    /// Campaigns of an organization, newest first.
    async fn list_for_org(
        &self,
        org_id: &OrganizationId,
    ) -> Result<Vec<Campaign>, CampaignRepositoryError>;

    /// Persist name, description, status, and `updated_at`.
    async fn update(&self, campaign: &Campaign) -> Result<bool, CampaignRepositoryError>;

    /// Delete a campaign with its fields and submissions.
    async fn delete(&self, id: &CampaignId) -> Result<bool, CampaignRepositoryError>;

    /// Set `last_viewed_at`. Last writer wins.
    async fn mark_viewed(
        &self,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<bool, CampaignRepositoryError>;

    /// Fields of a campaign in display order.
    async fn list_fields(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<CampaignField>, CampaignRepositoryError>;

    /// Fetch a field by id.
    async fn find_field(&self, id: &FieldId) -> Result<Option<CampaignField>, CampaignRepositoryError>;

    /// Insert a field after the campaign's current last field.
    ///
    /// The position is assigned by the store, which serializes appends per
    /// campaign; `field.order` is ignored. Returns the assigned position.
    async fn append_field(&self, field: &CampaignField) -> Result<i32, CampaignRepositoryError>;

    /// Persist a field definition (not its order).
    async fn update_field(&self, field: &CampaignField) -> Result<bool, CampaignRepositoryError>;

    /// Delete a field and close the gap it leaves in the order.
    async fn delete_field(&self, id: &FieldId) -> Result<bool, CampaignRepositoryError>;

    /// Rewrite orders to `0..n` following `ordered` in one transaction.
    async fn reorder_fields(
        &self,
        campaign_id: &CampaignId,
        ordered: &[FieldId],
    ) -> Result<(), CampaignRepositoryError>;

    /// Insert a submission and its values in one transaction.
    async fn insert_submission(&self, submission: &Submission) -> Result<(), CampaignRepositoryError>;

    /// Submissions of a campaign with values, newest first.
    async fn list_submissions(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<Submission>, CampaignRepositoryError>;

    /// Submission counters relative to `last_viewed_at`.
    async fn submission_counts(
        &self,
        campaign_id: &CampaignId,
        last_viewed_at: Option<DateTime<Utc>>,
    ) -> Result<SubmissionCounts, CampaignRepositoryError>;
}
