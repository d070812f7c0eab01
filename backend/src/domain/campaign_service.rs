//! Campaign service: member-side management and the public form.
//!
//! Member operations are organization-scoped through [`Authorizer`]. The
//! public side only ever sees active campaigns; draft and closed ones are
//! indistinguishable from unknown slugs.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use rand::rngs::OsRng;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{
    CampaignRepository, CampaignRepositoryError, CampaignsCommand, CampaignsQuery,
    OrganizationRepository, PublicCampaigns,
};
use super::{
    Authorizer, Campaign, CampaignDetail, CampaignDraft, CampaignField, CampaignId,
    CampaignPatch, CampaignStatus, CampaignSummary, CampaignValidationError, Error, FieldDraft,
    FieldId, FieldPatch, OrganizationId, Permission, PublicCampaign, Submission,
    SubmissionAnswer, SubmissionError, SubmissionId, UserId, generate_public_slug,
    prepare_submission, validate_field_order,
};

/// Attempts at drawing an unused public slug before giving up.
const SLUG_ATTEMPTS: usize = 5;

fn map_campaign_error(error: CampaignRepositoryError) -> Error {
    match error {
        CampaignRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("campaign repository unavailable: {message}"))
        }
        CampaignRepositoryError::Query { message } => {
            Error::internal(format!("campaign repository error: {message}"))
        }
        CampaignRepositoryError::DuplicateSlug { slug } => {
            Error::internal(format!("public slug collision: {slug}"))
        }
        CampaignRepositoryError::FieldOrderConflict => {
            Error::conflict("campaign fields were changed by someone else; reload and try again")
                .with_details(json!({ "code": "field_order_conflict" }))
        }
    }
}

fn invalid_field(error: &CampaignValidationError) -> Error {
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": error.field(), "code": "invalid_field" }))
}

fn rejected_submission(error: &SubmissionError) -> Error {
    let (field_id, code) = match error {
        SubmissionError::MissingRequired { field_id, .. } => (field_id, "missing_required"),
        SubmissionError::UnknownField { field_id } => (field_id, "unknown_field"),
        SubmissionError::DuplicateField { field_id } => (field_id, "duplicate_field"),
        SubmissionError::InvalidValue { field_id, .. } => (field_id, "invalid_value"),
    };
    Error::invalid_request(error.to_string())
        .with_details(json!({ "fieldId": field_id.to_string(), "code": code }))
}

fn campaign_missing() -> Error {
    Error::not_found("campaign not found")
}

fn count_of(len: usize) -> Result<u64, Error> {
    u64::try_from(len).map_err(|_| Error::internal("count exceeds supported range"))
}

/// Domain service for campaigns, fields, and submissions.
pub struct CampaignService<C, O> {
    campaigns: Arc<C>,
    authorizer: Authorizer<O>,
    clock: Arc<dyn Clock>,
}

impl<C, O> CampaignService<C, O>
where
    C: CampaignRepository,
    O: OrganizationRepository,
{
    /// Create the service.
    pub fn new(campaigns: Arc<C>, organizations: Arc<O>, clock: Arc<dyn Clock>) -> Self {
        Self {
            campaigns,
            authorizer: Authorizer::new(organizations),
            clock,
        }
    }

    async fn load(&self, campaign_id: &CampaignId) -> Result<Campaign, Error> {
        self.campaigns
            .find_by_id(campaign_id)
            .await
            .map_err(map_campaign_error)?
            .ok_or_else(campaign_missing)
    }

    async fn load_for_edit(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<Campaign, Error> {
        let campaign = self.load(campaign_id).await?;
        self.authorizer
            .require_can_modify(caller, &campaign.org_id, &campaign.author_id)
            .await?;
        Ok(campaign)
    }

    /// Load a campaign whose fields the caller may manage.
    async fn load_for_fields(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<Campaign, Error> {
        let campaign = self.load(campaign_id).await?;
        self.authorizer
            .require_permission(caller, &campaign.org_id, Permission::CreateContent)
            .await?;
        Ok(campaign)
    }

    async fn load_field(&self, field_id: &FieldId) -> Result<CampaignField, Error> {
        self.campaigns
            .find_field(field_id)
            .await
            .map_err(map_campaign_error)?
            .ok_or_else(|| Error::not_found("field not found"))
    }

    async fn fields_of(&self, campaign_id: &CampaignId) -> Result<Vec<CampaignField>, Error> {
        self.campaigns
            .list_fields(campaign_id)
            .await
            .map_err(map_campaign_error)
    }

    async fn persist(&self, campaign: &Campaign) -> Result<(), Error> {
        if self.campaigns.update(campaign).await.map_err(map_campaign_error)? {
            Ok(())
        } else {
            Err(campaign_missing())
        }
    }

    async fn load_public(&self, slug: &str) -> Result<Campaign, Error> {
        self.campaigns
            .find_by_slug(slug)
            .await
            .map_err(map_campaign_error)?
            .filter(|campaign| campaign.status.is_public())
            .ok_or_else(campaign_missing)
    }
}

#[async_trait]
impl<C, O> CampaignsCommand for CampaignService<C, O>
where
    C: CampaignRepository,
    O: OrganizationRepository,
{
    async fn create_campaign(
        &self,
        caller: &UserId,
        org_id: &OrganizationId,
        draft: CampaignDraft,
    ) -> Result<Campaign, Error> {
        self.authorizer
            .require_permission(caller, org_id, Permission::CreateContent)
            .await?;
        let mut campaign = Campaign::create(
            draft,
            generate_public_slug(&mut OsRng),
            *caller,
            *org_id,
            self.clock.utc(),
        );
        for attempt in 1..=SLUG_ATTEMPTS {
            match self.campaigns.insert(&campaign).await {
                Ok(()) => {
                    info!(campaign_id = %campaign.id, %org_id, "campaign created");
                    return Ok(campaign);
                }
                Err(CampaignRepositoryError::DuplicateSlug { slug }) => {
                    warn!(%slug, attempt, "public slug collision; drawing another");
                    campaign.slug = generate_public_slug(&mut OsRng);
                }
                Err(other) => return Err(map_campaign_error(other)),
            }
        }
        Err(Error::service_unavailable("could not allocate a public slug"))
    }

    async fn update_campaign(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        patch: CampaignPatch,
    ) -> Result<Campaign, Error> {
        let mut campaign = self.load_for_edit(caller, campaign_id).await?;
        campaign.apply(patch, self.clock.utc());
        self.persist(&campaign).await?;
        Ok(campaign)
    }

    async fn change_campaign_status(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        status: CampaignStatus,
    ) -> Result<Campaign, Error> {
        let mut campaign = self.load_for_edit(caller, campaign_id).await?;
        campaign
            .transition(status, self.clock.utc())
            .map_err(|rejected| {
                Error::conflict(rejected.to_string()).with_details(json!({
                    "from": rejected.from.as_str(),
                    "to": rejected.to.as_str(),
                    "code": "invalid_transition",
                }))
            })?;
        self.persist(&campaign).await?;
        info!(%campaign_id, %status, by = %caller, "campaign status changed");
        Ok(campaign)
    }

    async fn delete_campaign(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<(), Error> {
        self.load_for_edit(caller, campaign_id).await?;
        if !self
            .campaigns
            .delete(campaign_id)
            .await
            .map_err(map_campaign_error)?
        {
            return Err(campaign_missing());
        }
        info!(%campaign_id, by = %caller, "campaign deleted");
        Ok(())
    }

    async fn open_campaign(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<CampaignDetail, Error> {
        let mut campaign = self.load(campaign_id).await?;
        self.authorizer
            .require_member(caller, &campaign.org_id)
            .await?;
        let fields = self.fields_of(campaign_id).await?;
        let counts = self
            .campaigns
            .submission_counts(campaign_id, campaign.last_viewed_at)
            .await
            .map_err(map_campaign_error)?;
        let now = self.clock.utc();
        self.campaigns
            .mark_viewed(campaign_id, now)
            .await
            .map_err(map_campaign_error)?;
        campaign.last_viewed_at = Some(now);
        Ok(CampaignDetail {
            campaign,
            fields,
            submission_count: counts.total,
            new_submission_count: counts.new,
        })
    }

    async fn add_field(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        draft: FieldDraft,
    ) -> Result<CampaignField, Error> {
        let campaign = self.load_for_fields(caller, campaign_id).await?;
        let mut field = CampaignField::create(draft, campaign.id, 0);
        field.order = self
            .campaigns
            .append_field(&field)
            .await
            .map_err(map_campaign_error)?;
        Ok(field)
    }

    async fn update_field(&self, caller: &UserId, field_id: &FieldId, patch: FieldPatch) -> Result<CampaignField, Error> {
        let mut field = self.load_field(field_id).await?;
        self.load_for_fields(caller, &field.campaign_id).await?;
        field.apply(patch).map_err(|error| invalid_field(&error))?;
        if !self
            .campaigns
            .update_field(&field)
            .await
            .map_err(map_campaign_error)?
        {
            return Err(Error::not_found("field not found"));
        }
        Ok(field)
    }

    async fn delete_field(&self, caller: &UserId, field_id: &FieldId) -> Result<(), Error> {
        let field = self.load_field(field_id).await?;
        self.load_for_fields(caller, &field.campaign_id).await?;
        if !self
            .campaigns
            .delete_field(field_id)
            .await
            .map_err(map_campaign_error)?
        {
            return Err(Error::not_found("field not found"));
        }
        Ok(())
    }

    async fn reorder_fields(
        &self,
        caller: &UserId,
        campaign_id: &CampaignId,
        ordered: Vec<FieldId>,
    ) -> Result<Vec<CampaignField>, Error> {
        let campaign = self.load_for_fields(caller, campaign_id).await?;
        let fields = self.fields_of(&campaign.id).await?;
        validate_field_order(&fields, &ordered).map_err(|rejected| {
            Error::invalid_request(rejected.to_string())
                .with_details(json!({ "field": "fieldIds", "code": "invalid_order" }))
        })?;
        self.campaigns
            .reorder_fields(&campaign.id, &ordered)
            .await
            .map_err(map_campaign_error)?;
        self.fields_of(&campaign.id).await
    }
}

#[async_trait]
impl<C, O> CampaignsQuery for CampaignService<C, O>
where
    C: CampaignRepository,
    O: OrganizationRepository,
{
    async fn list_campaigns(&self, caller: &UserId, org_id: &OrganizationId) -> Result<Vec<CampaignSummary>, Error> {
        self.authorizer.require_member(caller, org_id).await?;
        let campaigns = self
            .campaigns
            .list_for_org(org_id)
            .await
            .map_err(map_campaign_error)?;
        let mut summaries = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let field_count = count_of(self.fields_of(&campaign.id).await?.len())?;
            let counts = self
                .campaigns
                .submission_counts(&campaign.id, campaign.last_viewed_at)
                .await
                .map_err(map_campaign_error)?;
            summaries.push(CampaignSummary {
                campaign,
                field_count,
                submission_count: counts.total,
                new_submission_count: counts.new,
            });
        }
        Ok(summaries)
    }

    async fn new_submission_total(&self, caller: &UserId, org_id: &OrganizationId) -> Result<u64, Error> {
        self.authorizer.require_member(caller, org_id).await?;
        let campaigns = self
            .campaigns
            .list_for_org(org_id)
            .await
            .map_err(map_campaign_error)?;
        let mut total = 0_u64;
        for campaign in &campaigns {
            let counts = self
                .campaigns
                .submission_counts(&campaign.id, campaign.last_viewed_at)
                .await
                .map_err(map_campaign_error)?;
            total = total.saturating_add(counts.new);
        }
        Ok(total)
    }

    async fn list_submissions(&self, caller: &UserId, campaign_id: &CampaignId) -> Result<Vec<Submission>, Error> {
        let campaign = self.load(campaign_id).await?;
        self.authorizer
            .require_member(caller, &campaign.org_id)
            .await?;
        self.campaigns
            .list_submissions(campaign_id)
            .await
            .map_err(map_campaign_error)
    }
}

#[async_trait]
impl<C, O> PublicCampaigns for CampaignService<C, O>
where
    C: CampaignRepository,
    O: OrganizationRepository,
{
    async fn public_campaign(&self, slug: &str) -> Result<PublicCampaign, Error> {
        let campaign = self.load_public(slug).await?;
        let fields = self.fields_of(&campaign.id).await?;
        Ok(PublicCampaign {
            id: campaign.id,
            name: campaign.name,
            description: campaign.description,
            slug: campaign.slug,
            fields,
        })
    }

    async fn submit(&self, slug: &str, answers: Vec<SubmissionAnswer>) -> Result<SubmissionId, Error> {
        let campaign = self.load_public(slug).await?;
        let fields = self.fields_of(&campaign.id).await?;
        let values = prepare_submission(&fields, answers).map_err(|error| rejected_submission(&error))?;
        let submission = Submission {
            id: SubmissionId::random(),
            campaign_id: campaign.id,
            created_at: self.clock.utc(),
            values,
        };
        self.campaigns
            .insert_submission(&submission)
            .await
            .map_err(map_campaign_error)?;
        info!(campaign_id = %campaign.id, submission_id = %submission.id, values = submission.values.len(), "submission received");
        Ok(submission.id)
    }
}

#[cfg(test)]
#[path = "campaign_service_tests.rs"]
mod tests;
