//! PostgreSQL-backed `CampaignRepository`.
//!
//! Field positions are guarded by a deferred unique constraint, so reorders
//! and gap-closing after a delete run inside a transaction and are checked
//! at commit. Every write that moves positions first takes a row lock on the
//! owning campaign, so appends, deletes, and reorders of one campaign run one
//! at a time.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{CampaignRepository, CampaignRepositoryError, SubmissionCounts};
use crate::domain::{
    Campaign, CampaignField, CampaignId, FieldId, OrganizationId, Submission, SubmissionId,
    SubmissionValue,
};

use super::diesel_basic_error_mapping::{
    classify_diesel_error, pool_error_message, DieselFailure,
};
use super::models::{
    CampaignFieldRow, CampaignFieldUpdate, CampaignRow, CampaignUpdate, SubmissionRow,
    SubmissionValueRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{campaign_fields, campaign_submission_values, campaign_submissions, campaigns};

const SLUG_CONSTRAINT: &str = "campaigns_slug_key";
const POSITION_CONSTRAINT: &str = "campaign_fields_position_key";

/// Diesel implementation of [`CampaignRepository`].
#[derive(Clone)]
pub struct DieselCampaignRepository {
    pool: DbPool,
}

impl DieselCampaignRepository {
    /// Build a repository over the shared pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CampaignRepositoryError {
    CampaignRepositoryError::connection(pool_error_message(error))
}

fn map_failure(failure: DieselFailure, slug: Option<&str>) -> CampaignRepositoryError {
    if let (true, Some(slug)) = (failure.violates(SLUG_CONSTRAINT), slug) {
        return CampaignRepositoryError::duplicate_slug(slug);
    }
    if failure.violates(POSITION_CONSTRAINT) {
        return CampaignRepositoryError::field_order_conflict();
    }
    match failure {
        DieselFailure::Connection(message) => CampaignRepositoryError::connection(message),
        DieselFailure::UniqueViolation { .. } => {
            CampaignRepositoryError::query("unique constraint violated")
        }
        DieselFailure::Query(message) => CampaignRepositoryError::query(message),
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CampaignRepositoryError {
    map_failure(classify_diesel_error(error), None)
}

fn decode_campaign(row: CampaignRow) -> Result<Campaign, CampaignRepositoryError> {
    Campaign::try_from(row).map_err(|err| CampaignRepositoryError::query(err.to_string()))
}

fn decode_field(row: CampaignFieldRow) -> Result<CampaignField, CampaignRepositoryError> {
    CampaignField::try_from(row).map_err(|err| CampaignRepositoryError::query(err.to_string()))
}

fn position_of(index: usize) -> Result<i32, diesel::result::Error> {
    i32::try_from(index).map_err(|err| diesel::result::Error::QueryBuilderError(Box::new(err)))
}

/// Hold the campaign row until commit; readers and submission inserts are
/// not blocked.
async fn lock_campaign(conn: &mut AsyncPgConnection, campaign_id: Uuid) -> QueryResult<()> {
    campaigns::table
        .find(campaign_id)
        .select(campaigns::id)
        .for_no_key_update()
        .first::<Uuid>(conn)
        .await
        .optional()
        .map(|_| ())
}

fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

#[async_trait]
impl CampaignRepository for DieselCampaignRepository {
    async fn insert(&self, campaign: &Campaign) -> Result<(), CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::insert_into(campaigns::table)
            .values(&CampaignRow::from(campaign))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_failure(classify_diesel_error(err), Some(&campaign.slug)))
    }

    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CampaignRow> = campaigns::table
            .find(id.as_uuid())
            .select(CampaignRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode_campaign).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Campaign>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CampaignRow> = campaigns::table
            .filter(campaigns::slug.eq(slug))
            .select(CampaignRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode_campaign).transpose()
    }

    async fn list_for_org(
        &self,
        org_id: &OrganizationId,
    ) -> Result<Vec<Campaign>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CampaignRow> = campaigns::table
            .filter(campaigns::org_id.eq(org_id.as_uuid()))
            .order(campaigns::created_at.desc())
            .select(CampaignRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(decode_campaign).collect()
    }

    async fn update(&self, campaign: &Campaign) -> Result<bool, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = CampaignUpdate {
            name: &campaign.name,
            description: campaign.description.as_deref(),
            status: campaign.status.as_str(),
            updated_at: campaign.updated_at,
        };
        let affected = diesel::update(campaigns::table.find(campaign.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn delete(&self, id: &CampaignId) -> Result<bool, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::delete(campaigns::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn mark_viewed(
        &self,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<bool, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let affected = diesel::update(campaigns::table.find(id.as_uuid()))
            .set(campaigns::last_viewed_at.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn list_fields(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<CampaignField>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<CampaignFieldRow> = campaign_fields::table
            .filter(campaign_fields::campaign_id.eq(campaign_id.as_uuid()))
            .order(campaign_fields::position.asc())
            .select(CampaignFieldRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(decode_field).collect()
    }

    async fn find_field(&self, id: &FieldId) -> Result<Option<CampaignField>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<CampaignFieldRow> = campaign_fields::table
            .find(id.as_uuid())
            .select(CampaignFieldRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(decode_field).transpose()
    }

    async fn append_field(&self, field: &CampaignField) -> Result<i32, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut row = CampaignFieldRow::from(field);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                lock_campaign(conn, row.campaign_id).await?;
                let count: i64 = campaign_fields::table
                    .filter(campaign_fields::campaign_id.eq(row.campaign_id))
                    .select(count_star())
                    .get_result(conn)
                    .await?;
                row.position = i32::try_from(count)
                    .map_err(|err| diesel::result::Error::QueryBuilderError(Box::new(err)))?;
                diesel::insert_into(campaign_fields::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(row.position)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update_field(&self, field: &CampaignField) -> Result<bool, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = CampaignFieldUpdate {
            name: &field.name,
            field_type: field.field_type.as_str(),
            required: field.required,
            options: field.options.as_deref(),
        };
        let affected = diesel::update(campaign_fields::table.find(field.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(affected > 0)
    }

    async fn delete_field(&self, id: &FieldId) -> Result<bool, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let field_id = *id.as_uuid();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let owner: Option<Uuid> = campaign_fields::table
                    .find(field_id)
                    .select(campaign_fields::campaign_id)
                    .first(conn)
                    .await
                    .optional()?;
                let Some(owner) = owner else {
                    return Ok(false);
                };
                lock_campaign(conn, owner).await?;
                let removed: Option<(Uuid, i32)> =
                    diesel::delete(campaign_fields::table.find(field_id))
                        .returning((campaign_fields::campaign_id, campaign_fields::position))
                        .get_result(conn)
                        .await
                        .optional()?;
                let Some((campaign_id, position)) = removed else {
                    return Ok(false);
                };
                diesel::update(
                    campaign_fields::table
                        .filter(campaign_fields::campaign_id.eq(campaign_id))
                        .filter(campaign_fields::position.gt(position)),
                )
                .set(campaign_fields::position.eq(campaign_fields::position - 1))
                .execute(conn)
                .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn reorder_fields(
        &self,
        campaign_id: &CampaignId,
        ordered: &[FieldId],
    ) -> Result<(), CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let campaign_uuid = *campaign_id.as_uuid();
        let field_ids: Vec<Uuid> = ordered.iter().map(|id| *id.as_uuid()).collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                lock_campaign(conn, campaign_uuid).await?;
                for (index, field_id) in field_ids.iter().enumerate() {
                    diesel::update(
                        campaign_fields::table
                            .filter(campaign_fields::id.eq(field_id))
                            .filter(campaign_fields::campaign_id.eq(campaign_uuid)),
                    )
                    .set(campaign_fields::position.eq(position_of(index)?))
                    .execute(conn)
                    .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let header = SubmissionRow {
            id: *submission.id.as_uuid(),
            campaign_id: *submission.campaign_id.as_uuid(),
            created_at: submission.created_at,
        };
        let values: Vec<SubmissionValueRow> = submission
            .values
            .iter()
            .map(|value| SubmissionValueRow {
                submission_id: header.id,
                field_id: *value.field_id.as_uuid(),
                value: value.value.clone(),
            })
            .collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(campaign_submissions::table)
                    .values(&header)
                    .execute(conn)
                    .await?;
                if !values.is_empty() {
                    diesel::insert_into(campaign_submission_values::table)
                        .values(&values)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_submissions(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<Submission>, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let headers: Vec<SubmissionRow> = campaign_submissions::table
            .filter(campaign_submissions::campaign_id.eq(campaign_id.as_uuid()))
            .order(campaign_submissions::created_at.desc())
            .select(SubmissionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ids: Vec<Uuid> = headers.iter().map(|row| row.id).collect();
        let value_rows: Vec<SubmissionValueRow> = campaign_submission_values::table
            .inner_join(campaign_fields::table)
            .filter(campaign_submission_values::submission_id.eq_any(&ids))
            .order(campaign_fields::position.asc())
            .select(SubmissionValueRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut values: HashMap<Uuid, Vec<SubmissionValue>> = HashMap::new();
        for row in value_rows {
            values.entry(row.submission_id).or_default().push(SubmissionValue {
                field_id: FieldId::from_uuid(row.field_id),
                value: row.value,
            });
        }

        Ok(headers
            .into_iter()
            .map(|row| Submission {
                id: SubmissionId::from_uuid(row.id),
                campaign_id: CampaignId::from_uuid(row.campaign_id),
                created_at: row.created_at,
                values: values.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn submission_counts(
        &self,
        campaign_id: &CampaignId,
        last_viewed_at: Option<DateTime<Utc>>,
    ) -> Result<SubmissionCounts, CampaignRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let campaign_uuid = *campaign_id.as_uuid();

        let total: i64 = campaign_submissions::table
            .filter(campaign_submissions::campaign_id.eq(campaign_uuid))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        // Everything counts as new until the first view.
        let new = match last_viewed_at {
            None => total,
            Some(viewed) => campaign_submissions::table
                .filter(campaign_submissions::campaign_id.eq(campaign_uuid))
                .filter(campaign_submissions::created_at.gt(viewed))
                .select(count_star())
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?,
        };

        Ok(SubmissionCounts {
            total: count_to_u64(total),
            new: count_to_u64(new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn slug_clash_reports_the_slug() {
        let failure = DieselFailure::UniqueViolation {
            constraint: Some(SLUG_CONSTRAINT.to_owned()),
        };
        assert_eq!(
            map_failure(failure, Some("k3j9x2m4q8w1")),
            CampaignRepositoryError::duplicate_slug("k3j9x2m4q8w1")
        );
    }

    #[rstest]
    #[case(Some("k3j9x2m4q8w1"))]
    #[case(None)]
    fn position_clash_is_an_order_conflict(#[case] slug: Option<&str>) {
        let failure = DieselFailure::UniqueViolation {
            constraint: Some(POSITION_CONSTRAINT.to_owned()),
        };
        assert_eq!(map_failure(failure, slug), CampaignRepositoryError::field_order_conflict());
    }

    #[rstest]
    fn other_unique_clashes_stay_query_errors() {
        let failure = DieselFailure::UniqueViolation {
            constraint: Some("campaign_submissions_pkey".to_owned()),
        };
        assert_eq!(
            map_failure(failure, None),
            CampaignRepositoryError::query("unique constraint violated")
        );
    }
}
