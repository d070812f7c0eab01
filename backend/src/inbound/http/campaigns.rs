//! Campaign, field, and submission handlers for organization members.
//!
//! ```text
//! GET    /api/v1/orgs/{org_id}/campaigns
//! POST   /api/v1/orgs/{org_id}/campaigns          {"name":"Signup","description":null}
//! GET    /api/v1/orgs/{org_id}/campaigns/new-submissions
//! GET    /api/v1/campaigns/{campaign_id}
//! PATCH  /api/v1/campaigns/{campaign_id}          {"name":"Beta signup"}
//! DELETE /api/v1/campaigns/{campaign_id}
//! POST   /api/v1/campaigns/{campaign_id}/status   {"status":"ACTIVE"}
//! POST   /api/v1/campaigns/{campaign_id}/fields   {"name":"Email","type":"EMAIL","required":true}
//! PUT    /api/v1/campaigns/{campaign_id}/fields/order  {"fieldIds":["..."]}
//! GET    /api/v1/campaigns/{campaign_id}/submissions
//! PATCH  /api/v1/fields/{field_id}                {"required":false}
//! DELETE /api/v1/fields/{field_id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{
    CampaignDraft, CampaignId, CampaignPatch, CampaignStatus, Error, FieldDraft, FieldId,
    FieldPatch, FieldType, OrganizationId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CampaignDetailResponse, CampaignResponse, CampaignSummaryResponse, FieldResponse,
    MessageResponse, NewSubmissionTotalResponse, SubmissionResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_id_list, parse_value, reject};

const ORG_ID: FieldName = FieldName::new("orgId");
const CAMPAIGN_ID: FieldName = FieldName::new("campaignId");
const FIELD_ID: FieldName = FieldName::new("fieldId");
const FIELD_TYPE: FieldName = FieldName::new("type");

/// Body for creating a campaign.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    /// Campaign name.
    #[schema(example = "Beta signup")]
    pub name: String,
    /// Optional blurb shown above the form.
    #[serde(default)]
    pub description: Option<String>,
}

/// Omitted values stay unchanged; a blank description clears it.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New blurb; blank clears it.
    #[serde(default)]
    pub description: Option<String>,
}

/// Body for a lifecycle move.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatusRequest {
    /// `DRAFT`, `ACTIVE`, or `CLOSED`.
    #[schema(example = "ACTIVE")]
    pub status: String,
}

/// Body for adding a form field.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldRequest {
    /// Question label.
    #[schema(example = "Email")]
    pub name: String,
    /// `TEXT`, `EMAIL`, `NUMBER`, `TEXTAREA`, or `SELECT`.
    #[serde(rename = "type")]
    #[schema(example = "EMAIL")]
    pub field_type: String,
    /// Whether an answer is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Comma-separated choices; required for `SELECT`.
    #[serde(default)]
    pub options: Option<String>,
}

/// Partial field update. `"options": null` clears the options.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    /// New label.
    #[serde(default)]
    pub name: Option<String>,
    /// New input kind.
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    /// New required flag.
    #[serde(default)]
    pub required: Option<bool>,
    /// New choices; `null` clears them.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub options: Option<Option<String>>,
}

/// Distinguish an explicit `null` from an omitted key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body for rewriting field order.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFieldsRequest {
    /// Every field id of the campaign in the desired order.
    pub field_ids: Vec<String>,
}

/// List campaigns of an organization with their counters.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/campaigns",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Campaigns with counters, newest first",
            body = [CampaignSummaryResponse]),
        (status = 404, description = "Unknown or not a member", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "listCampaigns"
)]
#[get("/orgs/{org_id}/campaigns")]
pub async fn list_campaigns(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CampaignSummaryResponse>>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let campaigns = state.campaigns_query.list_campaigns(&caller, &org_id).await?;
    Ok(web::Json(campaigns.into_iter().map(Into::into).collect()))
}

/// Create a draft campaign.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/campaigns",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Draft campaign created", body = CampaignResponse),
        (status = 400, description = "Invalid name or description", body = Error),
        (status = 403, description = "Viewers cannot create campaigns", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "createCampaign"
)]
#[post("/orgs/{org_id}/campaigns")]
pub async fn create_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateCampaignRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let draft = CampaignDraft::new(&payload.name, payload.description.as_deref()).map_err(reject)?;
    let campaign = state.campaigns.create_campaign(&caller, &org_id, draft).await?;
    Ok(HttpResponse::Created().json(CampaignResponse::from(campaign)))
}

/// Submissions received since each campaign was last opened, summed.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/campaigns/new-submissions",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Unseen submission total", body = NewSubmissionTotalResponse),
        (status = 404, description = "Unknown or not a member", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "newSubmissionTotal"
)]
#[get("/orgs/{org_id}/campaigns/new-submissions")]
pub async fn new_submission_total(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NewSubmissionTotalResponse>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let new_submissions = state
        .campaigns_query
        .new_submission_total(&caller, &org_id)
        .await?;
    Ok(web::Json(NewSubmissionTotalResponse { new_submissions }))
}

/// Campaign detail. Opening it marks its submissions as seen.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{campaign_id}",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign with fields and counters", body = CampaignDetailResponse),
        (status = 404, description = "Unknown campaign or not a member", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "openCampaign"
)]
#[get("/campaigns/{campaign_id}")]
pub async fn open_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CampaignDetailResponse>> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    let detail = state.campaigns.open_campaign(&caller, &campaign_id).await?;
    Ok(web::Json(detail.into()))
}

/// Rename a campaign or change its description.
#[utoipa::path(
    patch,
    path = "/api/v1/campaigns/{campaign_id}",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = CampaignResponse),
        (status = 403, description = "Only the author or an admin", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "updateCampaign"
)]
#[patch("/campaigns/{campaign_id}")]
pub async fn update_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateCampaignRequest>,
) -> ApiResult<web::Json<CampaignResponse>> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    let patch = CampaignPatch::new(payload.name.as_deref(), payload.description.as_deref()).map_err(reject)?;
    let campaign = state
        .campaigns
        .update_campaign(&caller, &campaign_id, patch)
        .await?;
    Ok(web::Json(campaign.into()))
}

/// Delete a campaign with its fields and submissions.
#[utoipa::path(
    delete,
    path = "/api/v1/campaigns/{campaign_id}",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign, fields, and submissions deleted", body = MessageResponse),
        (status = 403, description = "Only the author or an admin", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "deleteCampaign"
)]
#[delete("/campaigns/{campaign_id}")]
pub async fn delete_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    state.campaigns.delete_campaign(&caller, &campaign_id).await?;
    Ok(web::Json(MessageResponse::new("Campaign deleted")))
}

/// Move a campaign through its lifecycle.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{campaign_id}/status",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = CampaignResponse),
        (status = 409, description = "Transition not allowed", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "changeCampaignStatus"
)]
#[post("/campaigns/{campaign_id}/status")]
pub async fn change_campaign_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ChangeStatusRequest>,
) -> ApiResult<web::Json<CampaignResponse>> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    let status: CampaignStatus = parse_value(&payload.status, FieldName::new("status"))?;
    let campaign = state
        .campaigns
        .change_campaign_status(&caller, &campaign_id, status)
        .await?;
    Ok(web::Json(campaign.into()))
}

/// Append a field to a campaign form.
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{campaign_id}/fields",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    request_body = CreateFieldRequest,
    responses(
        (status = 201, description = "Field appended", body = FieldResponse),
        (status = 400, description = "Invalid field definition", body = Error),
        (status = 403, description = "Viewers cannot edit fields", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "addField"
)]
#[post("/campaigns/{campaign_id}/fields")]
pub async fn add_field(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateFieldRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    let field_type: FieldType = parse_value(&payload.field_type, FIELD_TYPE)?;
    let draft = FieldDraft::new(
        &payload.name,
        field_type,
        payload.required,
        payload.options.as_deref(),
    )
    .map_err(reject)?;
    let field = state.campaigns.add_field(&caller, &campaign_id, draft).await?;
    Ok(HttpResponse::Created().json(FieldResponse::from(field)))
}

/// Rewrite the order of every field.
#[utoipa::path(
    put,
    path = "/api/v1/campaigns/{campaign_id}/fields/order",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    request_body = ReorderFieldsRequest,
    responses(
        (status = 200, description = "Fields in their new order", body = [FieldResponse]),
        (status = 400, description = "Not a permutation of the campaign's fields", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "reorderFields"
)]
#[put("/campaigns/{campaign_id}/fields/order")]
pub async fn reorder_fields(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ReorderFieldsRequest>,
) -> ApiResult<web::Json<Vec<FieldResponse>>> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    let ordered: Vec<FieldId> = parse_id_list(&payload.field_ids, FieldName::new("fieldIds"))?;
    let fields = state
        .campaigns
        .reorder_fields(&caller, &campaign_id, ordered)
        .await?;
    Ok(web::Json(fields.into_iter().map(Into::into).collect()))
}

/// List submissions, newest first, and mark them seen.
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{campaign_id}/submissions",
    params(("campaign_id" = String, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Submissions, newest first", body = [SubmissionResponse]),
        (status = 404, description = "Unknown campaign or not a member", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "listSubmissions"
)]
#[get("/campaigns/{campaign_id}/submissions")]
pub async fn list_submissions(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SubmissionResponse>>> {
    let caller = session.require_user_id()?;
    let campaign_id: CampaignId = parse_id(&path, CAMPAIGN_ID)?;
    let submissions = state
        .campaigns_query
        .list_submissions(&caller, &campaign_id)
        .await?;
    Ok(web::Json(submissions.into_iter().map(Into::into).collect()))
}

/// Edit a field definition.
#[utoipa::path(
    patch,
    path = "/api/v1/fields/{field_id}",
    params(("field_id" = String, Path, description = "Field id")),
    request_body = UpdateFieldRequest,
    responses(
        (status = 200, description = "Field updated", body = FieldResponse),
        (status = 400, description = "Invalid field definition", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "updateField"
)]
#[patch("/fields/{field_id}")]
pub async fn update_field(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateFieldRequest>,
) -> ApiResult<web::Json<FieldResponse>> {
    let caller = session.require_user_id()?;
    let field_id: FieldId = parse_id(&path, FIELD_ID)?;
    let request = payload.into_inner();
    let patch = FieldPatch {
        name: request.name,
        field_type: request
            .field_type
            .as_deref()
            .map(|raw| parse_value(raw, FIELD_TYPE))
            .transpose()?,
        required: request.required,
        options: request.options,
    };
    let field = state.campaigns.update_field(&caller, &field_id, patch).await?;
    Ok(web::Json(field.into()))
}

/// Remove a field and close the gap in the order.
#[utoipa::path(
    delete,
    path = "/api/v1/fields/{field_id}",
    params(("field_id" = String, Path, description = "Field id")),
    responses(
        (status = 200, description = "Field and its answers deleted", body = MessageResponse),
        (status = 403, description = "Viewers cannot edit fields", body = Error)
    ),
    tags = ["campaigns"],
    operation_id = "deleteField"
)]
#[delete("/fields/{field_id}")]
pub async fn delete_field(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let field_id: FieldId = parse_id(&path, FIELD_ID)?;
    state.campaigns.delete_field(&caller, &field_id).await?;
    Ok(web::Json(MessageResponse::new("Field deleted")))
}

#[cfg(test)]
#[path = "campaigns_tests.rs"]
mod tests;
