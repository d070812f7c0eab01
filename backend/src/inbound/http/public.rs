//! Unauthenticated campaign form endpoints.
//!
//! ```text
//! GET  /api/v1/public/campaigns/{slug}
//! POST /api/v1/public/campaigns/{slug}/submissions  {"values":[{"fieldId":"...","value":"a@b.co"}]}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, FieldId, SubmissionAnswer};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{PublicCampaignResponse, SubmissionReceipt};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

/// One answer in a public submission.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    /// Field being answered.
    pub field_id: String,
    /// Answer text.
    #[schema(example = "ada@example.com")]
    pub value: String,
}

/// Body of a public form submission.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Answers; unanswered fields may be omitted.
    #[serde(default)]
    pub values: Vec<AnswerRequest>,
}

impl SubmitRequest {
    fn into_answers(self) -> Result<Vec<SubmissionAnswer>, Error> {
        let field = FieldName::new("fieldId");
        self.values
            .into_iter()
            .map(|answer| {
                let field_id: FieldId = parse_id(&answer.field_id, field)?;
                Ok(SubmissionAnswer {
                    field_id,
                    value: answer.value,
                })
            })
            .collect()
    }
}

/// Show an active campaign form by slug.
#[utoipa::path(
    get,
    path = "/api/v1/public/campaigns/{slug}",
    params(("slug" = String, Path, description = "Public campaign slug")),
    responses(
        (status = 200, description = "Form definition", body = PublicCampaignResponse),
        (status = 404, description = "Unknown or inactive campaign", body = Error)
    ),
    tags = ["public"],
    operation_id = "publicCampaign",
    security([])
)]
#[get("/public/campaigns/{slug}")]
pub async fn public_campaign(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PublicCampaignResponse>> {
    let campaign = state.public_campaigns.public_campaign(&path).await?;
    Ok(web::Json(campaign.into()))
}

/// Submit answers to an active campaign form.
#[utoipa::path(
    post,
    path = "/api/v1/public/campaigns/{slug}/submissions",
    params(("slug" = String, Path, description = "Public campaign slug")),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Submission recorded", body = SubmissionReceipt),
        (status = 400, description = "Missing, unknown, or malformed answers", body = Error),
        (status = 404, description = "Unknown or inactive campaign", body = Error)
    ),
    tags = ["public"],
    operation_id = "submitCampaign",
    security([])
)]
#[post("/public/campaigns/{slug}/submissions")]
pub async fn submit(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<SubmitRequest>,
) -> ApiResult<HttpResponse> {
    let answers = payload.into_inner().into_answers()?;
    let id = state.public_campaigns.submit(&path, answers).await?;
    Ok(HttpResponse::Created().json(SubmissionReceipt { id: id.into() }))
}
