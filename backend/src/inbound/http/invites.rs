//! Invite handlers.
//!
//! ```text
//! GET    /api/v1/orgs/{org_id}/invites
//! POST   /api/v1/orgs/{org_id}/invites               {"email":"bob@example.com","role":"MEMBER"}
//! DELETE /api/v1/orgs/{org_id}/invites/{invite_id}
//! POST   /api/v1/invites/{token}/accept
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Email, Error, InviteId, InviteRole, InviteToken, InviteView, OrganizationId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{InviteResponse, MembershipResponse, MessageResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_value, reject};

const ORG_ID: FieldName = FieldName::new("orgId");

/// Body for inviting someone by email.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    /// Address to invite.
    #[schema(example = "bob@example.com")]
    pub email: String,
    /// `ADMIN`, `MEMBER`, or `VIEWER`.
    #[schema(example = "MEMBER")]
    pub role: String,
}

/// List pending invites of an organization.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/invites",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Pending invites, newest first", body = [InviteResponse]),
        (status = 403, description = "Role cannot invite", body = Error)
    ),
    tags = ["invites"],
    operation_id = "listInvites"
)]
#[get("/orgs/{org_id}/invites")]
pub async fn list_invites(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<InviteResponse>>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let invites = state.invites_query.list_invites(&caller, &org_id).await?;
    Ok(web::Json(invites.into_iter().map(Into::into).collect()))
}

/// Invite an email address and send the accept link.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/invites",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite created", body = InviteResponse),
        (status = 400, description = "Invalid email or role", body = Error),
        (status = 403, description = "Role cannot invite", body = Error),
        (status = 409, description = "Already a member or already invited", body = Error)
    ),
    tags = ["invites"],
    operation_id = "createInvite"
)]
#[post("/orgs/{org_id}/invites")]
pub async fn create_invite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateInviteRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let email = Email::new(&payload.email).map_err(reject)?;
    let role: InviteRole = parse_value(&payload.role, FieldName::new("role"))?;
    let invite = state
        .invites
        .create_invite(&caller, &org_id, &email, role)
        .await?;
    // The inviter is the caller; the listing endpoint resolves names.
    let view = InviteView {
        invite,
        inviter_name: String::new(),
    };
    Ok(HttpResponse::Created().json(InviteResponse::from(view)))
}

/// Withdraw a pending invite.
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/invites/{invite_id}",
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ("invite_id" = String, Path, description = "Invite id")
    ),
    responses(
        (status = 200, description = "Invite cancelled", body = MessageResponse),
        (status = 403, description = "Role cannot invite", body = Error)
    ),
    tags = ["invites"],
    operation_id = "cancelInvite"
)]
#[delete("/orgs/{org_id}/invites/{invite_id}")]
pub async fn cancel_invite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path.0, ORG_ID)?;
    let invite_id: InviteId = parse_id(&path.1, FieldName::new("inviteId"))?;
    state
        .invites
        .cancel_invite(&caller, &org_id, &invite_id)
        .await?;
    Ok(web::Json(MessageResponse::new("Invite cancelled")))
}

/// Join the inviting organization and make it active.
#[utoipa::path(
    post,
    path = "/api/v1/invites/{token}/accept",
    params(("token" = String, Path, description = "Token from the invite email")),
    responses(
        (status = 200, description = "Invite accepted", body = MembershipResponse),
        (status = 400, description = "Invite expired", body = Error),
        (status = 403, description = "Invite addressed to another email", body = Error),
        (status = 404, description = "Unknown or already used invite", body = Error),
        (status = 409, description = "Already a member", body = Error)
    ),
    tags = ["invites"],
    operation_id = "acceptInvite"
)]
#[post("/invites/{token}/accept")]
pub async fn accept_invite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MembershipResponse>> {
    let caller = session.require_user_id()?;
    let token = InviteToken::from_raw(path.into_inner());
    let membership = state.invites.accept_invite(&caller, &token).await?;
    session.set_active_org_id(&membership.org_id)?;
    Ok(web::Json(membership.into()))
}
