//! Organization and membership handlers.
//!
//! ```text
//! GET    /api/v1/orgs
//! POST   /api/v1/orgs                         {"name":"Acme Corp"}
//! GET    /api/v1/orgs/active
//! GET    /api/v1/orgs/{org_id}
//! PATCH  /api/v1/orgs/{org_id}                {"name":"Acme Inc"}
//! DELETE /api/v1/orgs/{org_id}
//! POST   /api/v1/orgs/{org_id}/switch
//! GET    /api/v1/orgs/{org_id}/members
//! PATCH  /api/v1/orgs/{org_id}/members/{user_id}  {"role":"ADMIN"}
//! DELETE /api/v1/orgs/{org_id}/members/{user_id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, OrgRole, OrganizationId, OrganizationName, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    MemberResponse, MembershipResponse, MessageResponse, MyOrganizationResponse,
    OrganizationDetailResponse, OrganizationResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_value, reject};

const ORG_ID: FieldName = FieldName::new("orgId");
const USER_ID: FieldName = FieldName::new("userId");

/// Body for creating or renaming an organization.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    /// Organization name.
    #[schema(example = "Acme Corp")]
    pub name: String,
}

/// Body for changing a member role.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    /// `ADMIN`, `MEMBER`, or `VIEWER`.
    #[schema(example = "ADMIN")]
    pub role: String,
}

/// Active organization, absent when the caller belongs to none.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveOrganizationResponse {
    /// Organization the session points at.
    pub active: Option<MyOrganizationResponse>,
}

/// List the caller's organizations.
#[utoipa::path(
    get,
    path = "/api/v1/orgs",
    responses(
        (status = 200, description = "Caller's organizations, highest role first, then most recently joined",
            body = [MyOrganizationResponse]),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "listMyOrganizations"
)]
#[get("/orgs")]
pub async fn list_my_organizations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<MyOrganizationResponse>>> {
    let caller = session.require_user_id()?;
    let orgs = state.organizations_query.list_my_organizations(&caller).await?;
    Ok(web::Json(orgs.into_iter().map(Into::into).collect()))
}

/// Create an organization owned by the caller and make it active.
#[utoipa::path(
    post,
    path = "/api/v1/orgs",
    request_body = OrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = OrganizationResponse),
        (status = 400, description = "Invalid name", body = Error),
        (status = 409, description = "Slug already taken", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "createOrganization"
)]
#[post("/orgs")]
pub async fn create_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OrganizationRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_user_id()?;
    let name = OrganizationName::new(&payload.name).map_err(reject)?;
    let org = state.organizations.create_organization(&caller, &name).await?;
    session.set_active_org_id(&org.id)?;
    Ok(HttpResponse::Created().json(OrganizationResponse::from(org)))
}

/// Organization the session points at, falling back to the latest membership.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/active",
    responses(
        (status = 200, description = "Active organization", body = ActiveOrganizationResponse),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "activeOrganization"
)]
#[get("/orgs/active")]
pub async fn active_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ActiveOrganizationResponse>> {
    let caller = session.require_user_id()?;
    let pointer = session.active_org_id()?;
    let resolved = state
        .organizations_query
        .resolve_active(&caller, pointer)
        .await?;
    match &resolved {
        Some(entry) if pointer != Some(entry.organization.id) => {
            session.set_active_org_id(&entry.organization.id)?;
        }
        None if pointer.is_some() => session.clear_active_org_id(),
        _ => {}
    }
    Ok(web::Json(ActiveOrganizationResponse {
        active: resolved.map(Into::into),
    }))
}

/// Show an organization to one of its members.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization detail", body = OrganizationDetailResponse),
        (status = 404, description = "Unknown or not a member", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "getOrganization"
)]
#[get("/orgs/{org_id}")]
pub async fn get_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<OrganizationDetailResponse>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let overview = state.organizations_query.get_organization(&caller, &org_id).await?;
    Ok(web::Json(overview.into()))
}

/// Rename an organization.
#[utoipa::path(
    patch,
    path = "/api/v1/orgs/{org_id}",
    params(("org_id" = String, Path, description = "Organization id")),
    request_body = OrganizationRequest,
    responses(
        (status = 200, description = "Organization renamed", body = OrganizationResponse),
        (status = 403, description = "Owner or admin only", body = Error),
        (status = 409, description = "Slug already taken", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "renameOrganization"
)]
#[patch("/orgs/{org_id}")]
pub async fn rename_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<OrganizationRequest>,
) -> ApiResult<web::Json<OrganizationResponse>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let name = OrganizationName::new(&payload.name).map_err(reject)?;
    let org = state
        .organizations
        .rename_organization(&caller, &org_id, &name)
        .await?;
    Ok(web::Json(org.into()))
}

/// Delete an organization and everything it owns.
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization deleted", body = MessageResponse),
        (status = 403, description = "Owner only", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "deleteOrganization"
)]
#[delete("/orgs/{org_id}")]
pub async fn delete_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    state.organizations.delete_organization(&caller, &org_id).await?;
    if session.active_org_id()? == Some(org_id) {
        session.clear_active_org_id();
    }
    Ok(web::Json(MessageResponse::new("Organization deleted")))
}

/// Make `org_id` the session's active organization.
#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/switch",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Active organization changed", body = MembershipResponse),
        (status = 404, description = "Unknown or not a member", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "switchOrganization"
)]
#[post("/orgs/{org_id}/switch")]
pub async fn switch_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<MembershipResponse>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let membership = state.organizations.switch_active(&caller, &org_id).await?;
    session.set_active_org_id(&org_id)?;
    Ok(web::Json(membership.into()))
}

/// List members with their profile data.
#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/members",
    params(("org_id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Members, earliest joiner first", body = [MemberResponse]),
        (status = 404, description = "Unknown or not a member", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "listMembers"
)]
#[get("/orgs/{org_id}/members")]
pub async fn list_members(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<MemberResponse>>> {
    let caller = session.require_user_id()?;
    let org_id: OrganizationId = parse_id(&path, ORG_ID)?;
    let members = state.organizations_query.list_members(&caller, &org_id).await?;
    Ok(web::Json(members.into_iter().map(Into::into).collect()))
}

fn member_path(path: &(String, String)) -> Result<(OrganizationId, UserId), Error> {
    Ok((parse_id(&path.0, ORG_ID)?, parse_id(&path.1, USER_ID)?))
}

/// Change another member's role.
#[utoipa::path(
    patch,
    path = "/api/v1/orgs/{org_id}/members/{user_id}",
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ("user_id" = String, Path, description = "Member's user id")
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = MembershipResponse),
        (status = 400, description = "Own role or OWNER requested", body = Error),
        (status = 403, description = "Owner only", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "changeMemberRole"
)]
#[patch("/orgs/{org_id}/members/{user_id}")]
pub async fn change_member_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    payload: web::Json<ChangeRoleRequest>,
) -> ApiResult<web::Json<MembershipResponse>> {
    let caller = session.require_user_id()?;
    let (org_id, target) = member_path(&path)?;
    let role: OrgRole = parse_value(&payload.role, FieldName::new("role"))?;
    let membership = state
        .organizations
        .change_member_role(&caller, &org_id, &target, role)
        .await?;
    Ok(web::Json(membership.into()))
}

/// Remove a member from an organization.
#[utoipa::path(
    delete,
    path = "/api/v1/orgs/{org_id}/members/{user_id}",
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ("user_id" = String, Path, description = "Member's user id")
    ),
    responses(
        (status = 200, description = "Member removed", body = MessageResponse),
        (status = 403, description = "Not permitted or target is the owner", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "removeMember"
)]
#[delete("/orgs/{org_id}/members/{user_id}")]
pub async fn remove_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<MessageResponse>> {
    let caller = session.require_user_id()?;
    let (org_id, target) = member_path(&path)?;
    state
        .organizations
        .remove_member(&caller, &org_id, &target)
        .await?;
    Ok(web::Json(MessageResponse::new("Member removed")))
}

#[cfg(test)]
#[path = "organizations_tests.rs"]
mod tests;
