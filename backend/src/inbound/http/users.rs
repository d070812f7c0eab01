//! Authentication handlers.
//!
//! ```text
//! POST /api/v1/login   {"email":"ada@example.com","password":"secret"}
//! POST /api/v1/signup  {"email":"ada@example.com","password":"secret-one","name":"Ada"}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! PATCH /api/v1/users/me           {"name":"Ada L","email":"ada@example.com"}
//! PUT  /api/v1/users/me/password  {"currentPassword":"...","newPassword":"..."}
//! DELETE /api/v1/users/me
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Error, LoginCredentials, PasswordChange, ProfileUpdate, SignUpDetails};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{MessageResponse, UserResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::reject;

/// Body of `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Body of `POST /api/v1/signup`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Account email.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// At least eight characters.
    pub password: String,
    /// Display name.
    #[schema(example = "Ada Lovelace")]
    pub name: String,
}

/// Body of `PATCH /api/v1/users/me`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// New display name.
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// New login email.
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// Body of `PUT /api/v1/users/me/password`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Password in use now.
    pub current_password: String,
    /// Replacement, at least eight characters.
    pub new_password: String,
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password).map_err(reject)?;
    let profile = state.login.authenticate(&credentials).await?;
    session.sign_in(&profile.id)?;
    Ok(web::Json(profile.into()))
}

/// Register an account with the identity provider and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "signUp",
    security([])
)]
#[post("/signup")]
pub async fn sign_up(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignUpRequest>,
) -> ApiResult<HttpResponse> {
    let details =
        SignUpDetails::try_from_parts(&payload.email, &payload.password, &payload.name).map_err(reject)?;
    let profile = state.login.sign_up(&details).await?;
    info!(user_id = %profile.id, "account registered");
    session.sign_in(&profile.id)?;
    Ok(HttpResponse::Created().json(UserResponse::from(profile)))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared", body = MessageResponse)),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> web::Json<MessageResponse> {
    session.sign_out();
    web::Json(MessageResponse::new("Signed out"))
}

/// Profile of the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let profile = state.login.current_user(&user_id).await?;
    Ok(web::Json(profile.into()))
}

/// Change the display name and, when it differs, the email.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["account"],
    operation_id = "updateProfile"
)]
#[patch("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from_parts(&payload.name, &payload.email).map_err(reject)?;
    let profile = state.account.update_profile(&user_id, &update).await?;
    Ok(web::Json(profile.into()))
}

/// Replace the password once the current one checks out.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid request or wrong current password", body = Error),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["account"],
    operation_id = "changePassword"
)]
#[put("/users/me/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let user_id = session.require_user_id()?;
    let change =
        PasswordChange::try_from_parts(&payload.current_password, &payload.new_password).map_err(reject)?;
    state.account.change_password(&user_id, &change).await?;
    Ok(web::Json(MessageResponse::new("Password changed")))
}

/// Delete the account and end the session.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Not signed in", body = Error),
        (status = 409, description = "Caller still owns organizations", body = Error)
    ),
    tags = ["account"],
    operation_id = "deleteAccount"
)]
#[delete("/users/me")]
pub async fn delete_account(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<MessageResponse>> {
    let user_id = session.require_user_id()?;
    state.account.delete_account(&user_id).await?;
    session.sign_out();
    Ok(web::Json(MessageResponse::new("Account deleted")))
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
