//! OpenAPI document for the REST API.
//!
//! Served by Swagger UI at `/docs` in debug builds. Schemas referenced by
//! handler annotations are collected automatically; the shared envelope and
//! enumerations are listed explicitly so they appear even when unused.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{CampaignStatus, Error, ErrorCode, FieldType, InviteRole, NoteStatus, OrgRole};

/// Registers the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "orgdesk_session",
                "Session cookie issued by POST /api/v1/login or /api/v1/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the whole HTTP surface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "orgdesk API",
        description = "Multi-tenant back office: organizations, members, invites, notes, and campaign forms."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::sign_up,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::change_password,
        crate::inbound::http::users::delete_account,
        crate::inbound::http::organizations::list_my_organizations,
        crate::inbound::http::organizations::create_organization,
        crate::inbound::http::organizations::active_organization,
        crate::inbound::http::organizations::get_organization,
        crate::inbound::http::organizations::rename_organization,
        crate::inbound::http::organizations::delete_organization,
        crate::inbound::http::organizations::switch_organization,
        crate::inbound::http::organizations::list_members,
        crate::inbound::http::organizations::change_member_role,
        crate::inbound::http::organizations::remove_member,
        crate::inbound::http::invites::list_invites,
        crate::inbound::http::invites::create_invite,
        crate::inbound::http::invites::cancel_invite,
        crate::inbound::http::invites::accept_invite,
        crate::inbound::http::notes::list_notes,
        crate::inbound::http::notes::create_note,
        crate::inbound::http::notes::get_note,
        crate::inbound::http::notes::update_note,
        crate::inbound::http::notes::delete_note,
        crate::inbound::http::notes::toggle_note_status,
        crate::inbound::http::notes::add_comment,
        crate::inbound::http::notes::delete_comment,
        crate::inbound::http::campaigns::list_campaigns,
        crate::inbound::http::campaigns::create_campaign,
        crate::inbound::http::campaigns::new_submission_total,
        crate::inbound::http::campaigns::open_campaign,
        crate::inbound::http::campaigns::update_campaign,
        crate::inbound::http::campaigns::delete_campaign,
        crate::inbound::http::campaigns::change_campaign_status,
        crate::inbound::http::campaigns::add_field,
        crate::inbound::http::campaigns::reorder_fields,
        crate::inbound::http::campaigns::list_submissions,
        crate::inbound::http::campaigns::update_field,
        crate::inbound::http::campaigns::delete_field,
        crate::inbound::http::public::public_campaign,
        crate::inbound::http::public::submit,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode, OrgRole, InviteRole, NoteStatus, CampaignStatus, FieldType)),
    tags(
        (name = "auth", description = "Sign-in, sign-up, and the current user"),
        (name = "account", description = "Profile, password, and account deletion"),
        (name = "organizations", description = "Organizations, membership, and the active organization"),
        (name = "invites", description = "Email invitations into an organization"),
        (name = "notes", description = "Notes and threaded comments"),
        (name = "campaigns", description = "Campaign forms, fields, and submissions"),
        (name = "public", description = "Unauthenticated campaign forms"),
        (name = "health", description = "Health checks for orchestration")
    )
)]
pub struct ApiDoc;
