//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers parse and validate transport input, call a driving port from
//! [`state::HttpState`], and map the result into a response DTO. Domain
//! errors become responses through [`error`].

pub mod campaigns;
pub mod error;
pub mod health;
pub mod invites;
pub mod notes;
pub mod organizations;
pub mod public;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every API handler on `cfg`.
///
/// Mounted under `/api/v1` by the server. Extractor failures are routed
/// through the domain error envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(users::login)
        .service(users::sign_up)
        .service(users::logout)
        .service(users::current_user)
        .service(users::update_profile)
        .service(users::change_password)
        .service(users::delete_account)
        .service(organizations::list_my_organizations)
        .service(organizations::create_organization)
        // Literal segment first so it never parses as an org id.
        .service(organizations::active_organization)
        .service(organizations::get_organization)
        .service(organizations::rename_organization)
        .service(organizations::delete_organization)
        .service(organizations::switch_organization)
        .service(organizations::list_members)
        .service(organizations::change_member_role)
        .service(organizations::remove_member)
        .service(invites::list_invites)
        .service(invites::create_invite)
        .service(invites::cancel_invite)
        .service(invites::accept_invite)
        .service(notes::list_notes)
        .service(notes::create_note)
        .service(notes::get_note)
        .service(notes::update_note)
        .service(notes::delete_note)
        .service(notes::toggle_note_status)
        .service(notes::add_comment)
        .service(notes::delete_comment)
        .service(campaigns::list_campaigns)
        .service(campaigns::create_campaign)
        .service(campaigns::new_submission_total)
        .service(campaigns::open_campaign)
        .service(campaigns::update_campaign)
        .service(campaigns::delete_campaign)
        .service(campaigns::change_campaign_status)
        .service(campaigns::add_field)
        .service(campaigns::reorder_fields)
        .service(campaigns::list_submissions)
        .service(campaigns::update_field)
        .service(campaigns::delete_field)
        .service(public::public_campaign)
        .service(public::submit);
}
