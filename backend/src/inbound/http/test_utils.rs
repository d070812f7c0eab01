//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};

use crate::domain::ports::{
    MockAccountCommand, MockCampaignsCommand, MockCampaignsQuery, MockInvitesCommand, MockInvitesQuery,
    MockLoginService, MockNotesCommand, MockNotesQuery, MockOrganizationsCommand,
    MockOrganizationsQuery, MockPublicCampaigns,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Session middleware for tests: fresh key, cookie `session`, no `Secure`.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `response`.
///
/// # Panics
/// Panics when the response did not set one.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// One mock per driving port; set expectations, then call [`Self::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub account: MockAccountCommand,
    pub organizations: MockOrganizationsCommand,
    pub organizations_query: MockOrganizationsQuery,
    pub invites: MockInvitesCommand,
    pub invites_query: MockInvitesQuery,
    pub notes: MockNotesCommand,
    pub notes_query: MockNotesQuery,
    pub campaigns: MockCampaignsCommand,
    pub campaigns_query: MockCampaignsQuery,
    pub public_campaigns: MockPublicCampaigns,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            account: Arc::new(self.account),
            organizations: Arc::new(self.organizations),
            organizations_query: Arc::new(self.organizations_query),
            invites: Arc::new(self.invites),
            invites_query: Arc::new(self.invites_query),
            notes: Arc::new(self.notes),
            notes_query: Arc::new(self.notes_query),
            campaigns: Arc::new(self.campaigns),
            campaigns_query: Arc::new(self.campaigns_query),
            public_campaigns: Arc::new(self.public_campaigns),
        }
    }
}

async fn sign_in_as(session: SessionContext, path: web::Path<String>) -> Result<HttpResponse, Error> {
    let user_id: UserId = path
        .parse()
        .map_err(|_| Error::invalid_request("bad test user id"))?;
    session.sign_in(&user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Full API under `/api/v1` plus a `/test/sign-in/{user_id}` shortcut.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route("/test/sign-in/{user_id}", web::post().to(sign_in_as))
        .service(web::scope("/api/v1").configure(crate::inbound::http::configure))
}

/// Cookie of a session signed in as `user`.
pub async fn signed_in<S, B>(app: &S, user: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri(&format!("/test/sign-in/{user}"))
        .to_request();
    let response = test::call_service(app, request).await;
    session_cookie(&response)
}
