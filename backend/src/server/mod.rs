//! HTTP server assembly: session cookie, API scope, health checks and docs.

mod config;
mod state_builders;

pub use config::{AppSettings, ServerConfig};
pub(crate) use state_builders::{build_http_state, build_identity, build_storage};

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite, time::Duration};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use orgdesk::Trace;
use orgdesk::inbound::http::health::{HealthState, live, ready};
use orgdesk::inbound::http::state::HttpState;

const SESSION_COOKIE: &str = "orgdesk_session";
const SESSION_TTL: Duration = Duration::hours(12);

/// Cookie policy shared by every worker.
#[derive(Clone)]
struct SessionCookie {
    key: Key,
    secure: bool,
    same_site: SameSite,
}

impl SessionCookie {
    /// Encrypted, HTTP-only cookie that outlives the browser session.
    fn into_middleware(self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key)
            .cookie_name(SESSION_COOKIE.to_owned())
            .cookie_path("/".to_owned())
            .cookie_http_only(true)
            .cookie_secure(self.secure)
            .cookie_same_site(self.same_site)
            .cookie_content_security(CookieContentSecurity::Private)
            .session_lifecycle(PersistentSession::default().session_ttl(SESSION_TTL))
            .build()
    }
}

fn build_app(
    health: web::Data<HealthState>,
    state: web::Data<HttpState>,
    cookie: SessionCookie,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health)
        .app_data(state)
        .wrap(Trace)
        .service(ready)
        .service(live)
        .service(
            web::scope("/api/v1")
                .wrap(cookie.into_middleware())
                .configure(orgdesk::inbound::http::configure),
        );

    #[cfg(debug_assertions)]
    let app = {
        use utoipa::OpenApi;
        app.service(
            utoipa_swagger_ui::SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", orgdesk::ApiDoc::openapi()),
        )
    };

    app
}

/// Bind the listener and return the running server.
///
/// Readiness flips to true once the socket is bound; the caller flips
/// liveness off after the server future resolves.
///
/// # Errors
///
/// Fails when the address cannot be bound.
pub fn create_server(
    health: web::Data<HealthState>,
    state: web::Data<HttpState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
    } = config;
    let cookie = SessionCookie {
        key,
        secure: cookie_secure,
        same_site,
    };

    let checks = health.clone();
    let server = HttpServer::new(move || build_app(checks.clone(), state.clone(), cookie.clone()))
        .bind(bind_addr)?
        .run();

    health.mark_ready();
    Ok(server)
}
