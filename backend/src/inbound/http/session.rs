//! Cookie session access for handlers.
//!
//! The session carries two values: the signed-in user's id and the id of the
//! organization they last switched to. Both are plain strings in the cookie;
//! anything that fails to parse is treated as absent.

use std::str::FromStr;

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, OrganizationId, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ACTIVE_ORG_KEY: &str = "active_org_id";

/// Handler-facing wrapper around the Actix session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap an Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    fn write(&self, key: &str, value: String) -> Result<(), Error> {
        self.0
            .insert(key, value)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    fn read<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self
            .0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                warn!(key, %error, "ignoring malformed session value");
                None
            }
        }))
    }

    /// Start a fresh session for `user_id`.
    ///
    /// The cookie is renewed so a pre-login session id cannot be reused, and
    /// any active organization left over from another user is dropped.
    pub fn sign_in(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0.remove(ACTIVE_ORG_KEY);
        self.write(USER_ID_KEY, user_id.to_string())
    }

    /// Drop everything stored in the session.
    pub fn sign_out(&self) {
        self.0.purge();
    }

    /// Signed-in user, if any.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        self.read(USER_ID_KEY)
    }

    /// Signed-in user or `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Organization pointer last stored by a switch.
    pub fn active_org_id(&self) -> Result<Option<OrganizationId>, Error> {
        self.read(ACTIVE_ORG_KEY)
    }

    /// Point the session at `org_id`.
    pub fn set_active_org_id(&self, org_id: &OrganizationId) -> Result<(), Error> {
        self.write(ACTIVE_ORG_KEY, org_id.to_string())
    }

    /// Forget the organization pointer.
    pub fn clear_active_org_id(&self) {
        self.0.remove(ACTIVE_ORG_KEY);
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    const USER: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const ORG: &str = "7d1a9a52-4c1e-4b8f-9f0e-5d2c8f1b3a44";

    fn fixture_user() -> UserId {
        USER.parse().expect("fixture user id")
    }

    async fn sign_in(session: SessionContext) -> Result<HttpResponse, Error> {
        session.sign_in(&fixture_user())?;
        session.set_active_org_id(&ORG.parse().expect("fixture org id"))?;
        Ok(HttpResponse::Ok().finish())
    }

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let user = session.require_user_id()?;
        let org = session
            .active_org_id()?
            .map_or_else(|| "none".to_owned(), |id| id.to_string());
        Ok(HttpResponse::Ok().body(format!("{user}|{org}")))
    }

    async fn sign_out(session: SessionContext) -> HttpResponse {
        session.sign_out();
        HttpResponse::NoContent().finish()
    }

    #[actix_web::test]
    async fn round_trips_user_and_active_org() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route("/in", web::post().to(sign_in))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::post().uri("/in").to_request()).await;
        let cookie = session_cookie(&res);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, format!("{USER}|{ORG}"));
    }

    #[actix_web::test]
    async fn missing_user_is_unauthorised() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_values_are_ignored() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/tamper",
                    web::post().to(|session: Session| async move {
                        session.insert(USER_ID_KEY, "not-a-uuid").expect("insert");
                        HttpResponse::Ok().finish()
                    }),
                )
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::post().uri("/tamper").to_request()).await;
        let cookie = session_cookie(&res);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn sign_out_clears_the_cookie() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route("/in", web::post().to(sign_in))
                .route("/out", web::post().to(sign_out)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::post().uri("/in").to_request()).await;
        let cookie = session_cookie(&res);
        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/out").cookie(cookie).to_request(),
        )
        .await;

        let removal = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
