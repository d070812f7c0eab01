//! Shared harness for the HTTP integration suites.
//!
//! Each [`World`] wires the real domain services over a fresh in-memory store
//! and identity provider, with a clock the test can move and a mailer that
//! keeps every invite so tests can read the token from the accept link.

use std::sync::{Arc, Mutex, MutexGuard};

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::{App, test as actix_test, web};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;
use url::Url;

use orgdesk::Trace;
use orgdesk::domain::ports::{InviteEmail, InviteMailer, InviteMailerError};
use orgdesk::domain::{
    AccountService, CampaignService, IdentityLoginService, InviteService, InviteServiceConfig,
    NoteService,
    OrganizationService,
};
use orgdesk::inbound::http::state::{HttpState, HttpStatePorts};
use orgdesk::outbound::identity::InMemoryIdentityProvider;
use orgdesk::outbound::memory::MemoryStore;

const SESSION_COOKIE: &str = "orgdesk_session";
pub const PASSWORD: &str = "correct-horse";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Clock that only moves when told to.
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
            .single()
            .expect("unambiguous start time");
        Self(Mutex::new(start))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *lock(&self.0) += delta;
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Mailer that records instead of sending.
#[derive(Default)]
pub struct RecordingMailer(Mutex<Vec<InviteEmail>>);

impl RecordingMailer {
    pub fn sent(&self) -> Vec<InviteEmail> {
        lock(&self.0).clone()
    }

    /// Token from the most recent invite sent to `to`.
    pub fn token_for(&self, to: &str) -> String {
        lock(&self.0)
            .iter()
            .rev()
            .find(|email| email.to.as_ref() == to)
            .and_then(|email| email.accept_link.rsplit('/').next().map(str::to_owned))
            .unwrap_or_else(|| panic!("no invite sent to {to}"))
    }
}

#[async_trait]
impl InviteMailer for RecordingMailer {
    async fn send_invite_email(&self, email: &InviteEmail) -> Result<(), InviteMailerError> {
        lock(&self.0).push(email.clone());
        Ok(())
    }
}

/// One isolated deployment.
pub struct World {
    pub clock: Arc<TestClock>,
    pub mailer: Arc<RecordingMailer>,
    state: web::Data<HttpState>,
    key: Key,
}

impl World {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let clock = Arc::new(TestClock::new());
        let mailer = Arc::new(RecordingMailer::default());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let base = Url::parse("https://app.example.test").expect("base url");

        let state = HttpState::from(HttpStatePorts {
            login: Arc::new(IdentityLoginService::new(identity.clone())),
            account: Arc::new(AccountService::new(store.clone(), identity.clone())),
            organizations: Arc::new(OrganizationService::new(
                store.clone(),
                identity.clone(),
                dyn_clock.clone(),
            )),
            invites: Arc::new(InviteService::new(
                store.clone(),
                store.clone(),
                identity.clone(),
                mailer.clone(),
                dyn_clock.clone(),
                InviteServiceConfig::new(base),
            )),
            notes: Arc::new(NoteService::new(
                store.clone(),
                store.clone(),
                identity,
                dyn_clock.clone(),
            )),
            campaigns: Arc::new(CampaignService::new(store.clone(), store, dyn_clock)),
        });

        Self {
            clock,
            mailer,
            state: web::Data::new(state),
            key: Key::generate(),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE.to_owned())
            .cookie_secure(false)
            .build();
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session)
                    .configure(orgdesk::inbound::http::configure),
            )
    }
}

/// Decoded response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// Assert `status` and return the body.
    pub fn expect(self, status: StatusCode) -> Value {
        assert_eq!(self.status, status, "unexpected status, body: {}", self.body);
        self.body
    }

    pub fn error_code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

/// A browser-like client that carries the session cookie between calls.
#[derive(Clone, Default)]
pub struct Agent {
    cookie: Option<Cookie<'static>>,
}

impl Agent {
    pub async fn call<S, B>(&mut self, app: &S, method: Method, path: &str, body: Option<Value>) -> Reply
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let mut req = actix_test::TestRequest::default()
            .method(method)
            .uri(&format!("/api/v1{path}"));
        if let Some(cookie) = self.cookie.clone() {
            req = req.cookie(cookie);
        }
        if let Some(body) = body {
            req = req.set_json(body);
        }
        let res = actix_test::call_service(app, req.to_request()).await;
        if let Some(cookie) = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE)
        {
            self.cookie = (!cookie.value().is_empty()).then(|| cookie.into_owned());
        }
        let status = res.status();
        let bytes = actix_test::read_body(res).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        Reply { status, body }
    }

    pub async fn get<S, B>(&mut self, app: &S, path: &str) -> Reply
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.call(app, Method::GET, path, None).await
    }

    pub async fn post<S, B>(&mut self, app: &S, path: &str, body: Value) -> Reply
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        self.call(app, Method::POST, path, Some(body)).await
    }

    /// Sign up a fresh account and keep its session.
    pub async fn sign_up<S, B>(app: &S, email: &str, name: &str) -> (Self, Value)
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let mut agent = Self::default();
        let user = agent
            .post(
                app,
                "/signup",
                serde_json::json!({ "email": email, "password": PASSWORD, "name": name }),
            )
            .await
            .expect(StatusCode::CREATED);
        (agent, user)
    }
}

/// `id` field of a JSON object as a string.
pub fn id_of(body: &Value) -> String {
    body["id"].as_str().expect("id field").to_owned()
}
