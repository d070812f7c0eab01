//! Server entry point: loads settings, selects adapters, and runs the API.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use orgdesk::domain::InviteServiceConfig;
use orgdesk::inbound::http::health::HealthState;
use orgdesk::inbound::http::session_config::{BuildMode, session_settings_from_env};

use server::{AppSettings, ServerConfig, build_http_state, build_identity, build_storage, create_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| std::io::Error::other(err.to_string()))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let invites = InviteServiceConfig::new(settings.app_base_url().map_err(std::io::Error::other)?);

    let storage = build_storage(&settings).await?;
    let identity = build_identity(&settings)?;
    let http_state = build_http_state(&storage, &identity, invites);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        http_state,
        ServerConfig::new(session, bind_addr),
    )?;
    info!(%bind_addr, "orgdesk listening");

    let result = server.await;
    health_state.mark_unhealthy();
    result
}
