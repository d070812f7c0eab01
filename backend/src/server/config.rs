//! Application settings and the assembled server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use orgdesk::inbound::http::session_config::SessionSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 10;

/// Settings loaded from `ORGDESK_*` environment variables, CLI flags, or a
/// config file via OrthoConfig.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ORGDESK")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without it the in-memory store is used.
    pub database_url: Option<String>,
    /// Database pool cap.
    pub pool_max_size: Option<u32>,
    /// Skip embedded migrations at startup.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
    /// Base URL of the web app, used to build invite links.
    pub app_base_url: Option<String>,
    /// Auth service base URL. Without it the in-memory provider is used.
    pub identity_url: Option<String>,
    /// Auth service public key.
    pub identity_anon_key: Option<String>,
    /// Auth service admin key.
    pub identity_service_key: Option<String>,
    /// Auth service request timeout in seconds.
    pub identity_timeout_secs: Option<u64>,
}

/// Settings that failed to parse.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Bind address is not `host:port`.
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// A URL setting did not parse.
    #[error("invalid URL for {name}: {source}")]
    Url {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    /// Auth service URL given without its keys.
    #[error("{name} is required when ORGDESK_IDENTITY_URL is set")]
    MissingIdentityKey { name: &'static str },
}

/// Connection details for the external auth service.
pub struct IdentitySettings {
    /// Base URL of the auth service.
    pub url: Url,
    /// Public key sent with user-facing calls.
    pub anon_key: Zeroizing<String>,
    /// Admin key for user management calls.
    pub service_key: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl AppSettings {
    /// Listening address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// [`SettingsError::BindAddr`] when the value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Database pool cap, defaulting to ten connections.
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// Web app base URL for invite links.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Url`] when the value does not parse.
    pub fn app_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.app_base_url.as_deref().unwrap_or(DEFAULT_APP_BASE_URL);
        Url::parse(raw).map_err(|source| SettingsError::Url {
            name: "ORGDESK_APP_BASE_URL",
            source,
        })
    }

    /// Auth service settings, or `None` to use the in-memory provider.
    ///
    /// # Errors
    ///
    /// A bad URL, or a URL without both API keys.
    pub fn identity(&self) -> Result<Option<IdentitySettings>, SettingsError> {
        let Some(raw) = self.identity_url.as_deref() else {
            return Ok(None);
        };
        let url = Url::parse(raw).map_err(|source| SettingsError::Url {
            name: "ORGDESK_IDENTITY_URL",
            source,
        })?;
        let anon_key = self
            .identity_anon_key
            .clone()
            .ok_or(SettingsError::MissingIdentityKey {
                name: "ORGDESK_IDENTITY_ANON_KEY",
            })?;
        let service_key =
            self.identity_service_key
                .clone()
                .ok_or(SettingsError::MissingIdentityKey {
                    name: "ORGDESK_IDENTITY_SERVICE_KEY",
                })?;
        Ok(Some(IdentitySettings {
            url,
            anon_key: Zeroizing::new(anon_key),
            service_key: Zeroizing::new(service_key),
            timeout: Duration::from_secs(
                self.identity_timeout_secs
                    .unwrap_or(DEFAULT_IDENTITY_TIMEOUT_SECS),
            ),
        }))
    }
}

/// Everything [`super::create_server`] needs, resolved from settings.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Combine cookie settings with the listening address.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            key: session.key,
            cookie_secure: session.cookie_secure,
            same_site: session.same_site,
            bind_addr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "ORGDESK_BIND_ADDR",
        "ORGDESK_DATABASE_URL",
        "ORGDESK_APP_BASE_URL",
        "ORGDESK_IDENTITY_URL",
        "ORGDESK_IDENTITY_ANON_KEY",
        "ORGDESK_IDENTITY_SERVICE_KEY",
    ];

    fn load() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("orgdesk")]).expect("settings should load")
    }

    #[rstest]
    fn defaults_select_in_memory_adapters() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load();

        assert_eq!(
            settings.bind_addr().expect("default addr"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.database_url.is_none());
        assert!(settings.identity().expect("no identity").is_none());
        assert_eq!(settings.pool_max_size(), DEFAULT_POOL_SIZE);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("ORGDESK_BIND_ADDR", Some("127.0.0.1:9000")),
            ("ORGDESK_DATABASE_URL", Some("postgres://localhost/orgdesk")),
            ("ORGDESK_APP_BASE_URL", Some("https://app.example.com")),
            ("ORGDESK_IDENTITY_URL", Some("https://auth.example.com")),
            ("ORGDESK_IDENTITY_ANON_KEY", Some("anon")),
            ("ORGDESK_IDENTITY_SERVICE_KEY", Some("service")),
        ]);

        let settings = load();

        assert_eq!(settings.bind_addr().expect("addr").port(), 9000);
        assert_eq!(settings.database_url.as_deref(), Some("postgres://localhost/orgdesk"));
        assert_eq!(
            settings.app_base_url().expect("url").as_str(),
            "https://app.example.com/"
        );
        let identity = settings.identity().expect("valid identity").expect("configured");
        assert_eq!(identity.url.host_str(), Some("auth.example.com"));
        assert_eq!(identity.service_key.as_str(), "service");
    }

    #[rstest]
    fn identity_url_without_keys_is_rejected() {
        let _guard = lock_env([
            ("ORGDESK_IDENTITY_URL", Some("https://auth.example.com")),
            ("ORGDESK_IDENTITY_ANON_KEY", None),
            ("ORGDESK_IDENTITY_SERVICE_KEY", None),
        ]);

        let err = load().identity().err().expect("missing keys");

        assert!(matches!(err, SettingsError::MissingIdentityKey { .. }));
    }
}
