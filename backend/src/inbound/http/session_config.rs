//! Session cookie settings read from the environment.
//!
//! Debug builds fall back to permissive defaults and log a warning for every
//! missing or malformed toggle. Release builds refuse to start instead, so a
//! production deployment always states its cookie policy explicitly.
//!
//! | Variable                  | Meaning                                   |
//! |---------------------------|-------------------------------------------|
//! | `SESSION_KEY_FILE`        | Path to the signing key (>= 64 bytes)     |
//! | `SESSION_COOKIE_SECURE`   | Mark the cookie `Secure`                  |
//! | `SESSION_SAMESITE`        | `Strict`, `Lax`, or `None`                |
//! | `SESSION_ALLOW_EPHEMERAL` | Generate a throwaway key when none exists |

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const DEFAULT_KEY_PATH: &str = "/var/run/secrets/orgdesk_session_key";
const MIN_KEY_LEN: usize = 64;

/// Which rule set applies when validating toggles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Defaults with warnings.
    Debug,
    /// Every toggle must be present and valid.
    Release,
}

impl BuildMode {
    /// Mode matching `cfg!(debug_assertions)`.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Validated cookie session settings.
pub struct SessionSettings {
    /// Signing and encryption key.
    pub key: Key,
    /// Whether the cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// `SameSite` policy of the cookie.
    pub same_site: SameSite,
}

/// Reasons session settings could not be built.
#[derive(Debug, thiserror::Error)]
pub enum SessionConfigError {
    /// A required variable is unset.
    #[error("missing required environment variable: {name}")]
    Missing { name: &'static str },
    /// A variable holds an unusable value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The key file could not be read.
    #[error("failed to read session key at {path}: {source}")]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file is shorter than the minimum.
    #[error("session key at {path} too short: need >= {MIN_KEY_LEN} bytes, got {length}")]
    KeyTooShort { path: PathBuf, length: usize },
    /// `SameSite=None` without the secure flag.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    SameSiteNoneWithoutSecure,
    /// Ephemeral keys requested in a release build.
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralInRelease,
}

/// Build session settings from `env`.
///
/// # Errors
///
/// Release builds fail on any missing or malformed toggle and on unreadable
/// or short keys. Debug builds always succeed.
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = flag(env, mode, COOKIE_SECURE_ENV, true)?;
    let same_site = same_site(env, mode, cookie_secure)?;
    let allow_ephemeral = flag(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralInRelease);
    }
    let key = signing_key(env, mode, allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Debug builds log `problem` and carry on with `fallback`.
fn tolerate<T>(mode: BuildMode, fallback: T, problem: SessionConfigError) -> Result<T, SessionConfigError> {
    match mode {
        BuildMode::Debug => {
            warn!(%problem, "session setting defaulted");
            Ok(fallback)
        }
        BuildMode::Release => Err(problem),
    }
}

fn flag<E: Env>(env: &E, mode: BuildMode, name: &'static str, fallback: bool) -> Result<bool, SessionConfigError> {
    let Some(raw) = env.string(name) else {
        return tolerate(mode, fallback, SessionConfigError::Missing { name });
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => tolerate(
            mode,
            fallback,
            SessionConfigError::Invalid {
                name,
                value: raw,
                expected: "1|0|true|false|yes|no|on|off",
            },
        ),
    }
}

fn same_site<E: Env>(env: &E, mode: BuildMode, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
    let fallback = match mode {
        BuildMode::Debug => SameSite::Lax,
        BuildMode::Release => SameSite::Strict,
    };
    let Some(raw) = env.string(SAMESITE_ENV) else {
        return tolerate(mode, fallback, SessionConfigError::Missing { name: SAMESITE_ENV });
    };
    let parsed = match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "lax" => SameSite::Lax,
        "none" => SameSite::None,
        _ => {
            return tolerate(
                mode,
                fallback,
                SessionConfigError::Invalid {
                    name: SAMESITE_ENV,
                    value: raw,
                    expected: "Strict|Lax|None",
                },
            );
        }
    };
    if parsed == SameSite::None && !cookie_secure {
        // Browsers drop these cookies; debug builds still allow it for local tooling.
        return tolerate(mode, SameSite::None, SessionConfigError::SameSiteNoneWithoutSecure);
    }
    Ok(parsed)
}

fn signing_key<E: Env>(env: &E, mode: BuildMode, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| DEFAULT_KEY_PATH.to_owned()),
    );
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(source) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(path = %path.display(), error = %source, "using a generated session key (dev only)");
            return Ok(Key::generate());
        }
        Err(source) => return Err(SessionConfigError::KeyUnreadable { path, source }),
    };
    if mode == BuildMode::Release && bytes.len() < MIN_KEY_LEN {
        return Err(SessionConfigError::KeyTooShort {
            path,
            length: bytes.len(),
        });
    }
    Ok(Key::derive_from(&bytes))
}
