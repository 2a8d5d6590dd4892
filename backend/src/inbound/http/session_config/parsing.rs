//! Value parsers for `SESSION_*` variables.

use actix_web::cookie::SameSite;
use tracing::warn;

use super::{BuildMode, SAMESITE_ENV, SessionConfigError, SessionEnv};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Name and debug-mode fallback of a boolean toggle.
pub(super) struct BoolEnvConfig {
    name: &'static str,
    fallback: bool,
}

impl BoolEnvConfig {
    pub(super) const fn new(name: &'static str, fallback: bool) -> Self {
        Self { name, fallback }
    }
}

/// Read a boolean toggle and pass it through `check`.
///
/// Missing or unparsable values fall back in debug builds and fail in
/// release builds.
pub(super) fn parse_bool_env<E, F>(
    env: &E,
    mode: BuildMode,
    config: BoolEnvConfig,
    check: F,
) -> Result<bool, SessionConfigError>
where
    E: SessionEnv,
    F: FnOnce(bool, BuildMode) -> Result<bool, SessionConfigError>,
{
    let BoolEnvConfig { name, fallback } = config;
    let Some(raw) = env.string(name) else {
        return debug_warn_or_error(
            mode,
            fallback,
            SessionConfigError::MissingEnv { name },
            || warn!(fallback, "{name} not set; using fallback"),
        );
    };
    if let Some(flag) = parse_bool(&raw) {
        return check(flag, mode);
    }
    debug_warn_or_error(
        mode,
        fallback,
        SessionConfigError::InvalidEnv {
            name,
            value: raw.clone(),
            expected: BOOL_EXPECTED,
        },
        || warn!(value = %raw, fallback, "invalid {name}; using fallback"),
    )
}

/// Return `fallback` after warning in debug builds, otherwise `error`.
pub(super) fn debug_warn_or_error<T>(
    mode: BuildMode,
    fallback: T,
    error: SessionConfigError,
    warn_fn: impl FnOnce(),
) -> Result<T, SessionConfigError> {
    if mode.is_debug() {
        warn_fn();
        Ok(fallback)
    } else {
        Err(error)
    }
}

pub(super) fn parse_same_site_value(
    value: String,
    mode: BuildMode,
    cookie_secure: bool,
    fallback: SameSite,
) -> Result<SameSite, SessionConfigError> {
    if value.eq_ignore_ascii_case("lax") {
        return Ok(SameSite::Lax);
    }
    if value.eq_ignore_ascii_case("strict") {
        return Ok(SameSite::Strict);
    }
    if value.eq_ignore_ascii_case("none") {
        if !cookie_secure {
            debug_warn_or_error(mode, (), SessionConfigError::InsecureSameSiteNone, || {
                warn!("SESSION_SAMESITE=None without a secure cookie; browsers may drop it");
            })?;
        }
        return Ok(SameSite::None);
    }
    let message_value = value.clone();
    debug_warn_or_error(
        mode,
        fallback,
        SessionConfigError::InvalidEnv {
            name: SAMESITE_ENV,
            value,
            expected: SAMESITE_EXPECTED,
        },
        || warn!(value = %message_value, "invalid SESSION_SAMESITE; using default"),
    )
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
