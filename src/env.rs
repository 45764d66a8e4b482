/// Environment variable names read by [`Config::from_env`].
///
/// These are purely helpers; the resolver itself takes a lookup function
/// so that it stays decoupled from process environment access.
///
/// [`Config::from_env`]: crate::config::Config::from_env

/// Logical service name stamped on every entry.
pub const HOMELAB_SERVICE_ENV: &str = "HOMELAB_SERVICE";

/// Deployment environment, e.g. `production`.
pub const HOMELAB_ENVIRONMENT_ENV: &str = "HOMELAB_ENVIRONMENT";

/// Output target. `stdout` enables pretty detection, anything else forces
/// machine output.
pub const HOMELAB_LOG_TARGET_ENV: &str = "HOMELAB_LOG_TARGET";

/// Minimum level: `debug`, `info`, `warn` (or `warning`), `error`.
pub const HOMELAB_LOG_LEVEL_ENV: &str = "HOMELAB_LOG_LEVEL";

/// `true` forces pretty output even when stdout is not a terminal.
pub const HOMELAB_FORCE_PRETTY_ENV: &str = "HOMELAB_FORCE_PRETTY";

/// Optional explicit version string. Takes precedence over manifest lookup.
pub const HOMELAB_VERSION_ENV: &str = "HOMELAB_VERSION";

pub const DEFAULT_SERVICE: &str = "unknown-service";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_TARGET: &str = "stdout";
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Read an environment variable, treating unset and non-unicode alike.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
