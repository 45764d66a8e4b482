use crate::env::{
    env_var, DEFAULT_ENVIRONMENT, DEFAULT_SERVICE, DEFAULT_TARGET, DEFAULT_VERSION,
    HOMELAB_ENVIRONMENT_ENV, HOMELAB_FORCE_PRETTY_ENV, HOMELAB_LOG_LEVEL_ENV,
    HOMELAB_LOG_TARGET_ENV, HOMELAB_SERVICE_ENV, HOMELAB_VERSION_ENV,
};
use crate::level::Level;
use std::io::IsTerminal;
use std::path::Path;

/// Process-wide logger settings, resolved once.
///
/// **Fields**
/// - `service`, `environment`, `version`: identity stamped on every entry
///   unless a binding overrides it.
/// - `target`: lower-cased output target; only `stdout` allows pretty output.
/// - `level`: minimum level; calls below it are dropped before any work.
/// - `force_pretty`: pretty output even when stdout is not a terminal.
/// - `pretty_enabled`: derived, see [`Config::resolve`].
/// - `colorize`: derived, ANSI colors only when writing to a terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub service: String,
    pub environment: String,
    pub version: String,
    pub target: String,
    pub level: Level,
    pub force_pretty: bool,
    pub pretty_enabled: bool,
    pub colorize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            version: DEFAULT_VERSION.to_string(),
            target: DEFAULT_TARGET.to_string(),
            level: Level::Info,
            force_pretty: false,
            pretty_enabled: false,
            colorize: false,
        }
    }
}

impl Config {
    /// Resolve from the process environment and the interactivity of stdout.
    pub fn from_env() -> Self {
        Self::resolve(env_var, std::io::stdout().is_terminal())
    }

    /// Resolve settings from a variable lookup.
    ///
    /// Never fails: every missing or unparsable value falls back to its
    /// default. `pretty_enabled` is `target == "stdout" && (force_pretty ||
    /// interactive)`; `colorize` additionally requires `interactive`.
    pub fn resolve<F>(lookup: F, interactive: bool) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let service = lookup(HOMELAB_SERVICE_ENV).unwrap_or_else(|| DEFAULT_SERVICE.to_string());
        let environment =
            lookup(HOMELAB_ENVIRONMENT_ENV).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let target = lookup(HOMELAB_LOG_TARGET_ENV)
            .unwrap_or_else(|| DEFAULT_TARGET.to_string())
            .to_lowercase();
        let level = lookup(HOMELAB_LOG_LEVEL_ENV)
            .and_then(|raw| raw.parse::<Level>().ok())
            .unwrap_or_default();
        let force_pretty = lookup(HOMELAB_FORCE_PRETTY_ENV)
            .map(|raw| raw.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let version = lookup(HOMELAB_VERSION_ENV)
            .filter(|v| !v.is_empty())
            .or_else(manifest_version)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let pretty_enabled = target == "stdout" && (force_pretty || interactive);
        let colorize = pretty_enabled && interactive;

        Self {
            service,
            environment,
            version,
            target,
            level,
            force_pretty,
            pretty_enabled,
            colorize,
        }
    }
}

const CARGO_VERSION_KEYS: &[&[&str]] = &[&["package", "version"]];
const PYPROJECT_VERSION_KEYS: &[&[&str]] = &[&["project", "version"], &["tool", "poetry", "version"]];

/// Version declared by a project manifest in the working directory.
///
/// Looks at `Cargo.toml` (`package.version`) first, then `pyproject.toml`
/// (`project.version` or `tool.poetry.version`). Any read or parse failure
/// yields `None`.
fn manifest_version() -> Option<String> {
    let cwd = std::env::current_dir().ok()?;
    version_in(&cwd.join("Cargo.toml"), CARGO_VERSION_KEYS)
        .or_else(|| version_in(&cwd.join("pyproject.toml"), PYPROJECT_VERSION_KEYS))
}

fn version_in(path: &Path, candidates: &[&[&str]]) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let doc: toml::Table = text.parse().ok()?;
    candidates.iter().find_map(|keys| {
        let (last, parents) = keys.split_last()?;
        let mut table = &doc;
        for key in parents {
            table = table.get(*key)?.as_table()?;
        }
        table.get(*last)?.as_str().map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = Config::resolve(lookup(&[(HOMELAB_VERSION_ENV, "1.2.3")]), false);
        assert_eq!(config.service, "unknown-service");
        assert_eq!(config.environment, "development");
        assert_eq!(config.target, "stdout");
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.version, "1.2.3");
        assert!(!config.pretty_enabled);
        assert!(!config.colorize);
    }

    #[test]
    fn unknown_level_means_info() {
        let config = Config::resolve(lookup(&[(HOMELAB_LOG_LEVEL_ENV, "chatty")]), false);
        assert_eq!(config.level, Level::Info);

        let config = Config::resolve(lookup(&[(HOMELAB_LOG_LEVEL_ENV, "WARNING")]), false);
        assert_eq!(config.level, Level::Warn);
    }

    #[test]
    fn pretty_requires_stdout_target() {
        let env = [(HOMELAB_LOG_TARGET_ENV, "vector"), (HOMELAB_FORCE_PRETTY_ENV, "true")];
        let config = Config::resolve(lookup(&env), true);
        assert_eq!(config.target, "vector");
        assert!(!config.pretty_enabled);
        assert!(!config.colorize);
    }

    #[test]
    fn force_pretty_off_terminal_has_no_color() {
        let env = [(HOMELAB_LOG_TARGET_ENV, "STDOUT"), (HOMELAB_FORCE_PRETTY_ENV, "True")];
        let config = Config::resolve(lookup(&env), false);
        assert!(config.force_pretty);
        assert!(config.pretty_enabled);
        assert!(!config.colorize);
    }

    #[test]
    fn interactive_stdout_is_pretty_and_colored() {
        let config = Config::resolve(lookup(&[]), true);
        assert!(config.pretty_enabled);
        assert!(config.colorize);
    }

    #[test]
    fn reads_version_from_cargo_manifest() {
        let dir = std::env::temp_dir().join(format!("homelab-log-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Cargo.toml");
        std::fs::write(&path, "[package]\nname = \"x\"\nversion = \"4.5.6\"\n").unwrap();
        assert_eq!(
            version_in(&path, CARGO_VERSION_KEYS),
            Some("4.5.6".to_string())
        );
        assert_eq!(version_in(&dir.join("missing.toml"), CARGO_VERSION_KEYS), None);

        let py = dir.join("pyproject.toml");
        std::fs::write(&py, "[tool.poetry]\nversion = \"0.9.1\"\n").unwrap();
        assert_eq!(version_in(&py, PYPROJECT_VERSION_KEYS), Some("0.9.1".to_string()));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
