use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Severity of a log call.
///
/// Ordering follows the numeric weights shared by every implementation of
/// the schema: debug=10, info=20, warn=30, error=40.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub const fn weight(self) -> u8 {
        match self {
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warn => 30,
            Level::Error => 40,
        }
    }

    /// Wire name as it appears in the `level` field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Whether a call at `self` passes a threshold of `min`.
    pub fn passes(self, min: Level) -> bool {
        self.weight() >= min.weight()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Case-insensitive; `warning` is accepted as an alias of `warn`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_ordered() {
        assert_eq!(Level::Debug.weight(), 10);
        assert_eq!(Level::Info.weight(), 20);
        assert_eq!(Level::Warn.weight(), 30);
        assert_eq!(Level::Error.weight(), 40);
        assert!(Level::Debug < Level::Error);
    }

    #[test]
    fn parses_aliases_and_case() {
        assert_eq!("WARNING".parse::<Level>(), Ok(Level::Warn));
        assert_eq!(" Debug ".parse::<Level>(), Ok(Level::Debug));
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn default_is_info() {
        assert_eq!(Level::default(), Level::Info);
    }

    #[test]
    fn threshold_check() {
        assert!(!Level::Debug.passes(Level::Info));
        assert!(Level::Info.passes(Level::Info));
        assert!(Level::Error.passes(Level::Warn));
    }
}
