use crate::config::Config;
use crate::event_id::EventIdGenerator;
use crate::fields::Fields;
use crate::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Root-level keys that may appear on an entry besides the required ones.
/// The set is closed: any other caller key goes into `context`.
pub const OPTIONAL_ROOT_FIELDS: [&str; 8] = [
    "request_id",
    "user_hash",
    "source",
    "duration_ms",
    "status_code",
    "tags",
    "trace_id",
    "span_id",
];

/// Bindings that feed the required identity fields instead of `context`.
pub const IDENTITY_FIELDS: [&str; 4] = ["service", "environment", "version", "category"];

pub const DEFAULT_CATEGORY: &str = "app";

const CONTEXT: &str = "context";
const EVENT_ID: &str = "event_id";

pub fn is_optional_root_field(key: &str) -> bool {
    OPTIONAL_ROOT_FIELDS.contains(&key)
}

/// One canonical log entry, the only wire artifact.
///
/// Serializes with the required fields first, then the optional root
/// fields in their fixed order, then `context`. Absent optional fields are
/// omitted; no key ever carries `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub service: String,
    pub environment: String,
    pub version: String,
    pub category: String,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_hash: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<Value>,
    pub context: Map<String, Value>,
}

impl LogEntry {
    /// ISO-8601 UTC with microseconds and an explicit `+00:00` offset.
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }

    fn optional_mut(&mut self, key: &str) -> Option<&mut Option<Value>> {
        match key {
            "request_id" => Some(&mut self.request_id),
            "user_hash" => Some(&mut self.user_hash),
            "source" => Some(&mut self.source),
            "duration_ms" => Some(&mut self.duration_ms),
            "status_code" => Some(&mut self.status_code),
            "tags" => Some(&mut self.tags),
            "trace_id" => Some(&mut self.trace_id),
            "span_id" => Some(&mut self.span_id),
            _ => None,
        }
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

/// Assemble the canonical entry for one log call.
///
/// Returns `None` when `level` is below the configured minimum; in that
/// case no event id is consumed. Otherwise:
/// - identity fields come from `bindings`, falling back to `config` (and
///   `"app"` for the category);
/// - each optional root field takes the bound value, then the call value;
///   a call-site `null` removes it;
/// - a bound `context` object and bound keys outside the schema seed
///   `context` (a bound `event_id` is ignored), an explicit `context`
///   object from the call is shallow-merged over them, and every remaining
///   call key is merged last;
/// - `null` values are dropped from `context`;
/// - a string `event_id` call field replaces the generated id; a counter
///   value is consumed either way.
pub fn assemble(
    level: Level,
    message: &str,
    mut call: Fields,
    bindings: &Fields,
    config: &Config,
    ids: &EventIdGenerator,
) -> Option<LogEntry> {
    if !level.passes(config.level) {
        return None;
    }

    let identity = |key: &str, fallback: &str| -> String {
        match bindings.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => fallback.to_string(),
            Some(other) => other.to_string(),
        }
    };

    let generated = ids.next_id();
    let event_id = match call.remove(EVENT_ID) {
        Some(Value::String(id)) => id,
        Some(other) => {
            // not an id; keep it visible as context
            call.insert(EVENT_ID, other);
            generated
        }
        None => generated,
    };

    let mut entry = LogEntry {
        timestamp: Utc::now(),
        level,
        message: message.to_string(),
        service: identity("service", &config.service),
        environment: identity("environment", &config.environment),
        version: identity("version", &config.version),
        category: identity("category", DEFAULT_CATEGORY),
        event_id,
        request_id: None,
        user_hash: None,
        source: None,
        duration_ms: None,
        status_code: None,
        tags: None,
        trace_id: None,
        span_id: None,
        context: Map::new(),
    };

    for key in OPTIONAL_ROOT_FIELDS {
        let bound = bindings.get(key).filter(|v| !v.is_null()).cloned();
        let value = match call.remove(key) {
            Some(Value::Null) => None,
            Some(value) => Some(value),
            None => bound,
        };
        if let Some(slot) = entry.optional_mut(key) {
            *slot = value;
        }
    }

    let mut context = Map::new();
    if let Some(Value::Object(bound)) = bindings.get(CONTEXT) {
        context.extend(bound.clone());
    }
    for (key, value) in bindings.iter() {
        if IDENTITY_FIELDS.contains(&key.as_str())
            || is_optional_root_field(key)
            || key == CONTEXT
            || key == EVENT_ID
        {
            continue;
        }
        context.insert(key.clone(), value.clone());
    }
    if let Some(Value::Object(explicit)) = call.remove(CONTEXT) {
        context.extend(explicit);
    }
    for (key, value) in call {
        context.insert(key, value);
    }
    context.retain(|_, value| !value.is_null());
    entry.context = context;

    Some(entry)
}
