use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::error::Error;
use std::fmt::Write as _;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Attribute names that may be copied from an error. Anything else the
/// caller attaches is dropped.
pub const SAFE_ATTRIBUTES: [&str; 6] = ["args", "code", "errno", "message", "filename", "lineno"];

pub const REDACTED: &str = "[REDACTED]";

static SENSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)password|passwd|pwd|token|key|secret|credential|auth|ssn|social_security|credit_card|cc_number|account_number|account_num",
    )
    .expect("sensitive pattern is a valid regex")
});

/// Whether `text` contains any of the sensitive substrings.
pub fn is_sensitive(text: &str) -> bool {
    SENSITIVE.is_match(text)
}

/// Safe, schema-compliant view of an error: `{name, message, stack?, ...}`.
///
/// Only [`SAFE_ATTRIBUTES`] are ever serialized. String attribute values
/// that contain a sensitive substring are replaced with `"[REDACTED]"`.
/// Values nested inside arrays or objects are not inspected, and a secret
/// stored under an allowlisted name with innocuous text passes through.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    name: String,
    message: String,
    stack: Option<String>,
    attributes: Vec<(String, Value)>,
}

impl ErrorReport {
    /// An empty `message` is serialized as `"Error"`.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            attributes: Vec::new(),
        }
    }

    /// Build a report from any error value.
    ///
    /// `name` is the unqualified type name of `E`, `message` its `Display`
    /// output, and `stack` the rendered source chain. A panicking `Display`
    /// is caught and leaves only `{name, message: "Error"}`.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + ?Sized,
    {
        let name = short_type_name(std::any::type_name::<E>());
        let rendered = catch_unwind(AssertUnwindSafe(|| (err.to_string(), render_chain(err))));
        match rendered {
            Ok((message, chain)) => {
                let mut report = Self::new(name, message);
                report.stack = Some(format!("{}: {}{}", report.name, report.display_message(), chain));
                report
            }
            Err(_) => {
                tracing::warn!(error_type = %name, "error introspection panicked");
                Self::new(name, "")
            }
        }
    }

    /// Like [`ErrorReport::from_error`], with `errno` and `code` filled from
    /// the OS error number and the error kind.
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let mut report = Self::from_error(err).with_attribute("code", format!("{:?}", err.kind()));
        if let Some(errno) = err.raw_os_error() {
            report = report.with_attribute("errno", errno);
        }
        report
    }

    /// Replace the stack text. Kept verbatim.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attach an attribute. Names outside [`SAFE_ATTRIBUTES`] are dropped;
    /// sensitive string values are redacted on the way in.
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        if !SAFE_ATTRIBUTES.contains(&name) {
            return self;
        }
        let value = redact(value.into());
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message as the error rendered it, possibly empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn display_message(&self) -> &str {
        if self.message.is_empty() {
            "Error"
        } else {
            &self.message
        }
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "name": self.name, "message": self.display_message() })
        })
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        // an allowlisted `message` attribute takes the slot in place
        match self.attribute("message") {
            Some(value) => map.serialize_entry("message", value)?,
            None => map.serialize_entry("message", self.display_message())?,
        }
        for (key, value) in &self.attributes {
            if key != "message" {
                map.serialize_entry(key, value)?;
            }
        }
        if let Some(stack) = &self.stack {
            map.serialize_entry("stack", stack)?;
        }
        map.end()
    }
}

impl From<&std::io::Error> for ErrorReport {
    fn from(err: &std::io::Error) -> Self {
        Self::from_io_error(err)
    }
}

impl From<&(dyn Error + 'static)> for ErrorReport {
    fn from(err: &(dyn Error + 'static)) -> Self {
        Self::from_error(err)
    }
}

impl From<&(dyn Error + Send + Sync + 'static)> for ErrorReport {
    fn from(err: &(dyn Error + Send + Sync + 'static)) -> Self {
        Self::from_error(err)
    }
}

fn redact(value: Value) -> Value {
    match value {
        Value::String(s) if is_sensitive(&s) => Value::String(REDACTED.to_string()),
        other => other,
    }
}

fn render_chain<E: Error + ?Sized>(err: &E) -> String {
    let mut out = String::new();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\nCaused by: {cause}");
        source = cause.source();
    }
    out
}

/// `core::num::error::ParseIntError` -> `ParseIntError`,
/// `dyn core::error::Error + Send` -> `Error`.
fn short_type_name(full: &str) -> String {
    let base = full
        .trim_start_matches("dyn ")
        .split(['<', ' '])
        .next()
        .unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
