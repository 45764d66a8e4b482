use crate::config::Config;
use crate::error_report::ErrorReport;
use crate::event_id::EventIdGenerator;
use crate::fields::Fields;
use crate::level::Level;
use crate::record::{self, LogEntry, DEFAULT_CATEGORY};
use crate::render::{MachineRenderer, PrettyRenderer, Render};
use crate::sink::{LogSink, StdoutSink};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Error returned by every `log*` call that passed the level filter.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to render log entry: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Clone)]
enum EventIds {
    Global,
    Owned(Arc<EventIdGenerator>),
}

impl EventIds {
    fn get(&self) -> &EventIdGenerator {
        match self {
            EventIds::Global => EventIdGenerator::global(),
            EventIds::Owned(ids) => ids,
        }
    }
}

/// Structured logger: an immutable binding set plus shared output plumbing.
///
/// Every derivation (`bind`, `with_category`, ...) returns a new logger and
/// leaves `self` untouched. Clones are cheap and share the renderer, sink
/// and event id source, so a logger can be handed to any thread.
#[derive(Clone)]
pub struct Logger {
    config: Arc<Config>,
    bindings: Arc<Fields>,
    renderer: Arc<dyn Render>,
    sink: Arc<dyn LogSink>,
    ids: EventIds,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

/// Configures how a root [`Logger`] renders and where it writes.
///
/// By default output goes to stdout, the renderer follows
/// `config.pretty_enabled` / `config.colorize`, ids come from the
/// process-wide generator and the bindings carry the config identity
/// with category `"app"`.
pub struct LoggerBuilder {
    config: Config,
    bindings: Option<Fields>,
    sink: Option<Arc<dyn LogSink>>,
    pretty: Option<bool>,
    colorize: Option<bool>,
    ids: Option<Arc<EventIdGenerator>>,
}

impl LoggerBuilder {
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn shared_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = Some(pretty);
        self
    }

    pub fn colorize(mut self, colorize: bool) -> Self {
        self.colorize = Some(colorize);
        self
    }

    /// Use a private id generator instead of the process-wide one.
    pub fn event_ids(mut self, ids: Arc<EventIdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Replace the initial bindings entirely.
    pub fn bindings(mut self, bindings: Fields) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn build(self) -> Logger {
        let pretty = self.pretty.unwrap_or(self.config.pretty_enabled);
        let renderer: Arc<dyn Render> = if pretty {
            Arc::new(PrettyRenderer::new(self.colorize.unwrap_or(self.config.colorize)))
        } else {
            Arc::new(MachineRenderer)
        };
        let bindings = self.bindings.unwrap_or_else(|| {
            Fields::new()
                .with("service", self.config.service.clone())
                .with("environment", self.config.environment.clone())
                .with("version", self.config.version.clone())
                .with("category", DEFAULT_CATEGORY)
        });

        Logger {
            config: Arc::new(self.config),
            bindings: Arc::new(bindings),
            renderer,
            sink: self.sink.unwrap_or_else(|| Arc::new(StdoutSink)),
            ids: self.ids.map(EventIds::Owned).unwrap_or(EventIds::Global),
        }
    }
}

impl Logger {
    /// Root logger for `config` with default output plumbing.
    pub fn new(config: Config) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> LoggerBuilder {
        LoggerBuilder {
            config,
            bindings: None,
            sink: None,
            pretty: None,
            colorize: None,
            ids: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bindings(&self) -> &Fields {
        &self.bindings
    }

    pub fn enabled(&self, level: Level) -> bool {
        level.passes(self.config.level)
    }

    // ------------------------------------------------------------------
    // derivation
    // ------------------------------------------------------------------

    /// Child logger whose bindings are `self`'s overridden by `fields`.
    /// A `null` value removes that key from the child.
    pub fn bind(&self, fields: Fields) -> Logger {
        Logger {
            bindings: Arc::new(self.bindings.merged(fields)),
            ..self.clone()
        }
    }

    pub fn with_category(&self, category: &str) -> Logger {
        self.bind(Fields::new().with("category", category))
    }

    /// Bind a trace id and, when given, a span id. A `None` span keeps
    /// whatever span the parent carries.
    pub fn bind_trace(&self, trace_id: &str, span_id: Option<&str>) -> Logger {
        let mut fields = Fields::new().with("trace_id", trace_id);
        if let Some(span_id) = span_id {
            fields.insert("span_id", span_id);
        }
        self.bind(fields)
    }

    /// Bind a request id and, when given, a user hash.
    pub fn with_request(&self, request_id: &str, user_hash: Option<&str>) -> Logger {
        let mut fields = Fields::new().with("request_id", request_id);
        if let Some(user_hash) = user_hash {
            fields.insert("user_hash", user_hash);
        }
        self.bind(fields)
    }

    /// Child carrying a full identity; each `None` falls back to the
    /// configured value (`"app"` for the category).
    pub fn create_logger(
        &self,
        service: Option<&str>,
        environment: Option<&str>,
        version: Option<&str>,
        category: Option<&str>,
    ) -> Logger {
        let config = &self.config;
        self.bind(
            Fields::new()
                .with("service", service.unwrap_or(config.service.as_str()))
                .with("environment", environment.unwrap_or(config.environment.as_str()))
                .with("version", version.unwrap_or(config.version.as_str()))
                .with("category", category.unwrap_or(DEFAULT_CATEGORY)),
        )
    }

    // ------------------------------------------------------------------
    // logging
    // ------------------------------------------------------------------

    /// Assemble the entry a call would produce, without writing it.
    /// `None` when `level` is filtered out.
    pub fn entry(&self, level: Level, message: impl fmt::Display, fields: Fields) -> Option<LogEntry> {
        if !self.enabled(level) {
            return None;
        }
        record::assemble(
            level,
            &message.to_string(),
            fields,
            &self.bindings,
            &self.config,
            self.ids.get(),
        )
    }

    /// Write one entry. Filtered calls return `Ok(())` without touching
    /// the sink or the id counter; write failures are returned as-is.
    pub fn log(&self, level: Level, message: impl fmt::Display, fields: Fields) -> Result<(), LogError> {
        match self.entry(level, message, fields) {
            Some(entry) => self.emit(&entry),
            None => Ok(()),
        }
    }

    pub fn emit(&self, entry: &LogEntry) -> Result<(), LogError> {
        let line = self.renderer.render(entry)?;
        self.sink.write_line(&line)?;
        Ok(())
    }

    pub fn debug(&self, message: impl fmt::Display, fields: Fields) -> Result<(), LogError> {
        self.log(Level::Debug, message, fields)
    }

    pub fn info(&self, message: impl fmt::Display, fields: Fields) -> Result<(), LogError> {
        self.log(Level::Info, message, fields)
    }

    pub fn warn(&self, message: impl fmt::Display, fields: Fields) -> Result<(), LogError> {
        self.log(Level::Warn, message, fields)
    }

    pub fn error(&self, message: impl fmt::Display, fields: Fields) -> Result<(), LogError> {
        self.log(Level::Error, message, fields)
    }

    // ------------------------------------------------------------------
    // convenience shapes
    // ------------------------------------------------------------------

    /// Error-level entry for `error`.
    ///
    /// Every helper field is merged into `context` (an explicit `context`
    /// object first), the serialized report goes to `context.err`, and
    /// `context.error_type` / `context.error_message` are filled unless
    /// `fields` set them. The message is the error's own, or
    /// `"Error occurred"` when empty.
    pub fn log_error(&self, error: &ErrorReport, mut fields: Fields) -> Result<(), LogError> {
        if !self.enabled(Level::Error) {
            return Ok(());
        }
        let message = match error.message() {
            "" => "Error occurred".to_string(),
            text => text.to_string(),
        };
        let mut context = match fields.remove("context") {
            Some(Value::Object(explicit)) => explicit,
            _ => Map::new(),
        };
        context.extend(fields);
        context.insert("err".to_string(), error.to_value());
        context
            .entry("error_type")
            .or_insert_with(|| Value::String(error.name().to_string()));
        context
            .entry("error_message")
            .or_insert_with(|| Value::String(message.clone()));
        self.log(Level::Error, message, Fields::new().with("context", context))
    }

    /// Info-level `"HTTP Request"` entry with `context.method`,
    /// `context.url`, `context.userAgent` when given, and every helper
    /// field in `context`.
    ///
    /// `request_id` is always passed at the root: `None` clears a bound one.
    pub fn log_request(
        &self,
        method: &str,
        url: &str,
        request_id: Option<&str>,
        user_agent: Option<&str>,
        fields: Fields,
    ) -> Result<(), LogError> {
        let mut context = Map::new();
        context.insert("method".to_string(), method.into());
        context.insert("url".to_string(), url.into());
        if let Some(user_agent) = user_agent.filter(|ua| !ua.is_empty()) {
            context.insert("userAgent".to_string(), user_agent.into());
        }
        context.extend(fields);
        let call = Fields::new()
            .with("request_id", request_id.map_or(Value::Null, Value::from))
            .with("context", context);
        self.info("HTTP Request", call)
    }

    /// Info-level `"HTTP Response"` entry with root `status_code` and
    /// `duration_ms`; `request_id` behaves as in [`Logger::log_request`].
    pub fn log_response(
        &self,
        method: &str,
        url: &str,
        status_code: u16,
        duration_ms: u64,
        request_id: Option<&str>,
        fields: Fields,
    ) -> Result<(), LogError> {
        let mut context = Map::new();
        context.insert("method".to_string(), method.into());
        context.insert("url".to_string(), url.into());
        context.extend(fields);
        let call = Fields::new()
            .with("request_id", request_id.map_or(Value::Null, Value::from))
            .with("status_code", status_code)
            .with("duration_ms", duration_ms)
            .with("context", context);
        self.info("HTTP Response", call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::sink::MemorySink;
    use serde_json::json;

    fn capture(level: Level) -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        let config = Config {
            service: "test-service".into(),
            environment: "test".into(),
            version: "1.0.0".into(),
            level,
            ..Config::default()
        };
        let logger = Logger::builder(config)
            .sink(sink.clone())
            .pretty(false)
            .event_ids(Arc::new(EventIdGenerator::new()))
            .build();
        (logger, sink)
    }

    fn parsed(sink: &MemorySink) -> Vec<Value> {
        sink.lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn bind_is_pure() {
        let (root, _) = capture(Level::Info);
        let child = root.bind(fields!("host": "nas"));
        assert!(!root.bindings().contains_key("host"));
        assert_eq!(child.bindings().get("host"), Some(&json!("nas")));
    }

    #[test]
    fn null_binding_unsets_parent_value() {
        let (root, sink) = capture(Level::Info);
        let traced = root.bind_trace("trace-1", Some("span-1"));
        let cleared = traced.bind(fields!("span_id": null));
        assert!(!cleared.bindings().contains_key("span_id"));
        cleared.info("x", Fields::new()).unwrap();
        let entry = &parsed(&sink)[0];
        assert_eq!(entry["trace_id"], json!("trace-1"));
        assert!(entry.get("span_id").is_none());
    }

    #[test]
    fn bind_trace_without_span_keeps_parent_span() {
        let (root, _) = capture(Level::Info);
        let child = root.bind_trace("t1", Some("s1")).bind_trace("t2", None);
        assert_eq!(child.bindings().get("trace_id"), Some(&json!("t2")));
        assert_eq!(child.bindings().get("span_id"), Some(&json!("s1")));
    }

    #[test]
    fn log_error_shapes_context() {
        let (logger, sink) = capture(Level::Info);
        let report = ErrorReport::new("TimeoutError", "ssh timed out").with_attribute("code", 110);
        logger
            .log_error(
                &report,
                fields!("host": "pve-2", "request_id": "req-9", "context": {"attempt": 3}),
            )
            .unwrap();
        let entry = &parsed(&sink)[0];
        assert_eq!(entry["level"], json!("error"));
        assert_eq!(entry["message"], json!("ssh timed out"));
        assert!(entry.get("request_id").is_none());
        assert_eq!(entry["context"]["attempt"], json!(3));
        assert_eq!(entry["context"]["host"], json!("pve-2"));
        assert_eq!(entry["context"]["request_id"], json!("req-9"));
        assert_eq!(entry["context"]["err"]["name"], json!("TimeoutError"));
        assert_eq!(entry["context"]["err"]["code"], json!(110));
        assert_eq!(entry["context"]["error_type"], json!("TimeoutError"));
        assert_eq!(entry["context"]["error_message"], json!("ssh timed out"));
    }

    #[test]
    fn http_helpers_clear_bound_request_id_when_none_given() {
        let (root, sink) = capture(Level::Info);
        let logger = root.with_request("req-1", None);
        logger.log_request("GET", "/x", None, None, Fields::new()).unwrap();
        logger.log_response("GET", "/x", 204, 5, None, Fields::new()).unwrap();
        logger.info("plain", Fields::new()).unwrap();
        let entries = parsed(&sink);
        assert!(entries[0].get("request_id").is_none());
        assert!(entries[1].get("request_id").is_none());
        assert_eq!(entries[2]["request_id"], json!("req-1"));
    }

    #[test]
    fn log_error_keeps_caller_error_type_and_defaults_message() {
        let (logger, sink) = capture(Level::Info);
        let report = ErrorReport::new("Weird", "");
        logger.log_error(&report, fields!("error_type": "Custom")).unwrap();
        let entry = &parsed(&sink)[0];
        assert_eq!(entry["message"], json!("Error occurred"));
        assert_eq!(entry["context"]["error_type"], json!("Custom"));
        assert_eq!(entry["context"]["error_message"], json!("Error occurred"));
        assert_eq!(entry["context"]["err"]["message"], json!("Error"));
    }

    #[test]
    fn request_and_response_shapes() {
        let (logger, sink) = capture(Level::Info);
        logger
            .log_request("GET", "/api/nodes", Some("req-1"), Some("curl/8"), fields!("node": "pve"))
            .unwrap();
        logger
            .log_response("GET", "/api/nodes", 200, 37, Some("req-1"), Fields::new())
            .unwrap();
        let entries = parsed(&sink);

        assert_eq!(entries[0]["message"], json!("HTTP Request"));
        assert_eq!(entries[0]["request_id"], json!("req-1"));
        assert_eq!(
            entries[0]["context"],
            json!({"method": "GET", "url": "/api/nodes", "userAgent": "curl/8", "node": "pve"})
        );

        assert_eq!(entries[1]["message"], json!("HTTP Response"));
        assert_eq!(entries[1]["status_code"], json!(200));
        assert_eq!(entries[1]["duration_ms"], json!(37));
        assert_eq!(entries[1]["context"], json!({"method": "GET", "url": "/api/nodes"}));
    }

    #[test]
    fn create_logger_sets_identity() {
        let (root, _) = capture(Level::Info);
        let svc = root.create_logger(Some("backup-manager"), None, None, Some("backup"));
        let entry = svc.entry(Level::Info, "m", Fields::new()).unwrap();
        assert_eq!(entry.service, "backup-manager");
        assert_eq!(entry.environment, "test");
        assert_eq!(entry.version, "1.0.0");
        assert_eq!(entry.category, "backup");
    }

    #[test]
    fn non_string_message_is_coerced() {
        let (logger, sink) = capture(Level::Info);
        logger.info(42, Fields::new()).unwrap();
        assert_eq!(parsed(&sink)[0]["message"], json!("42"));
    }
}
