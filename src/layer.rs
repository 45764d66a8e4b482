use crate::fields::Fields;
use crate::level::Level;
use crate::logger::Logger;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns `tracing` events into entries
/// written synchronously through a [`Logger`].
///
/// `TRACE` and `DEBUG` map to `debug`. The event's `message` becomes the
/// entry message, every other field becomes a call field (so `request_id`,
/// `duration_ms` and the rest land at the root), and the event target is
/// recorded as `source` unless the event sets one.
#[derive(Clone, Debug)]
pub struct BridgeLayer {
    logger: Logger,
}

impl BridgeLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for BridgeLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = map_level(meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut fields = Fields::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        if !fields.contains_key("source") {
            fields.insert("source", meta.target());
        }

        // `Layer::on_event` has no error channel.
        if let Err(e) = self.logger.log(level, message.unwrap_or_default(), fields) {
            eprintln!("homelab-log: failed to write bridged event: {}", e);
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Fields,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name(), value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let report = crate::error_report::ErrorReport::from_error(value);
        self.fields.insert(field.name(), report.to_value());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name(), Value::String(format!("{:?}", value)));
        }
    }
}
