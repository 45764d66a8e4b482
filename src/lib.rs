pub mod env;
pub mod level;
pub mod config;
pub mod event_id;
pub mod fields;
pub mod error_report;
pub mod record;
pub mod render;
pub mod sink;
pub mod noop_sink;
pub mod logger;
pub mod scope;
pub mod init;

#[cfg(feature = "bridge")]
pub mod layer;

pub use config::Config;
pub use error_report::ErrorReport;
pub use fields::Fields;
pub use init::{create_logger, root};
pub use level::Level;
pub use logger::{LogError, Logger};
pub use record::LogEntry;
pub use scope::{current, scope, with_span};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
