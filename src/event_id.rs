use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL: EventIdGenerator = EventIdGenerator::new();

/// Monotonic event id source: `evt_<epoch_ms>_<counter>`.
///
/// The counter is a single atomic, so for any two calls ordered in real
/// time the second one observes a strictly greater counter, whichever
/// thread it runs on. Ids are not unique across processes.
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    counter: AtomicU64,
}

impl EventIdGenerator {
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// The process-wide generator used by loggers unless one is injected.
    pub fn global() -> &'static EventIdGenerator {
        &GLOBAL
    }

    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("evt_{}_{}", Utc::now().timestamp_millis(), n)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

/// Counter component of an id produced by [`EventIdGenerator::next_id`].
pub fn counter_of(event_id: &str) -> Option<u64> {
    event_id.rsplit('_').next()?.parse().ok()
}
