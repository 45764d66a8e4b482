//! Thread-scoped "current logger".
//!
//! Code that cannot take a logger parameter asks [`current`]; callers
//! that own a more specific logger wrap the call in [`scope`]. The handle
//! is pushed on entry and popped on exit (also on unwind), so nothing
//! leaks past the closure and no global is ever mutated.

use crate::init::root;
use crate::logger::Logger;
use std::cell::RefCell;

thread_local! {
    static STACK: RefCell<Vec<Logger>> = const { RefCell::new(Vec::new()) };
}

struct PopOnDrop;

impl Drop for PopOnDrop {
    fn drop(&mut self) {
        STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` with `logger` as the current logger of this thread.
pub fn scope<R>(logger: &Logger, f: impl FnOnce() -> R) -> R {
    STACK.with(|stack| stack.borrow_mut().push(logger.clone()));
    let _guard = PopOnDrop;
    f()
}

/// Innermost scoped logger on this thread, or the root.
pub fn current() -> Logger {
    STACK
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(|| root().clone())
}

/// Run `f` with the root logger bound to `trace_id` / `span_id` as the
/// current logger.
pub fn with_span<R>(trace_id: &str, span_id: Option<&str>, f: impl FnOnce() -> R) -> R {
    scope(&root().bind_trace(trace_id, span_id), f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fields::Fields;
    use serde_json::json;

    fn logger(tag: &str) -> Logger {
        Logger::builder(Config::default())
            .sink(crate::noop_sink::NoopSink)
            .build()
            .bind(Fields::new().with("tag", tag))
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let outer = logger("outer");
        let inner = logger("inner");
        scope(&outer, || {
            assert_eq!(current().bindings().get("tag"), Some(&json!("outer")));
            scope(&inner, || {
                assert_eq!(current().bindings().get("tag"), Some(&json!("inner")));
            });
            assert_eq!(current().bindings().get("tag"), Some(&json!("outer")));
        });
        assert!(STACK.with(|s| s.borrow().is_empty()));
    }

    #[test]
    fn scope_pops_on_panic() {
        let outer = logger("outer");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scope(&outer, || panic!("boom"))
        }));
        assert!(result.is_err());
        assert!(STACK.with(|s| s.borrow().is_empty()));
    }

    #[test]
    fn scopes_are_per_thread() {
        let outer = logger("outer");
        scope(&outer, || {
            let seen = std::thread::spawn(|| STACK.with(|s| s.borrow().len()))
                .join()
                .unwrap();
            assert_eq!(seen, 0);
        });
    }
}
