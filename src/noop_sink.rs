use crate::sink::LogSink;
use std::io;

/// A sink that simply drops all lines.
///
/// Useful for measuring assembly and rendering cost without any I/O, and
/// for callers that want a logger with output switched off.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write_line(&self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}
