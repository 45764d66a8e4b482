use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Platform line separator appended to every rendered entry.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Synchronous destination for rendered lines.
///
/// Implementations write the whole line plus [`LINE_SEPARATOR`] and flush
/// before returning, holding whatever lock guards the underlying stream
/// for the duration so concurrent callers never interleave partial lines.
/// Nothing is buffered across calls.
pub trait LogSink: Send + Sync {
    /// Write one rendered line.
    ///
    /// **Returns**
    /// - `Ok(())` once the line has been written and flushed.
    /// - `Err(..)` on any write or flush failure. Callers propagate it;
    ///   it is never retried or swallowed here.
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Process standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(LINE_SEPARATOR.as_bytes())?;
        out.flush()
    }
}

/// Any `Write` behind a mutex, e.g. a file or a socket.
pub struct WriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut buf = String::with_capacity(line.len() + LINE_SEPARATOR.len());
        buf.push_str(line);
        buf.push_str(LINE_SEPARATOR);
        guard.write_all(buf.as_bytes())?;
        guard.flush()
    }
}

/// Keeps every line in memory. Cloning shares the buffer.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lines written so far, without separators.
    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    /// Remove and return everything written so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.guard())
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.guard().push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_sink_appends_separator() {
        let sink = WriterSink::new(Vec::new());
        sink.write_line("a").unwrap();
        sink.write_line("b").unwrap();
        let bytes = sink.into_inner();
        assert_eq!(String::from_utf8(bytes).unwrap(), format!("a{LINE_SEPARATOR}b{LINE_SEPARATOR}"));
    }

    #[test]
    fn writer_sink_surfaces_errors() {
        let sink = WriterSink::new(Broken);
        let err = sink.write_line("x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn memory_sink_take_drains() {
        let sink = MemorySink::new();
        sink.write_line("one").unwrap();
        let shared = sink.clone();
        shared.write_line("two").unwrap();
        assert_eq!(sink.take(), vec!["one".to_string(), "two".to_string()]);
        assert!(sink.is_empty());
    }
}
