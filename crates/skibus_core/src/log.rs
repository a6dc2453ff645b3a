//! # Event Log Sink
//!
//! **Totally ordered, gap-free run log**
//!
//! Any task or thread may call [`EventLog::emit`]. Each call:
//!
//! 1. takes the log lock,
//! 2. assigns the next sequence number,
//! 3. writes exactly one line,
//! 4. flushes before releasing the lock.
//!
//! The sequence counter lives under the same lock as the writer, so file
//! order and number order can never disagree. A crash loses at most the line
//! being written.
//!
//! The log lock is a leaf: nothing else is ever locked while it is held, so
//! emitting an event from inside the store lock cannot deadlock.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use crate::error::SimResult;
use crate::event::{Event, LogLine};

struct LogInner<W> {
    /// Number given to the most recent line (0 before the first).
    seq: u64,
    writer: W,
}

/// Serialised, numbered event log.
pub struct EventLog<W: Write = BufWriter<File>> {
    inner: Mutex<LogInner<W>>,
}

impl EventLog<BufWriter<File>> {
    /// Creates (or truncates) a log file.
    ///
    /// # Errors
    ///
    /// The file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> SimResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl EventLog<Vec<u8>> {
    /// Log kept in memory, for tests and benchmarks.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Vec::new())
    }

    /// Returns the lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let inner = self.inner.lock();
        String::from_utf8_lossy(&inner.writer)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl<W: Write> EventLog<W> {
    /// Wraps any writer.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(LogInner { seq: 0, writer }),
        }
    }

    /// Appends one numbered, flushed line and returns its sequence number.
    ///
    /// # Errors
    ///
    /// The write or flush failed. The sequence number is still consumed so
    /// the gap shows up in the audit.
    pub fn emit(&self, event: Event) -> SimResult<u64> {
        let mut inner = self.inner.lock();
        inner.seq += 1;
        let line = LogLine {
            seq: inner.seq,
            event,
        };
        writeln!(inner.writer, "{line}")?;
        inner.writer.flush()?;
        tracing::debug!(target: "skibus::event", "{line}");
        Ok(line.seq)
    }

    /// Number of lines emitted so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.inner.lock().seq
    }

    /// True before the first line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SkierId, Stop};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_numbers_start_at_one() {
        let log = EventLog::in_memory();
        assert!(log.is_empty());
        assert_eq!(log.emit(Event::BusStarted).unwrap(), 1);
        assert_eq!(log.emit(Event::BusArrived(Stop(1))).unwrap(), 2);
        assert_eq!(
            log.lines(),
            vec!["1: BUS: started".to_string(), "2: BUS: arrived to 1".to_string()]
        );
    }

    #[test]
    fn test_concurrent_writers_never_interleave() {
        let log = Arc::new(EventLog::in_memory());
        let threads = 8u32;
        let per_thread = 500u32;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        log.emit(Event::SkierArrived(SkierId(t * per_thread + i), Stop(1)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let lines = log.lines();
        assert_eq!(lines.len(), (threads * per_thread) as usize);
        for (i, line) in lines.iter().enumerate() {
            let parsed: LogLine = line.parse().unwrap();
            assert_eq!(parsed.seq, i as u64 + 1);
        }
    }

    #[test]
    fn test_file_log_is_flushed_per_line() {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("test_skibus_log_{id}.out"));

        let log = EventLog::create(&path).unwrap();
        log.emit(Event::BusStarted).unwrap();
        // Still open: the line must already be on disk.
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "1: BUS: started\n");

        drop(log);
        std::fs::remove_file(&path).ok();
    }
}
