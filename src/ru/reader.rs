//! Pull-based streaming reader.
//!
//! [`RuReader`] wraps any [`Read`] source and yields records one at a
//! time. Input is buffered up to the next frame boundary: a partial frame
//! at the buffer tail simply waits for the next chunk, so the reader works
//! over pipes and growing files as well as plain files loaded from disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use atplog::RuReader;
//!
//! fn dump() -> atplog::Result<()> {
//!     let mut reader = RuReader::open("journey.ru")?;
//!     while let Some(item) = reader.next_record() {
//!         match item {
//!             Ok(record) => println!("{}", record.description()),
//!             Err(err) => eprintln!("{err}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use crate::error::{DecodeError, Result};
use crate::ru::session::{RuSession, SessionStats, StepStatus};
use crate::types::Record;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::trace;

const CHUNK_SIZE: usize = 8 * 1024;

/// Streaming decoder over a [`Read`] source.
pub struct RuReader<R> {
    inner: R,
    session: RuSession,
    buf: Vec<u8>,
    offset: usize,
    out: VecDeque<Result<Record>>,
    eof: bool,
    finished: bool,
}

impl RuReader<BufReader<File>> {
    /// Opens a recording file for streaming decode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| DecodeError::file_error(path.as_ref().to_path_buf(), e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> RuReader<R> {
    /// Wraps a byte source with a fresh decode session.
    pub fn new(inner: R) -> Self {
        Self::with_session(inner, RuSession::new())
    }

    /// Wraps a byte source with a caller-configured session.
    pub fn with_session(inner: R, session: RuSession) -> Self {
        RuReader {
            inner,
            session,
            buf: Vec::with_capacity(CHUNK_SIZE),
            offset: 0,
            out: VecDeque::new(),
            eof: false,
            finished: false,
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &SessionStats {
        self.session.stats()
    }

    /// Yields the next record or error, or `None` at end of stream.
    pub fn next_record(&mut self) -> Option<Result<Record>> {
        loop {
            if let Some(item) = self.out.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            match self.session.step(&self.buf, &mut self.offset, &mut self.out, self.eof) {
                StepStatus::Progress => {}
                StepStatus::Finished => self.finished = true,
                StepStatus::NeedMore => {
                    if self.eof {
                        self.finished = true;
                        continue;
                    }
                    self.fill();
                }
            }
        }
    }

    /// Reads one more chunk, dropping the consumed buffer prefix first.
    fn fill(&mut self) {
        if self.offset > 0 {
            self.buf.drain(..self.offset);
            self.offset = 0;
        }
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    trace!(buffered = self.buf.len(), "source exhausted");
                    self.eof = true;
                    return;
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return;
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.out.push_back(Err(e.into()));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

impl<R: Read> Iterator for RuReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}
