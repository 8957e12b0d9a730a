//! Error types for the decode pipeline.
//!
//! All decoder failures are represented by [`DecodeError`]. Errors are
//! first-class values: the dispatcher interleaves them with records in its
//! output stream instead of aborting, so consumers can count, log, or
//! tolerate them. Only a small subset is stream-fatal (see
//! [`DecodeError::is_stream_fatal`]).
//!
//! ## Error categories
//!
//! - **Framing errors**: the input ran out mid-read (`Truncated`)
//! - **Header errors**: a calendar component is out of range
//! - **Body errors**: a packet body is shorter than its type requires
//! - **Reassembly errors**: fragment bookkeeping problems in the balise
//!   telegram reassembler
//! - **Session errors**: the resynchronisation budget is spent

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Calendar component of the packet-header timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarField {
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl fmt::Display for CalendarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalendarField::Month => "month",
            CalendarField::Day => "day",
            CalendarField::Hour => "hour",
            CalendarField::Minute => "minute",
            CalendarField::Second => "second",
        };
        f.write_str(name)
    }
}

/// Main error type for decode operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("input truncated at offset {offset}: {need} bytes required")]
    Truncated { offset: usize, need: usize },

    #[error("invalid {field} in header timestamp: {value}")]
    InvalidCalendarField { field: CalendarField, value: u8 },

    #[error("packet body too short: expected {expected} bytes, got {got}")]
    BodyTooShort { expected: usize, got: usize },

    #[error("fragment index mismatch: packet type implies {expected}, body reports {actual}")]
    FragmentIndexMismatch { expected: u8, actual: u8 },

    #[error("partial telegram {sequence} evicted holding {fragments_present} of 5 fragments")]
    PartialTelegramEvicted { sequence: u8, fragments_present: u8 },

    #[error("unknown packet type {packet_type} at offset {offset}")]
    UnknownPacketType { packet_type: u8, offset: usize },

    #[error("resynchronisation budget exceeded after skipping {skipped} bytes")]
    ResyncBudgetExceeded { skipped: usize },

    #[error("failed to read {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DecodeError {
    /// Returns whether this error terminates the decode stream.
    ///
    /// Per-frame errors are reported inline and the frame walk continues;
    /// stream-level errors end the session.
    pub fn is_stream_fatal(&self) -> bool {
        match self {
            DecodeError::Truncated { .. } => true,
            DecodeError::ResyncBudgetExceeded { .. } => true,
            DecodeError::File { .. } => true,
            DecodeError::InvalidCalendarField { .. } => false,
            DecodeError::BodyTooShort { .. } => false,
            DecodeError::FragmentIndexMismatch { .. } => false,
            DecodeError::PartialTelegramEvicted { .. } => false,
            DecodeError::UnknownPacketType { .. } => false,
        }
    }

    /// Short stable name of the error kind, used in summaries.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DecodeError::Truncated { .. } => "truncated",
            DecodeError::InvalidCalendarField { .. } => "invalid_calendar_field",
            DecodeError::BodyTooShort { .. } => "body_too_short",
            DecodeError::FragmentIndexMismatch { .. } => "fragment_index_mismatch",
            DecodeError::PartialTelegramEvicted { .. } => "partial_telegram_evicted",
            DecodeError::UnknownPacketType { .. } => "unknown_packet_type",
            DecodeError::ResyncBudgetExceeded { .. } => "resync_budget_exceeded",
            DecodeError::File { .. } => "file",
        }
    }

    /// Helper constructor for truncation errors.
    pub fn truncated(offset: usize, need: usize) -> Self {
        DecodeError::Truncated { offset, need }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        DecodeError::File { path, source }
    }

    /// Shifts input-relative offsets by `base`.
    ///
    /// Parsers report offsets relative to the slice they were handed; the
    /// dispatcher rebases them onto the stream before emitting.
    pub(crate) fn offset_by(self, base: usize) -> Self {
        match self {
            DecodeError::Truncated { offset, need } => {
                DecodeError::Truncated { offset: offset + base, need }
            }
            other => other,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::File { path: PathBuf::from("<stream>"), source: err }
    }
}
