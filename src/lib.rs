//! Decoder for ATP onboard recording files.
//!
//! Atplog turns the binary logs written by an Automatic Train Protection
//! Recording Unit (RU files) and its cab display (MMI files) into typed
//! records for analysis, visualization, and storage.
//!
//! # Features
//!
//! - **Frame walking**: length-prefixed packets behind a shared 15-byte
//!   header, with byte-level resynchronisation after corrupt headers
//! - **MMI decoding**: train kinematics (MMI_DYNAMIC), status flags,
//!   driver messages, and failure reports
//! - **Telegram reassembly**: 104-byte balise telegrams recombined from
//!   five fragments arriving in any order, ten sequences in flight
//! - **Errors as values**: malformed frames become error items in the
//!   output stream; decoding keeps going
//!
//! # Quick start
//!
//! ```rust,no_run
//! use atplog::{formatter, RuReader};
//!
//! fn main() -> atplog::Result<()> {
//!     let mut reader = RuReader::open("journey.ru")?;
//!     while let Some(item) = reader.next_record() {
//!         match item {
//!             Ok(record) => println!("{}", formatter::to_row(&record)),
//!             Err(err) => eprintln!("decode error: {err}"),
//!         }
//!     }
//!     eprintln!("{}", reader.stats().summary());
//!     Ok(())
//! }
//! ```
//!
//! Decoding an in-memory buffer goes through [`RuSession::decode_all`]:
//!
//! ```rust
//! use atplog::RuSession;
//!
//! let mut session = RuSession::new();
//! for item in session.decode_all(&[]) {
//!     let _ = item;
//! }
//! assert_eq!(session.stats().frames, 0);
//! ```

pub mod btm;
pub mod codec;
mod error;
pub mod formatter;
mod header;
pub mod mmi;
pub mod ru;
#[cfg(test)]
mod test_support;
pub mod types;

pub use btm::{BtmFragment, BtmTelegram, Reassembler};
pub use error::{CalendarField, DecodeError, Result};
pub use header::{wrap_position, Header, FRAME_PREFIX_LEN, HEADER_LEN, POSITION_WRAP};
pub use mmi::{MmiDynamic, MmiDriverMessage, MmiFailureReport, MmiStatus};
pub use ru::{FrameWalker, RuReader, RuSession, SessionStats, DEFAULT_RESYNC_LIMIT};
pub use types::{PacketFamily, Payload, Record};

/// Decodes a complete in-memory recording with a fresh session.
///
/// Convenience wrapper over [`RuSession::decode_all`]; returns the
/// interleaved records and errors in emission order.
pub fn decode(bytes: &[u8]) -> Vec<Result<Record>> {
    let mut session = RuSession::new();
    session.decode_all(bytes).collect()
}
