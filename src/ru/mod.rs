//! RU stream dispatcher.
//!
//! Walks a recording frame by frame, parses each packet header, routes the
//! body to the matching sub-decoder, and emits records and errors as one
//! interleaved output stream.
//!
//! Two front ends share the same session logic:
//! - [`RuSession::decode_all`] iterates over an in-memory byte slice
//! - [`RuReader`] pulls frames from any [`std::io::Read`] source,
//!   buffering up to the next frame boundary

mod reader;
mod session;

pub use reader::RuReader;
pub use session::{FrameWalker, RuSession, SessionStats, DEFAULT_RESYNC_LIMIT};
