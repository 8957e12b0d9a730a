//! Core types for decoded recording data.
//!
//! - [`Record`] pairs a frame header with its typed payload
//! - [`Payload`] is the closed sum over packet kinds
//! - [`PacketFamily`] names the passthrough vehicle-bus families

mod family;
mod record;

pub use family::PacketFamily;
pub use record::{Payload, Record};
