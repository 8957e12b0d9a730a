//! Decoded record representation.

use crate::btm::BtmTelegram;
use crate::header::Header;
use crate::mmi::{MmiDynamic, MmiDriverMessage, MmiFailureReport, MmiStatus};
use crate::types::PacketFamily;
use serde::Serialize;

/// Type-specific payload of a decoded packet.
///
/// Closed sum over the packet kinds the decoder understands. Passthrough
/// and Unknown variants keep the raw body bytes for diagnostics; every
/// variant owns its data outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Payload {
    MmiDynamic(MmiDynamic),
    MmiStatus(MmiStatus),
    MmiDriverMessage(MmiDriverMessage),
    MmiFailureReport(MmiFailureReport),
    BtmTelegram(BtmTelegram),
    Passthrough { family: PacketFamily, body: Vec<u8> },
    Unknown { body: Vec<u8> },
}

impl Payload {
    /// Stable description of the payload kind.
    pub fn description(&self) -> &'static str {
        match self {
            Payload::MmiDynamic(_) => "MMI_DYNAMIC",
            Payload::MmiStatus(_) => "MMI_STATUS",
            Payload::MmiDriverMessage(_) => "MMI_DRIVER_MESSAGE",
            Payload::MmiFailureReport(_) => "MMI_FAILURE_REPORT_ATP",
            Payload::BtmTelegram(_) => "BTM_TELEGRAM",
            Payload::Passthrough { family, .. } => family.description(),
            Payload::Unknown { .. } => "UNKNOWN",
        }
    }
}

/// One decoded packet: its frame header plus the typed payload.
///
/// For a reassembled telegram the header belongs to the frame whose
/// fragment completed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub header: Header,
    pub payload: Payload,
}

impl Record {
    pub fn new(header: Header, payload: Payload) -> Self {
        Record { header, payload }
    }

    /// Stable description of the record kind, e.g. `"MMI_DYNAMIC"`.
    pub fn description(&self) -> &'static str {
        self.payload.description()
    }
}
