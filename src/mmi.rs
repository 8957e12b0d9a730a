//! MMI packet-family decoders.
//!
//! The MMI family carries what the cab display shows: the train's kinematic
//! state (MMI_DYNAMIC), system status flags (MMI_STATUS), driver messages,
//! and failure reports. Each decoder consumes a body slice with the frame
//! header already stripped and produces an owned record; nothing borrows
//! from the input after decode returns.
//!
//! Field values are taken from the wire without domain validation: an
//! out-of-range mode byte is passed through for downstream analyzers to
//! judge.

use crate::codec;
use crate::error::{DecodeError, Result};
use crate::header::wrap_position;
use serde::Serialize;
use tracing::debug;

/// Minimum MMI_DYNAMIC body length.
pub const MMI_DYNAMIC_BODY_LEN: usize = 27;

/// Minimum MMI_STATUS body length.
pub const MMI_STATUS_BODY_LEN: usize = 8;

/// Train kinematics at one moment (packet type 1, and the ATP-reported
/// snapshot, type 4, which shares the layout).
///
/// Body layout, big-endian, tightly packed:
///
/// ```text
/// offset  0  v_train         u16   km/h
/// offset  2  a_train         i16   cm/s^2
/// offset  4  o_train         u32   m, wrap-corrected
/// offset  8  o_brake_target  u32   m, wrap-corrected
/// offset 12  v_target        u16   km/h
/// offset 14  t_interven_war  u16   s
/// offset 16  v_permitted     u16   km/h
/// offset 18  v_release       u16   km/h
/// offset 20  v_intervention  u16   km/h
/// offset 22  status byte     u8    warning/slip/slide bits
/// offset 23  o_bcsp          u32   m, wrap-corrected
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MmiDynamic {
    pub v_train: u16,
    pub a_train: i16,
    pub o_train: u32,
    pub o_brake_target: u32,
    pub v_target: u16,
    pub t_interven_war: u16,
    pub v_permitted: u16,
    pub v_release: u16,
    pub v_intervention: u16,
    pub m_warning: u8,
    pub m_slip: u8,
    pub m_slide: u8,
    pub o_bcsp: u32,
}

impl MmiDynamic {
    /// Decodes an MMI_DYNAMIC body.
    ///
    /// Status byte extraction: warning is the low nibble, slip is bit 4,
    /// slide is bit 5; the remaining bits are ignored. Trailing bytes past
    /// the fixed layout are ignored.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < MMI_DYNAMIC_BODY_LEN {
            return Err(DecodeError::BodyTooShort {
                expected: MMI_DYNAMIC_BODY_LEN,
                got: body.len(),
            });
        }

        let status = codec::read_u8(body, 22)?;
        let record = MmiDynamic {
            v_train: codec::read_u16(body, 0)?,
            a_train: codec::read_i16(body, 2)?,
            o_train: wrap_position(codec::read_u32(body, 4)?),
            o_brake_target: wrap_position(codec::read_u32(body, 8)?),
            v_target: codec::read_u16(body, 12)?,
            t_interven_war: codec::read_u16(body, 14)?,
            v_permitted: codec::read_u16(body, 16)?,
            v_release: codec::read_u16(body, 18)?,
            v_intervention: codec::read_u16(body, 20)?,
            m_warning: status & 0x0F,
            m_slip: (status >> 4) & 1,
            m_slide: (status >> 5) & 1,
            o_bcsp: wrap_position(codec::read_u32(body, 23)?),
        };

        debug!(
            v_train = record.v_train,
            o_train = record.o_train,
            a_train = record.a_train,
            "decoded MMI_DYNAMIC"
        );
        Ok(record)
    }
}

/// System status flags (packet type 2): eight consecutive unsigned bytes.
///
/// The enum domains belong to the onboard system and are opaque to the
/// decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MmiStatus {
    pub m_adhesion: u8,
    pub m_mode: u8,
    pub m_level: u8,
    pub m_emer_brake: u8,
    pub m_service_brake: u8,
    pub m_override_eoa: u8,
    pub m_trip: u8,
    pub m_active_cabin: u8,
}

impl MmiStatus {
    /// Decodes an MMI_STATUS body. No bit unpacking.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < MMI_STATUS_BODY_LEN {
            return Err(DecodeError::BodyTooShort {
                expected: MMI_STATUS_BODY_LEN,
                got: body.len(),
            });
        }
        Ok(MmiStatus {
            m_adhesion: body[0],
            m_mode: body[1],
            m_level: body[2],
            m_emer_brake: body[3],
            m_service_brake: body[4],
            m_override_eoa: body[5],
            m_trip: body[6],
            m_active_cabin: body[7],
        })
    }
}

/// Message shown to the driver (packet type 8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MmiDriverMessage {
    pub message_id: u16,
    /// Trailing bytes after the message id, preserved opaquely.
    pub payload: Vec<u8>,
}

impl MmiDriverMessage {
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 2 {
            return Err(DecodeError::BodyTooShort { expected: 2, got: body.len() });
        }
        Ok(MmiDriverMessage { message_id: codec::read_u16(body, 0)?, payload: body[2..].to_vec() })
    }
}

/// ATP failure report (packet type 9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MmiFailureReport {
    pub failure_number: u16,
    /// Trailing bytes after the failure number, preserved opaquely.
    pub payload: Vec<u8>,
}

impl MmiFailureReport {
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < 2 {
            return Err(DecodeError::BodyTooShort { expected: 2, got: body.len() });
        }
        Ok(MmiFailureReport {
            failure_number: codec::read_u16(body, 0)?,
            payload: body[2..].to_vec(),
        })
    }
}
