//! Shared frame builders for unit tests.

use crate::header::FRAME_PREFIX_LEN;

/// Builds a complete frame: 15-byte header, length prefix, body.
///
/// Header fields are fixed at 2023-10-15 14:30:45, location 1000,
/// reserved 0, speed 120 (0.1 km/h units).
pub fn frame(packet_type: u8, body: &[u8]) -> Vec<u8> {
    assert!(body.len() <= u8::MAX as usize);
    let mut out = Vec::with_capacity(FRAME_PREFIX_LEN + body.len());
    out.push(packet_type);
    out.extend_from_slice(&[0x17, 0x0A, 0x0F, 0x0E, 0x1E, 0x2D]); // timestamp
    out.extend_from_slice(&1000u32.to_be_bytes()); // location
    out.extend_from_slice(&[0x00, 0x00]); // reserved
    out.extend_from_slice(&120u16.to_be_bytes()); // speed
    out.push(body.len() as u8);
    out.extend_from_slice(body);
    out
}

/// 27-byte MMI_DYNAMIC body with the canonical test values.
pub fn mmi_dynamic_body() -> Vec<u8> {
    let mut body = Vec::with_capacity(27);
    body.extend_from_slice(&120u16.to_be_bytes()); // v_train
    body.extend_from_slice(&10i16.to_be_bytes()); // a_train
    body.extend_from_slice(&1000u32.to_be_bytes()); // o_train
    body.extend_from_slice(&2000u32.to_be_bytes()); // o_brake_target
    body.extend_from_slice(&100u16.to_be_bytes()); // v_target
    body.extend_from_slice(&30u16.to_be_bytes()); // t_interven_war
    body.extend_from_slice(&130u16.to_be_bytes()); // v_permitted
    body.extend_from_slice(&110u16.to_be_bytes()); // v_release
    body.extend_from_slice(&140u16.to_be_bytes()); // v_intervention
    body.push(0x50); // warning 0, slip 1, slide 0
    body.extend_from_slice(&3000u32.to_be_bytes()); // o_bcsp
    body
}

/// 8-byte MMI_STATUS body.
pub fn mmi_status_body() -> Vec<u8> {
    vec![0x01, 0x02, 0x03, 0x00, 0x01, 0x00, 0x01, 0x02]
}

/// Telegram fragment body: sequence, self-reported index, payload fill.
pub fn tgm_body(sequence: u8, index: u8, fill: u8) -> Vec<u8> {
    let payload_len = if index == 1 { 4 } else { 25 };
    let mut body = vec![sequence, index];
    body.extend(std::iter::repeat(fill).take(payload_len));
    body
}
