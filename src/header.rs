//! Packet header parsing.
//!
//! Every packet in an RU or MMI recording starts with the same 15-byte
//! header followed by a one-byte body length:
//!
//! ```text
//! +------+---------+----------+----------+---------+---------+
//! | type | YMDhms  | position | reserved | speed   | bodyLen |
//! | 1 B  | 6 B     | 4 B BE   | 2 B      | 2 B BE  | 1 B     |
//! +------+---------+----------+----------+---------+---------+
//! ```
//!
//! The year byte is an offset from 2000. Speed is in 0.1 km/h units. The
//! position counter wraps at one billion meters; the parser applies the
//! wrap correction so downstream code sees a continuous position, and keeps
//! a provenance flag so the raw header can be re-serialised.

use crate::codec;
use crate::error::{CalendarField, DecodeError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::trace;

/// Size of the fixed packet header in bytes.
pub const HEADER_LEN: usize = 15;

/// Size of the header plus the body-length prefix.
pub const FRAME_PREFIX_LEN: usize = HEADER_LEN + 1;

/// Threshold at which the onboard position counter wraps.
pub const POSITION_WRAP: u32 = 1_000_000_000;

/// Applies the position wrap correction.
///
/// The corrected value is always below [`POSITION_WRAP`], so applying the
/// correction twice is a no-op.
pub fn wrap_position(raw: u32) -> u32 {
    raw % POSITION_WRAP
}

/// Parsed 15-byte packet header, common to RU and MMI files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Packet type code, selects the body decoder.
    pub packet_type: u8,
    /// Same byte as `packet_type`, retained for display.
    pub packet_number: u8,
    /// Capture timestamp at second resolution, no timezone.
    pub timestamp: NaiveDateTime,
    /// Position in meters after wrap correction.
    pub location: u32,
    /// Set when the raw position field carried a wrapped counter value.
    pub location_wrapped: bool,
    /// Reserved field at bytes 11-12, preserved opaquely.
    pub reserved: u16,
    /// Speed in 0.1 km/h units.
    pub speed: u16,
}

impl Header {
    /// Parses the fixed 15-byte header.
    ///
    /// Calendar components are range-checked (month 1-12, day 1-31, hour
    /// 0-23, minute/second 0-59) and reported individually on failure; no
    /// normalisation is applied.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(DecodeError::Truncated { offset: data.len(), need: HEADER_LEN });
        }

        let packet_type = codec::read_u8(data, 0)?;
        let timestamp = parse_timestamp(&data[1..7])?;
        let raw_location = codec::read_u32(data, 7)?;
        let reserved = codec::read_u16(data, 11)?;
        let speed = codec::read_u16(data, 13)?;

        let location = wrap_position(raw_location);
        let location_wrapped = location != raw_location;

        trace!(packet_type, location, speed, "header parsed");

        Ok(Header {
            packet_type,
            packet_number: packet_type,
            timestamp,
            location,
            location_wrapped,
            reserved,
            speed,
        })
    }

    /// Parses a full frame: header, body-length prefix, and body slice.
    ///
    /// On success returns the header, the body slice, and the total number
    /// of bytes consumed (`16 + body_length`). On failure the consumed
    /// count is unspecified and the error carries the originating offset
    /// within `data`.
    pub fn parse_frame(data: &[u8]) -> Result<(Header, &[u8], usize)> {
        let header = Header::parse(data)?;
        let body_len = codec::read_u8(data, HEADER_LEN)? as usize;
        let body = data
            .get(FRAME_PREFIX_LEN..FRAME_PREFIX_LEN + body_len)
            .ok_or(DecodeError::Truncated { offset: FRAME_PREFIX_LEN, need: body_len })?;
        Ok((header, body, FRAME_PREFIX_LEN + body_len))
    }

    /// Re-serialises the header to its wire form.
    ///
    /// The position field is re-wrapped: when `location_wrapped` is set the
    /// counter offset is added back so the original raw bytes round-trip.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0] = self.packet_type;

        let ts = &self.timestamp;
        use chrono::{Datelike, Timelike};
        out[1] = (ts.year() - 2000) as u8;
        out[2] = ts.month() as u8;
        out[3] = ts.day() as u8;
        out[4] = ts.hour() as u8;
        out[5] = ts.minute() as u8;
        out[6] = ts.second() as u8;

        let raw_location =
            if self.location_wrapped { self.location + POSITION_WRAP } else { self.location };
        out[7..11].copy_from_slice(&raw_location.to_be_bytes());
        out[11..13].copy_from_slice(&self.reserved.to_be_bytes());
        out[13..15].copy_from_slice(&self.speed.to_be_bytes());
        out
    }
}

fn parse_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    let year = 2000 + data[0] as i32;
    let month = data[1];
    let day = data[2];
    let hour = data[3];
    let minute = data[4];
    let second = data[5];

    if !(1..=12).contains(&month) {
        return Err(DecodeError::InvalidCalendarField { field: CalendarField::Month, value: month });
    }
    if !(1..=31).contains(&day) {
        return Err(DecodeError::InvalidCalendarField { field: CalendarField::Day, value: day });
    }
    if hour > 23 {
        return Err(DecodeError::InvalidCalendarField { field: CalendarField::Hour, value: hour });
    }
    if minute > 59 {
        return Err(DecodeError::InvalidCalendarField {
            field: CalendarField::Minute,
            value: minute,
        });
    }
    if second > 59 {
        return Err(DecodeError::InvalidCalendarField {
            field: CalendarField::Second,
            value: second,
        });
    }

    // A day that overruns its month (e.g. February 31) is reported against
    // the day component.
    let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .ok_or(DecodeError::InvalidCalendarField { field: CalendarField::Day, value: day })?;
    date.and_hms_opt(hour as u32, minute as u32, second as u32)
        .ok_or(DecodeError::InvalidCalendarField { field: CalendarField::Hour, value: hour })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 2023-10-15 14:30:45, location 1000, speed 120 (0.1 km/h units)
    const SAMPLE: [u8; 15] = [
        0x01, 0x17, 0x0A, 0x0F, 0x0E, 0x1E, 0x2D, 0x00, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x00, 0x78,
    ];

    #[test]
    fn parses_sample_header() {
        let header = Header::parse(&SAMPLE).unwrap();
        assert_eq!(header.packet_type, 1);
        assert_eq!(header.packet_number, 1);
        assert_eq!(
            header.timestamp,
            NaiveDate::from_ymd_opt(2023, 10, 15).unwrap().and_hms_opt(14, 30, 45).unwrap()
        );
        assert_eq!(header.location, 1000);
        assert!(!header.location_wrapped);
        assert_eq!(header.reserved, 0);
        assert_eq!(header.speed, 120);
    }

    #[test]
    fn applies_position_wrap_correction() {
        let mut data = SAMPLE;
        // 1_000_000_016
        data[7..11].copy_from_slice(&[0x3B, 0x9A, 0xCA, 0x10]);
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.location, 16);
        assert!(header.location_wrapped);
    }

    #[test]
    fn rejects_out_of_range_calendar_fields() {
        let cases: [(usize, u8, CalendarField); 6] = [
            (2, 0, CalendarField::Month),
            (2, 13, CalendarField::Month),
            (3, 0, CalendarField::Day),
            (4, 24, CalendarField::Hour),
            (5, 60, CalendarField::Minute),
            (6, 60, CalendarField::Second),
        ];
        for (index, value, field) in cases {
            let mut data = SAMPLE;
            data[index] = value;
            match Header::parse(&data) {
                Err(DecodeError::InvalidCalendarField { field: got, value: v }) => {
                    assert_eq!(got, field);
                    assert_eq!(v, value);
                }
                other => panic!("byte {index}={value}: expected calendar error, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_day_overrunning_month() {
        let mut data = SAMPLE;
        data[2] = 2; // February
        data[3] = 31;
        match Header::parse(&data) {
            Err(DecodeError::InvalidCalendarField { field, value }) => {
                assert_eq!(field, CalendarField::Day);
                assert_eq!(value, 31);
            }
            other => panic!("expected calendar error, got {other:?}"),
        }
    }

    #[test]
    fn short_input_is_truncated() {
        match Header::parse(&SAMPLE[..10]) {
            Err(DecodeError::Truncated { offset, need }) => {
                assert_eq!(offset, 10);
                assert_eq!(need, HEADER_LEN);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn parse_frame_splits_body_and_reports_consumed() {
        let mut data = SAMPLE.to_vec();
        data.push(3); // body length
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        data.extend_from_slice(&[0xEE; 4]); // next frame noise

        let (header, body, consumed) = Header::parse_frame(&data).unwrap();
        assert_eq!(header.packet_type, 1);
        assert_eq!(body, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(consumed, FRAME_PREFIX_LEN + 3);
    }

    #[test]
    fn parse_frame_short_body_is_truncated() {
        let mut data = SAMPLE.to_vec();
        data.push(10);
        data.extend_from_slice(&[0xAA, 0xBB]);
        match Header::parse_frame(&data) {
            Err(DecodeError::Truncated { offset, need }) => {
                assert_eq!(offset, FRAME_PREFIX_LEN);
                assert_eq!(need, 10);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn wrap_correction_is_idempotent_at_boundaries() {
        assert_eq!(wrap_position(0), 0);
        assert_eq!(wrap_position(POSITION_WRAP - 1), POSITION_WRAP - 1);
        assert_eq!(wrap_position(POSITION_WRAP), 0);
        assert_eq!(wrap_position(1_000_000_016), 16);
        assert_eq!(wrap_position(u32::MAX), wrap_position(wrap_position(u32::MAX)));
    }

    proptest! {
        #[test]
        fn prop_wrap_correction_idempotent(raw in any::<u32>()) {
            let once = wrap_position(raw);
            prop_assert!(once < POSITION_WRAP);
            prop_assert_eq!(wrap_position(once), once);
        }

        #[test]
        fn prop_header_round_trips(
            packet_type in any::<u8>(),
            yy in 0u8..=99,
            month in 1u8..=12,
            day in 1u8..=28,
            hour in 0u8..=23,
            minute in 0u8..=59,
            second in 0u8..=59,
            // Wrapped counter values above 2e9 cannot occur on the wire;
            // the recorder wraps at 1e9.
            raw_location in 0u32..2_000_000_000,
            reserved in any::<u16>(),
            speed in any::<u16>(),
        ) {
            let mut data = [0u8; HEADER_LEN];
            data[0] = packet_type;
            data[1] = yy;
            data[2] = month;
            data[3] = day;
            data[4] = hour;
            data[5] = minute;
            data[6] = second;
            data[7..11].copy_from_slice(&raw_location.to_be_bytes());
            data[11..13].copy_from_slice(&reserved.to_be_bytes());
            data[13..15].copy_from_slice(&speed.to_be_bytes());

            let header = Header::parse(&data).unwrap();
            prop_assert_eq!(header.location, wrap_position(raw_location));
            prop_assert_eq!(header.to_bytes(), data);
        }
    }
}
