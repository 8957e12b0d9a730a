//! Record formatting: text rows and the machine-readable JSON shape.
//!
//! The JSON shape is a stable contract shared with the service layer and
//! the dashboard; field names must not change:
//!
//! ```text
//! { "packet_type": <u8>,
//!   "description": <string>,
//!   "header": { "packet_number", "timestamp", "location", "speed" },
//!   "data": { ...type-specific... } | null }
//! ```
//!
//! Timestamps are ISO-8601 without timezone; `location` is meters as a
//! signed 64-bit integer.

use crate::types::{Payload, Record};
use chrono::NaiveDateTime;
use serde_json::{json, Value};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Renders bytes as uppercase hex, space-separated.
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}

/// Converts a record to the stable JSON shape.
pub fn to_json(record: &Record) -> Value {
    json!({
        "packet_type": record.header.packet_type,
        "description": record.description(),
        "header": {
            "packet_number": record.header.packet_number,
            "timestamp": format_timestamp(&record.header.timestamp),
            "location": record.header.location as i64,
            "speed": record.header.speed,
        },
        "data": payload_json(&record.payload),
    })
}

fn payload_json(payload: &Payload) -> Value {
    match payload {
        Payload::MmiDynamic(d) => json!({
            "v_train": d.v_train,
            "a_train": d.a_train,
            "o_train": d.o_train,
            "o_brake_target": d.o_brake_target,
            "v_target": d.v_target,
            "t_interven_war": d.t_interven_war,
            "v_permitted": d.v_permitted,
            "v_release": d.v_release,
            "v_intervention": d.v_intervention,
            "m_warning": d.m_warning,
            "m_slip": d.m_slip,
            "m_slide": d.m_slide,
            "o_bcsp": d.o_bcsp,
        }),
        Payload::MmiStatus(s) => json!({
            "m_adhesion": s.m_adhesion,
            "m_mode": s.m_mode,
            "m_level": s.m_level,
            "m_emer_brake": s.m_emer_brake,
            "m_service_brake": s.m_service_brake,
            "m_override_eoa": s.m_override_eoa,
            "m_trip": s.m_trip,
            "m_active_cabin": s.m_active_cabin,
        }),
        Payload::MmiDriverMessage(m) => json!({
            "message_id": m.message_id,
            "payload_hex": hex_string(&m.payload),
        }),
        Payload::MmiFailureReport(r) => json!({
            "failure_number": r.failure_number,
            "payload_hex": hex_string(&r.payload),
        }),
        Payload::BtmTelegram(t) => json!({
            "sequence": t.sequence,
            "length": t.data.len(),
            "data_hex": hex_string(&t.data),
        }),
        Payload::Passthrough { .. } | Payload::Unknown { .. } => Value::Null,
    }
}

/// Converts a record to a field-labelled text row.
pub fn to_row(record: &Record) -> String {
    let header = &record.header;
    let mut row = format!(
        "{} type={:03} {} loc={}m spd={}",
        format_timestamp(&header.timestamp),
        header.packet_type,
        record.description(),
        header.location,
        header.speed,
    );

    match &record.payload {
        Payload::MmiDynamic(d) => {
            row.push_str(&format!(
                " v_train={} a_train={} o_train={} o_brake_target={} v_target={} \
                 t_interven_war={} v_permitted={} v_release={} v_intervention={} \
                 m_warning={} m_slip={} m_slide={} o_bcsp={}",
                d.v_train,
                d.a_train,
                d.o_train,
                d.o_brake_target,
                d.v_target,
                d.t_interven_war,
                d.v_permitted,
                d.v_release,
                d.v_intervention,
                d.m_warning,
                d.m_slip,
                d.m_slide,
                d.o_bcsp,
            ));
        }
        Payload::MmiStatus(s) => {
            row.push_str(&format!(
                " m_adhesion={} m_mode={} m_level={} m_emer_brake={} m_service_brake={} \
                 m_override_eoa={} m_trip={} m_active_cabin={}",
                s.m_adhesion,
                s.m_mode,
                s.m_level,
                s.m_emer_brake,
                s.m_service_brake,
                s.m_override_eoa,
                s.m_trip,
                s.m_active_cabin,
            ));
        }
        Payload::MmiDriverMessage(m) => {
            row.push_str(&format!(" message_id={}", m.message_id));
            if !m.payload.is_empty() {
                row.push_str(&format!(" payload=[{}]", hex_string(&m.payload)));
            }
        }
        Payload::MmiFailureReport(r) => {
            row.push_str(&format!(" failure_number={}", r.failure_number));
            if !r.payload.is_empty() {
                row.push_str(&format!(" payload=[{}]", hex_string(&r.payload)));
            }
        }
        Payload::BtmTelegram(t) => {
            row.push_str(&format!(" sequence={} data=[{}]", t.sequence, hex_string(&t.data)));
        }
        Payload::Passthrough { body, .. } | Payload::Unknown { body } => {
            if !body.is_empty() {
                row.push_str(&format!(" body=[{}]", hex_string(body)));
            }
        }
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmi::{MmiDynamic, MmiStatus};
    use crate::test_support::{frame, mmi_dynamic_body};
    use crate::types::PacketFamily;
    use crate::Header;

    fn sample_record() -> Record {
        let data = frame(1, &mmi_dynamic_body());
        let (header, body, _) = Header::parse_frame(&data).unwrap();
        Record::new(header, Payload::MmiDynamic(MmiDynamic::decode(body).unwrap()))
    }

    #[test]
    fn json_shape_has_stable_field_names() {
        let value = to_json(&sample_record());

        assert_eq!(value["packet_type"], 1);
        assert_eq!(value["description"], "MMI_DYNAMIC");
        assert_eq!(value["header"]["packet_number"], 1);
        assert_eq!(value["header"]["timestamp"], "2023-10-15T14:30:45");
        assert_eq!(value["header"]["location"], 1000);
        assert_eq!(value["header"]["speed"], 120);
        assert_eq!(value["data"]["v_train"], 120);
        assert_eq!(value["data"]["a_train"], 10);
        assert_eq!(value["data"]["m_slip"], 1);
        assert_eq!(value["data"]["o_bcsp"], 3000);
    }

    #[test]
    fn passthrough_data_is_null() {
        let data = frame(91, &[0xAB, 0xCD]);
        let (header, body, _) = Header::parse_frame(&data).unwrap();
        let record = Record::new(
            header,
            Payload::Passthrough {
                family: PacketFamily::from_packet_type(91).unwrap(),
                body: body.to_vec(),
            },
        );

        let value = to_json(&record);
        assert_eq!(value["description"], "PRS_INFO");
        assert!(value["data"].is_null());
    }

    #[test]
    fn unknown_data_is_null_with_description() {
        let data = frame(0xFE, &[]);
        let (header, _, _) = Header::parse_frame(&data).unwrap();
        let record = Record::new(header, Payload::Unknown { body: Vec::new() });

        let value = to_json(&record);
        assert_eq!(value["description"], "UNKNOWN");
        assert!(value["data"].is_null());
    }

    #[test]
    fn text_row_labels_fields() {
        let row = to_row(&sample_record());
        assert!(row.starts_with("2023-10-15T14:30:45 type=001 MMI_DYNAMIC"));
        assert!(row.contains("loc=1000m"));
        assert!(row.contains("v_train=120"));
        assert!(row.contains("m_slide=0"));
    }

    #[test]
    fn status_row_and_json_agree_on_fields() {
        let record = Record::new(
            sample_record().header,
            Payload::MmiStatus(MmiStatus::decode(&[9, 8, 7, 6, 5, 4, 3, 2]).unwrap()),
        );
        let row = to_row(&record);
        let value = to_json(&record);
        assert!(row.contains("m_adhesion=9"));
        assert_eq!(value["data"]["m_adhesion"], 9);
        assert!(row.contains("m_active_cabin=2"));
        assert_eq!(value["data"]["m_active_cabin"], 2);
    }

    #[test]
    fn hex_rendering_is_spaced_uppercase() {
        assert_eq!(hex_string(&[0x0A, 0xFF, 0x00]), "0A FF 00");
        assert_eq!(hex_string(&[]), "");
    }
}
