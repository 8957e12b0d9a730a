//! Passthrough packet family tags.
//!
//! Most vehicle-bus packet types carry no decodable body layout; the
//! dispatcher passes them through with a family tag naming what the
//! recorder logged. Tag names follow the recorder's own vocabulary.

use serde::Serialize;
use std::fmt;

/// Packet family of a passthrough record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PacketFamily {
    VdxInStatus1,
    VdxOut1,
    VdxOut2,
    VdxOut3,
    DxInStatus1,
    DxStatus1,
    OutStatus1,
    BtmCommand1,
    BtmStatus1,
    Sdu1,
    Sdu2,
    OdoConfig1,
    OdoMessage1,
    OdoMessage2,
    OdoBtmStatus1,
    PmLogTgm,
    PmAppLogTgm,
    PrsInfo,
    AtpDown,
    PeriodicSpeedDistance,
    ButtonEvent,
    StatusCounterBoard,
    StatusUsb,
    StatusPrs,
    StatusSpeedmeter,
    StatusDataDownload,
    StatusRecorder,
    StatusMvb,
    StatusGpp,
}

impl PacketFamily {
    /// Maps a packet-type byte to its passthrough family, if it has one.
    pub fn from_packet_type(packet_type: u8) -> Option<Self> {
        use PacketFamily::*;
        let family = match packet_type {
            21 => VdxInStatus1,
            22 => VdxOut1,
            23 => VdxOut2,
            24 => VdxOut3,
            31 => DxInStatus1,
            32 => DxStatus1,
            33 => OutStatus1,
            41 => BtmCommand1,
            42 => BtmStatus1,
            51 => Sdu1,
            52 => Sdu2,
            61 => OdoConfig1,
            62 => OdoMessage1,
            63 => OdoMessage2,
            64 => OdoBtmStatus1,
            71 => PmLogTgm,
            72 => PmAppLogTgm,
            91 => PrsInfo,
            201 => AtpDown,
            211 => PeriodicSpeedDistance,
            216 => ButtonEvent,
            221 => StatusCounterBoard,
            222 => StatusUsb,
            223 => StatusPrs,
            224 => StatusSpeedmeter,
            225 => StatusDataDownload,
            226 => StatusRecorder,
            227 => StatusMvb,
            228 => StatusGpp,
            _ => return None,
        };
        Some(family)
    }

    /// Stable display name, matching the recorder's log vocabulary.
    pub fn description(&self) -> &'static str {
        use PacketFamily::*;
        match self {
            VdxInStatus1 => "MVB_LOG_TYPE_VDX_IN_STATUS_1",
            VdxOut1 => "MVB_LOG_TYPE_VDX_OUT_1",
            VdxOut2 => "MVB_LOG_TYPE_VDX_OUT_2",
            VdxOut3 => "MVB_LOG_TYPE_VDX_OUT_3",
            DxInStatus1 => "MVB_LOG_TYPE_DX_IN_STATUS_1",
            DxStatus1 => "MVB_LOG_TYPE_DX_STATUS_1",
            OutStatus1 => "MVB_LOG_TYPE_OUT_STATUS_1",
            BtmCommand1 => "MVB_LOG_BTM_COMMAND_1",
            BtmStatus1 => "MVB_LOG_BTM_STATUS_1",
            Sdu1 => "MVB_LOG_SDU1",
            Sdu2 => "MVB_LOG_SDU2",
            OdoConfig1 => "MVB_LOG_ODO_CONFIG_1",
            OdoMessage1 => "MVB_LOG_ODO_MESSAGE_1",
            OdoMessage2 => "MVB_LOG_ODO_MESSAGE_2",
            OdoBtmStatus1 => "MVB_LOG_ODO_BTM_STATUS_1",
            PmLogTgm => "MVB_LOG_PM_LOG_TGM",
            PmAppLogTgm => "MVB_LOG_PM_APP_LOG_TGM",
            PrsInfo => "PRS_INFO",
            AtpDown => "ATP_DOWN",
            PeriodicSpeedDistance => "PERIODIC_SPEED_DISTANCE",
            ButtonEvent => "BUTTON_EVENT",
            StatusCounterBoard => "STATUS_COUNTER_BOARD",
            StatusUsb => "STATUS_USB",
            StatusPrs => "STATUS_PRS",
            StatusSpeedmeter => "STATUS_SPEEDMETER",
            StatusDataDownload => "STATUS_DATA_DOWNLOAD",
            StatusRecorder => "STATUS_RECORDER",
            StatusMvb => "STATUS_MVB",
            StatusGpp => "STATUS_GPP",
        }
    }
}

impl fmt::Display for PacketFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_ranges_are_covered() {
        let mapped: &[u8] = &[
            21, 22, 23, 24, 31, 32, 33, 41, 42, 51, 52, 61, 62, 63, 64, 71, 72, 91, 201, 211, 216,
            221, 222, 223, 224, 225, 226, 227, 228,
        ];
        for &t in mapped {
            assert!(PacketFamily::from_packet_type(t).is_some(), "type {t} should map");
        }
    }

    #[test]
    fn decoded_and_fragment_types_do_not_map() {
        for t in [0u8, 1, 2, 3, 4, 8, 9, 43, 44, 45, 46, 47, 100, 255] {
            assert!(PacketFamily::from_packet_type(t).is_none(), "type {t} should not map");
        }
    }

    #[test]
    fn descriptions_follow_recorder_vocabulary() {
        assert_eq!(
            PacketFamily::from_packet_type(21).unwrap().description(),
            "MVB_LOG_TYPE_VDX_IN_STATUS_1"
        );
        assert_eq!(
            PacketFamily::from_packet_type(42).unwrap().description(),
            "MVB_LOG_BTM_STATUS_1"
        );
        assert_eq!(PacketFamily::from_packet_type(201).unwrap().to_string(), "ATP_DOWN");
    }
}
