//! Protocol revision tags and the command vocabulary each of them carries.
//!
//! A device reports its protocol revision during the handshake; every request
//! builder then resolves command names through the negotiated revision, so a
//! feature that entered the protocol later simply produces no bytes when the
//! device predates it.

use std::fmt::{Display, Formatter};

use crate::protocol::constants::*;

/// A `(name, opcode)` vocabulary slice contributed by one protocol generation.
type CommandSet = &'static [(&'static str, u8)];

/// Vocabulary shared by every supported revision.
const BASE_COMMANDS: CommandSet = &[
    ("ANALOG_MESSAGE", ANALOG_MESSAGE),
    ("DIGITAL_MESSAGE", DIGITAL_MESSAGE),
    ("REPORT_ANALOG", REPORT_ANALOG),
    ("REPORT_DIGITAL", REPORT_DIGITAL),
    ("SET_PIN_MODE", SET_PIN_MODE),
    ("REPORT_VERSION", REPORT_VERSION),
    ("SYSTEM_RESET", SYSTEM_RESET),
    ("START_SYSEX", START_SYSEX),
    ("END_SYSEX", END_SYSEX),
    ("RESERVED_COMMAND", RESERVED_COMMAND),
    ("ANALOG_MAPPING_QUERY", ANALOG_MAPPING_QUERY),
    ("ANALOG_MAPPING_RESPONSE", ANALOG_MAPPING_RESPONSE),
    ("CAPABILITY_QUERY", CAPABILITY_QUERY),
    ("CAPABILITY_RESPONSE", CAPABILITY_RESPONSE),
    ("PIN_STATE_QUERY", PIN_STATE_QUERY),
    ("PIN_STATE_RESPONSE", PIN_STATE_RESPONSE),
    ("EXTENDED_ANALOG", EXTENDED_ANALOG),
    ("SERVO_CONFIG", SERVO_CONFIG),
    ("STRING_DATA", STRING_DATA),
    ("SHIFT_DATA", SHIFT_DATA),
    ("I2C_REQUEST", I2C_REQUEST),
    ("I2C_REPLY", I2C_REPLY),
    ("I2C_CONFIG", I2C_CONFIG),
    ("REPORT_FIRMWARE", REPORT_FIRMWARE),
    ("SAMPLING_INTERVAL", SAMPLING_INTERVAL),
    ("SYSEX_NON_REALTIME", SYSEX_NON_REALTIME),
    ("SYSEX_REALTIME", SYSEX_REALTIME),
];

/// Features that entered the protocol with the 2.3 firmware generation.
const V_2_03_COMMANDS: CommandSet = &[
    ("STEPPER_DATA", STEPPER_DATA),
    ("ONEWIRE_DATA", ONEWIRE_DATA),
    ("SCHEDULER_DATA", SCHEDULER_DATA),
];

/// Features that entered the protocol with the 2.5 firmware generation.
const V_2_05_COMMANDS: CommandSet = &[
    ("SET_DIGITAL_PIN_VALUE", SET_DIGITAL_PIN_VALUE),
    ("SERIAL_DATA", SERIAL_DATA),
    ("ENCODER_DATA", ENCODER_DATA),
    ("ACCELSTEPPER_DATA", ACCELSTEPPER_DATA),
];

/// A supported protocol revision. Tags order the same way the revisions do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProtocolVersion {
    V2_01,
    V2_02,
    V2_03,
    V2_04,
    V2_05,
    V2_06,
}

impl ProtocolVersion {
    /// Oldest revision the codec speaks; the negotiation floor.
    pub const MINIMUM: ProtocolVersion = ProtocolVersion::V2_01;
    /// Newest revision the codec speaks; the session default.
    pub const LATEST: ProtocolVersion = ProtocolVersion::V2_06;

    /// Every supported revision, oldest first.
    pub const ALL: [ProtocolVersion; 6] = [
        ProtocolVersion::V2_01,
        ProtocolVersion::V2_02,
        ProtocolVersion::V2_03,
        ProtocolVersion::V2_04,
        ProtocolVersion::V2_05,
        ProtocolVersion::V2_06,
    ];

    /// The wire-format tag of this revision, e.g. `V_2_05`.
    pub fn tag(&self) -> &'static str {
        match self {
            ProtocolVersion::V2_01 => "V_2_01",
            ProtocolVersion::V2_02 => "V_2_02",
            ProtocolVersion::V2_03 => "V_2_03",
            ProtocolVersion::V2_04 => "V_2_04",
            ProtocolVersion::V2_05 => "V_2_05",
            ProtocolVersion::V2_06 => "V_2_06",
        }
    }

    fn command_sets(&self) -> &'static [CommandSet] {
        match self {
            ProtocolVersion::V2_01 | ProtocolVersion::V2_02 => &[BASE_COMMANDS],
            ProtocolVersion::V2_03 | ProtocolVersion::V2_04 => &[BASE_COMMANDS, V_2_03_COMMANDS],
            ProtocolVersion::V2_05 | ProtocolVersion::V2_06 => {
                &[BASE_COMMANDS, V_2_03_COMMANDS, V_2_05_COMMANDS]
            }
        }
    }

    /// Resolves a command name to its opcode within this revision's vocabulary.
    pub fn command(&self, name: &str) -> Option<u8> {
        self.command_sets()
            .iter()
            .flat_map(|set| set.iter())
            .find(|(n, _)| *n == name)
            .map(|(_, opcode)| *opcode)
    }

    /// Resolves an opcode back to its symbolic name within this revision's
    /// vocabulary.
    pub fn command_name(&self, opcode: u8) -> Option<&'static str> {
        self.command_sets()
            .iter()
            .flat_map(|set| set.iter())
            .find(|(_, op)| *op == opcode)
            .map(|(name, _)| *name)
    }

    /// Whether this revision's vocabulary contains the named command.
    pub fn supports(&self, name: &str) -> bool {
        self.command(name).is_some()
    }

    /// Picks the revision to speak against a device reporting `tag`: the exact
    /// match when supported, else the newest supported revision older than the
    /// report, else [`ProtocolVersion::MINIMUM`].
    pub fn negotiate(reported: &str) -> ProtocolVersion {
        Self::ALL
            .iter()
            .rev()
            .find(|version| version.tag() <= reported)
            .copied()
            .unwrap_or(Self::MINIMUM)
    }

    /// Forms the revision from the `(major, minor)` pair of a REPORT_VERSION
    /// message and negotiates it down to a supported one.
    pub fn from_report(major: u8, minor: u8) -> ProtocolVersion {
        Self::negotiate(&format!("V_{}_{:02}", major, minor))
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_ordering() {
        assert_eq!(ProtocolVersion::V2_01.to_string(), "V_2_01");
        assert_eq!(ProtocolVersion::V2_06.to_string(), "V_2_06");
        assert!(ProtocolVersion::V2_01 < ProtocolVersion::V2_04);
        assert_eq!(ProtocolVersion::default(), ProtocolVersion::V2_06);
    }

    #[test]
    fn test_vocabulary_gating() {
        // The base vocabulary is present everywhere.
        for version in ProtocolVersion::ALL {
            assert_eq!(version.command("DIGITAL_MESSAGE"), Some(DIGITAL_MESSAGE));
            assert_eq!(version.command("REPORT_FIRMWARE"), Some(REPORT_FIRMWARE));
        }

        // 1-Wire, stepper and scheduler entered with 2.3.
        assert!(!ProtocolVersion::V2_02.supports("ONEWIRE_DATA"));
        assert_eq!(ProtocolVersion::V2_03.command("ONEWIRE_DATA"), Some(ONEWIRE_DATA));
        assert_eq!(ProtocolVersion::V2_04.command("SCHEDULER_DATA"), Some(SCHEDULER_DATA));

        // Serial, encoder and AccelStepper entered with 2.5.
        assert!(!ProtocolVersion::V2_04.supports("ACCELSTEPPER_DATA"));
        assert_eq!(
            ProtocolVersion::V2_05.command("ACCELSTEPPER_DATA"),
            Some(ACCELSTEPPER_DATA)
        );
        assert_eq!(ProtocolVersion::V2_06.command("SERIAL_DATA"), Some(SERIAL_DATA));

        assert_eq!(ProtocolVersion::V2_06.command("NOT_A_COMMAND"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(
            ProtocolVersion::V2_06.command_name(DIGITAL_MESSAGE),
            Some("DIGITAL_MESSAGE")
        );
        assert_eq!(ProtocolVersion::V2_06.command_name(START_SYSEX), Some("START_SYSEX"));
        assert_eq!(ProtocolVersion::V2_02.command_name(ONEWIRE_DATA), None);
        assert_eq!(ProtocolVersion::V2_06.command_name(0x63), None);
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(ProtocolVersion::negotiate("V_2_04"), ProtocolVersion::V2_04);
        assert_eq!(ProtocolVersion::negotiate("V_2_99"), ProtocolVersion::V2_06);
        assert_eq!(ProtocolVersion::negotiate("V_3_00"), ProtocolVersion::V2_06);
        assert_eq!(ProtocolVersion::negotiate("V_2_00"), ProtocolVersion::V2_01);
        assert_eq!(ProtocolVersion::negotiate("V_1_54"), ProtocolVersion::V2_01);
    }

    #[test]
    fn test_from_report() {
        assert_eq!(ProtocolVersion::from_report(2, 5), ProtocolVersion::V2_05);
        assert_eq!(ProtocolVersion::from_report(2, 7), ProtocolVersion::V2_06);
        assert_eq!(ProtocolVersion::from_report(1, 9), ProtocolVersion::V2_01);
    }
}
