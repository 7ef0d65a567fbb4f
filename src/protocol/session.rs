//! The codec session: parser state plus the negotiated protocol revision.

use std::fmt::{Display, Formatter};

use crate::errors::Error;
use crate::protocol::constants::*;
use crate::protocol::encoding::{encode_14bit, encode_double_7bit};
use crate::protocol::parser::{Packet, Parser};
use crate::protocol::sysex::{sysex_parse, SysexResponse};
use crate::protocol::version::ProtocolVersion;

/// Owns one device conversation: the framing state for inbound bytes and the
/// protocol revision gating the outbound vocabulary.
///
/// Decoding mutates the session; every request builder is a pure function of
/// the revision. Sessions are independent of each other and perform no
/// interior synchronization; driving one session from two threads at once is
/// a caller bug.
#[derive(Clone, Debug, Default)]
pub struct Session {
    version: ProtocolVersion,
    parser: Parser,
}

impl Session {
    /// Creates a session speaking the given protocol revision.
    ///
    /// [`Session::default`] speaks [`ProtocolVersion::LATEST`]; pair with
    /// [`ProtocolVersion::negotiate`] once the device has reported its
    /// revision.
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            parser: Parser::default(),
        }
    }

    /// The revision this session speaks.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Switches the spoken revision, e.g. after the handshake reported an
    /// older device. Framing state is unaffected.
    pub fn set_version(&mut self, version: ProtocolVersion) {
        self.version = version;
    }

    // ########################################
    // Decoding

    /// Appends inbound bytes and returns every packet they completed, oldest
    /// first. Partial packets stay buffered until more bytes arrive.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<Packet> {
        self.parser.decode(bytes, self.version)
    }

    /// Interprets a reassembled SysEx payload (the concatenated data of the
    /// `DATA_SYSEX` packets of one envelope) as a feature response.
    pub fn sysex_parse(&self, payload: &[u8]) -> Result<SysexResponse, Error> {
        sysex_parse(self.version, payload)
    }

    // ########################################
    // Generic encoding

    /// Builds a short MIDI-style message: the command opcode with `channel` in
    /// its low nibble, followed by `data`. Empty when the command is not part
    /// of this revision's vocabulary.
    pub fn message(&self, command: &str, channel: u8, data: &[u8]) -> Vec<u8> {
        let Some(opcode) = self.version.command(command) else {
            return Vec::new();
        };
        let mut bytes = Vec::with_capacity(1 + data.len());
        bytes.push(opcode | (channel & 0x0F));
        bytes.extend_from_slice(data);
        bytes
    }

    /// Wraps a payload in a `START_SYSEX .. END_SYSEX` envelope.
    pub fn sysex(&self, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + payload.len());
        bytes.push(START_SYSEX);
        bytes.extend_from_slice(payload);
        bytes.push(END_SYSEX);
        bytes
    }

    /// Wraps a payload in a SysEx envelope with the command opcode prefixed.
    /// Empty when the command is not part of this revision's vocabulary.
    pub fn sysex_command(&self, command: &str, payload: &[u8]) -> Vec<u8> {
        let Some(opcode) = self.version.command(command) else {
            return Vec::new();
        };
        let mut bytes = Vec::with_capacity(3 + payload.len());
        bytes.push(START_SYSEX);
        bytes.push(opcode);
        bytes.extend_from_slice(payload);
        bytes.push(END_SYSEX);
        bytes
    }

    // ########################################
    // Protocol queries

    /// Asks the board for its protocol version.
    /// <https://github.com/firmata/protocol/blob/master/protocol.md#message-types>
    pub fn query_version(&self) -> Vec<u8> {
        self.message("REPORT_VERSION", 0, &[])
    }

    /// Asks the board for its firmware name and version.
    pub fn query_firmware(&self) -> Vec<u8> {
        self.sysex_command("REPORT_FIRMWARE", &[])
    }

    /// Asks the board for supported modes and resolution of all pins.
    pub fn query_capabilities(&self) -> Vec<u8> {
        self.sysex_command("CAPABILITY_QUERY", &[])
    }

    /// Asks the board for the mapping of analog channels to pin numbers.
    pub fn query_analog_mapping(&self) -> Vec<u8> {
        self.sysex_command("ANALOG_MAPPING_QUERY", &[])
    }

    /// Asks the board for the current mode and value of a pin.
    pub fn query_pin_state(&self, pin: u8) -> Vec<u8> {
        self.sysex_command("PIN_STATE_QUERY", &[pin])
    }

    /// Requests a board software reset.
    pub fn system_reset(&self) -> Vec<u8> {
        self.message("SYSTEM_RESET", 0, &[])
    }

    // ########################################
    // Read/Write on pins

    /// Sets a pin to INPUT/OUTPUT/PWM/etc.
    pub fn set_pin_mode(&self, pin: u8, mode: u8) -> Vec<u8> {
        self.message("SET_PIN_MODE", 0, &[pin, mode])
    }

    /// Sets the value of a single digital pin. Requires the 2.5 vocabulary;
    /// earlier revisions must write the whole port instead.
    pub fn set_digital_pin_value(&self, pin: u8, level: bool) -> Vec<u8> {
        self.message("SET_DIGITAL_PIN_VALUE", 0, &[pin, u8::from(level)])
    }

    /// Writes the 8-pin bitmask of a digital port.
    /// <https://github.com/firmata/protocol/blob/master/protocol.md#data-message-expansion>
    pub fn digital_message(&self, port: u8, value: u16) -> Vec<u8> {
        self.message("DIGITAL_MESSAGE", port, &encode_14bit(value))
    }

    /// Writes an analog value (PWM, Servo, etc) to an analog channel.
    pub fn analog_message(&self, channel: u8, value: u16) -> Vec<u8> {
        self.message("ANALOG_MESSAGE", channel, &encode_14bit(value))
    }

    /// Analog write to any pin number, spilling values above 14 bits into
    /// extra 7-bit bytes.
    pub fn extended_analog(&self, pin: u8, value: u32) -> Vec<u8> {
        let mut payload = vec![pin, (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8];
        let mut rest = value >> 14;
        while rest > 0 {
            payload.push((rest & 0x7F) as u8);
            rest >>= 7;
        }
        self.sysex_command("EXTENDED_ANALOG", &payload)
    }

    /// Enables or disables value reporting for an analog channel.
    pub fn report_analog(&self, channel: u8, state: bool) -> Vec<u8> {
        self.message("REPORT_ANALOG", channel, &[u8::from(state)])
    }

    /// Enables or disables value reporting for a digital port.
    pub fn report_digital(&self, port: u8, state: bool) -> Vec<u8> {
        self.message("REPORT_DIGITAL", port, &[u8::from(state)])
    }

    /// Sets the poll rate of the board main loop, in milliseconds.
    pub fn sampling_interval(&self, interval: u16) -> Vec<u8> {
        self.sysex_command("SAMPLING_INTERVAL", &encode_14bit(interval))
    }

    /// Configures the pulse range of a servo pin.
    /// <https://github.com/firmata/protocol/blob/master/servos.md>
    pub fn servo_config(&self, pin: u8, min_pulse: u16, max_pulse: u16) -> Vec<u8> {
        let mut payload = vec![pin];
        payload.extend(encode_14bit(min_pulse));
        payload.extend(encode_14bit(max_pulse));
        self.sysex_command("SERVO_CONFIG", &payload)
    }

    /// Sends a text message, 14 bits per character.
    pub fn string_data(&self, text: &str) -> Vec<u8> {
        self.sysex_command("STRING_DATA", &encode_double_7bit(text.as_bytes()))
    }

    // ########################################
    // I2C

    /// Configures the delay between writing to and reading from an I2C
    /// register, in microseconds.
    /// <https://github.com/firmata/protocol/blob/master/i2c.md>
    pub fn i2c_config(&self, delay: u16) -> Vec<u8> {
        self.sysex_command("I2C_CONFIG", &encode_14bit(delay))
    }

    /// Builds a raw I2C request. 10-bit addresses set the extended address
    /// mode flag and carry their top bits in the flags byte; `data` values
    /// travel as 14-bit pairs.
    pub fn i2c_request(&self, address: u16, mode: I2cMode, data: &[u16]) -> Vec<u8> {
        let mut flags = (mode as u8) << 3;
        if address > 0x7F {
            flags |= I2C_10BIT_ADDRESS_MODE_MASK | (((address >> 7) & 0x07) as u8);
        }
        let mut payload = vec![(address & 0x7F) as u8, flags];
        for &value in data {
            payload.extend(encode_14bit(value));
        }
        self.sysex_command("I2C_REQUEST", &payload)
    }

    /// Reads `count` bytes from the device at `address`, optionally from a
    /// specific register.
    pub fn i2c_read(&self, address: u16, register: Option<u16>, count: u16) -> Vec<u8> {
        let mut data = Vec::with_capacity(2);
        if let Some(register) = register {
            data.push(register);
        }
        data.push(count);
        self.i2c_request(address, I2cMode::Read, &data)
    }

    /// Writes `data` to the device at `address`.
    pub fn i2c_write(&self, address: u16, data: &[u16]) -> Vec<u8> {
        self.i2c_request(address, I2cMode::Write, data)
    }
}

impl Display for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session [version={}]", self.version)
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::format_as_hex;

    use super::*;

    #[test]
    fn test_creation() {
        let session = Session::default();
        assert_eq!(session.version(), ProtocolVersion::V2_06);

        let mut session = Session::new(ProtocolVersion::V2_03);
        assert_eq!(session.version(), ProtocolVersion::V2_03);
        session.set_version(ProtocolVersion::V2_05);
        assert_eq!(session.version(), ProtocolVersion::V2_05);
    }

    #[test]
    fn test_message_unknown_command() {
        let session = Session::default();
        assert!(session.message("NOT_A_COMMAND", 0, &[]).is_empty());
        assert!(session.sysex_command("NOT_A_COMMAND", &[0x01]).is_empty());
    }

    #[test]
    fn test_vocabulary_gates_builders() {
        // SET_DIGITAL_PIN_VALUE entered with 2.5: older sessions refuse it.
        let session = Session::new(ProtocolVersion::V2_04);
        assert!(session.set_digital_pin_value(3, true).is_empty());

        let session = Session::new(ProtocolVersion::V2_05);
        assert_eq!(session.set_digital_pin_value(3, true), vec![0xF5, 0x03, 0x01]);
    }

    #[test]
    fn test_queries() {
        let session = Session::default();
        assert_eq!(session.query_version(), vec![0xF9]);
        assert_eq!(session.query_firmware(), vec![0xF0, 0x79, 0xF7]);
        assert_eq!(session.query_capabilities(), vec![0xF0, 0x6B, 0xF7]);
        assert_eq!(session.query_analog_mapping(), vec![0xF0, 0x69, 0xF7]);
        assert_eq!(session.query_pin_state(13), vec![0xF0, 0x6D, 0x0D, 0xF7]);
        assert_eq!(session.system_reset(), vec![0xFF]);
    }

    #[test]
    fn test_set_pin_mode() {
        let session = Session::default();
        let bytes = session.set_pin_mode(8, PIN_MODE_OUTPUT);
        assert_eq!(
            bytes,
            vec![0xF4, 0x08, 0x01],
            "unexpected bytes [{}]",
            format_as_hex(&bytes)
        );
    }

    #[test]
    fn test_digital_message() {
        let session = Session::default();
        let bytes = session.digital_message(1, 0xFF);
        assert_eq!(
            bytes,
            vec![0x91, 0x7F, 0x01],
            "unexpected bytes [{}]",
            format_as_hex(&bytes)
        );
    }

    #[test]
    fn test_analog_message() {
        let session = Session::default();
        assert_eq!(session.analog_message(0, 170), vec![0xE0, 0x2A, 0x01]);
    }

    #[test]
    fn test_extended_analog() {
        let session = Session::default();
        // Values above 14 bits spill into a third data byte.
        assert_eq!(
            session.extended_analog(22, 17000),
            vec![0xF0, 0x6F, 0x16, 0x68, 0x04, 0x01, 0xF7]
        );
        assert_eq!(
            session.extended_analog(2, 100),
            vec![0xF0, 0x6F, 0x02, 0x64, 0x00, 0xF7]
        );
    }

    #[test]
    fn test_reporting() {
        let session = Session::default();
        assert_eq!(session.report_analog(2, true), vec![0xC2, 0x01]);
        assert_eq!(session.report_analog(3, false), vec![0xC3, 0x00]);
        assert_eq!(session.report_digital(1, true), vec![0xD1, 0x01]);
    }

    #[test]
    fn test_sampling_interval() {
        let session = Session::default();
        assert_eq!(session.sampling_interval(100), vec![0xF0, 0x7A, 0x64, 0x00, 0xF7]);
    }

    #[test]
    fn test_servo_config() {
        let session = Session::default();
        assert_eq!(
            session.servo_config(8, 500, 2500),
            vec![0xF0, 0x70, 0x08, 0x74, 0x03, 0x44, 0x13, 0xF7]
        );
    }

    #[test]
    fn test_string_data() {
        let session = Session::default();
        assert_eq!(
            session.string_data("AB"),
            vec![0xF0, 0x71, 0x41, 0x00, 0x42, 0x00, 0xF7]
        );
    }

    #[test]
    fn test_i2c_config() {
        let session = Session::default();
        assert_eq!(session.i2c_config(100), vec![0xF0, 0x78, 0x64, 0x00, 0xF7]);
    }

    #[test]
    fn test_i2c_read() {
        let session = Session::default();
        assert_eq!(
            session.i2c_read(0x40, None, 4),
            vec![0xF0, 0x76, 0x40, 0x08, 0x04, 0x00, 0xF7]
        );
        assert_eq!(
            session.i2c_read(0x40, Some(0x20), 2),
            vec![0xF0, 0x76, 0x40, 0x08, 0x20, 0x00, 0x02, 0x00, 0xF7]
        );
    }

    #[test]
    fn test_i2c_write() {
        let session = Session::default();
        assert_eq!(
            session.i2c_write(0x40, &[0x01, 0x02, 0x03]),
            vec![0xF0, 0x76, 0x40, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0xF7]
        );
    }

    #[test]
    fn test_i2c_10bit_address() {
        let session = Session::default();
        // Address 0x1A5 = high bits 0b011 in the flags byte, low 7 bits first.
        let bytes = session.i2c_request(0x1A5, I2cMode::StopReading, &[]);
        assert_eq!(bytes[2], 0x25);
        assert_eq!(bytes[3], (3 << 3) | I2C_10BIT_ADDRESS_MODE_MASK | 0x03);
    }

    #[test]
    fn test_decode_round_trip() {
        // Request bytes produced by one session frame cleanly through another.
        let writer = Session::default();
        let mut reader = Session::default();

        let mut stream = writer.digital_message(0, 0x01);
        stream.extend(writer.query_firmware());
        stream.extend(writer.report_analog(1, true));

        let packets = reader.decode(&stream);
        assert_eq!(packets.len(), 5);
        assert_eq!(packets[0].name, "DIGITAL_MESSAGE");
        assert_eq!(packets[1].name, "START_SYSEX");
        assert_eq!(packets[2].name, "DATA_SYSEX");
        assert_eq!(packets[2].data, vec![0x79]);
        assert_eq!(packets[3].name, "END_SYSEX");
        assert_eq!(packets[4].name, "REPORT_ANALOG");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", Session::new(ProtocolVersion::V2_04)),
            "Session [version=V_2_04]"
        );
    }
}
