//! Segments the inbound byte stream into packets.
//!
//! The stream interleaves three shapes: short MIDI-style channel messages
//! (status byte + 1 or 2 data bytes), status-only messages, and variable
//! length SysEx envelopes (`0xF0 .. 0xF7`). Firmata additionally allows a
//! "realtime" status byte to interrupt an open envelope, so SysEx is a toggle
//! rather than a nested parse: an interrupting short message is dispatched
//! immediately and payload accumulation resumes afterwards.

use std::collections::VecDeque;

use log::trace;

use crate::protocol::constants::*;
use crate::protocol::version::ProtocolVersion;

/// Name reported for status bytes absent from the active vocabulary.
pub const UNKNOWN: &str = "UNKNOWN";
/// Name carried by packets holding raw SysEx payload bytes.
pub const DATA_SYSEX: &str = "DATA_SYSEX";

/// One framed unit segmented from the inbound stream.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Packet {
    /// The status byte that opened the packet, `0` for SysEx payload runs.
    pub command: u8,
    /// Symbolic command name from the session vocabulary, [`UNKNOWN`] when the
    /// opcode has no entry, [`DATA_SYSEX`] for payload runs.
    pub name: &'static str,
    /// Data bytes following the status byte, every one `<= 0x7F`.
    pub data: Vec<u8>,
}

impl Packet {
    fn status(command: u8, version: ProtocolVersion, data: Vec<u8>) -> Self {
        let name = version
            .command_name(command)
            .or_else(|| version.command_name(command & 0xF0))
            .unwrap_or(UNKNOWN);
        Self { command, name, data }
    }

    fn data_sysex(byte: u8) -> Self {
        Self {
            command: 0,
            name: DATA_SYSEX,
            data: vec![byte],
        }
    }
}

/// Count of data bytes following a status byte: indexed by the full byte
/// first, falling back to its high nibble.
fn data_length(command: u8) -> usize {
    match command {
        SET_PIN_MODE | REPORT_VERSION => 2,
        STRING_DATA | SYSTEM_RESET | START_SYSEX => 0,
        _ => match command & 0xF0 {
            0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => 2,
            0xC0 | 0xD0 => 1,
            _ => 0,
        },
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ParserMode {
    #[default]
    Normal,
    InsideSysex,
}

/// The two-state framing machine. Bytes append to an internal buffer; a drain
/// pass emits every completed packet and leaves partial ones buffered.
#[derive(Clone, Debug, Default)]
pub(crate) struct Parser {
    mode: ParserMode,
    buffer: VecDeque<u8>,
    /// SysEx payload run not yet closed by `END_SYSEX` or an interrupting
    /// status byte. Held back so that chunked feeding emits the same packets
    /// as a single call.
    pending: Option<Packet>,
}

impl Parser {
    /// Appends `bytes` and drains every packet completed by them, in the
    /// order their final bytes arrived.
    pub fn decode(&mut self, bytes: &[u8], version: ProtocolVersion) -> Vec<Packet> {
        self.buffer.extend(bytes);
        let mut packets = Vec::new();

        while let Some(&byte) = self.buffer.front() {
            if byte == START_SYSEX && self.mode == ParserMode::Normal {
                self.buffer.pop_front();
                packets.push(Packet::status(START_SYSEX, version, vec![]));
                self.mode = ParserMode::InsideSysex;
            } else if byte == END_SYSEX && self.mode == ParserMode::InsideSysex {
                self.flush_pending(&mut packets);
                self.buffer.pop_front();
                packets.push(Packet::status(END_SYSEX, version, vec![]));
                self.mode = ParserMode::Normal;
            } else if byte & 0x80 != 0 {
                // Short or status-only message; dispatched immediately even
                // inside an envelope, without toggling the SysEx state.
                let length = 1 + data_length(byte);
                if self.buffer.len() < length {
                    break;
                }
                self.flush_pending(&mut packets);
                self.buffer.pop_front();
                let data: Vec<u8> = self.buffer.drain(..length - 1).collect();
                packets.push(Packet::status(byte, version, data));
            } else if self.mode == ParserMode::InsideSysex {
                self.buffer.pop_front();
                match &mut self.pending {
                    Some(packet) => packet.data.push(byte),
                    None => self.pending = Some(Packet::data_sysex(byte)),
                }
            } else {
                // Out-of-band data byte: drop it and resynchronise on the next
                // status byte.
                trace!("dropping out-of-band data byte 0x{:02X}", byte);
                self.buffer.pop_front();
            }
        }

        packets
    }

    fn flush_pending(&mut self, packets: &mut Vec<Packet>) {
        if let Some(packet) = self.pending.take() {
            packets.push(packet);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(parser: &mut Parser, bytes: &[u8]) -> Vec<Packet> {
        parser.decode(bytes, ProtocolVersion::default())
    }

    #[test]
    fn test_short_message() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0x90, 0x3C, 0x7F]);
        assert_eq!(
            packets,
            vec![Packet {
                command: 0x90,
                name: "DIGITAL_MESSAGE",
                data: vec![0x3C, 0x7F],
            }]
        );
    }

    #[test]
    fn test_channel_nibble_resolves_to_nibble_name() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0xE5, 0x01, 0x02, 0xC3, 0x01]);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].command, 0xE5);
        assert_eq!(packets[0].name, "ANALOG_MESSAGE");
        assert_eq!(packets[1].command, 0xC3);
        assert_eq!(packets[1].name, "REPORT_ANALOG");
        assert_eq!(packets[1].data, vec![0x01]);
    }

    #[test]
    fn test_incomplete_then_completed() {
        let mut parser = Parser::default();
        assert!(decode(&mut parser, &[0xE0, 0x00]).is_empty());
        let packets = decode(&mut parser, &[0x40]);
        assert_eq!(
            packets,
            vec![Packet {
                command: 0xE0,
                name: "ANALOG_MESSAGE",
                data: vec![0x00, 0x40],
            }]
        );
    }

    #[test]
    fn test_status_only_messages() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0xFF, 0xF9, 0x02, 0x05]);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].name, "SYSTEM_RESET");
        assert!(packets[0].data.is_empty());
        assert_eq!(packets[1].name, "REPORT_VERSION");
        assert_eq!(packets[1].data, vec![0x02, 0x05]);
    }

    #[test]
    fn test_unknown_status_byte() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0x85, 0x01, 0x02]);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].command, 0x85);
        assert_eq!(packets[0].name, UNKNOWN);
        assert_eq!(packets[0].data, vec![0x01, 0x02]);
    }

    #[test]
    fn test_junk_data_byte_dropped() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0x42, 0x13, 0x90, 0x01, 0x00]);
        assert_eq!(packets.len(), 1, "junk bytes resynchronise silently");
        assert_eq!(packets[0].command, 0x90);
        assert_eq!(packets[0].data, vec![0x01, 0x00]);
    }

    #[test]
    fn test_sysex_envelope() {
        let mut parser = Parser::default();
        let packets = decode(
            &mut parser,
            &[0xF0, 0x79, 0x02, 0x05, 0x41, 0x00, 0x42, 0x00, 0xF7],
        );
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].name, "START_SYSEX");
        assert_eq!(packets[1].name, DATA_SYSEX);
        assert_eq!(packets[1].data, vec![0x79, 0x02, 0x05, 0x41, 0x00, 0x42, 0x00]);
        assert_eq!(packets[2].name, "END_SYSEX");
    }

    #[test]
    fn test_empty_sysex() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0xF0, 0xF7]);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].name, "START_SYSEX");
        assert_eq!(packets[1].name, "END_SYSEX");
    }

    #[test]
    fn test_interrupting_status_inside_sysex() {
        let mut parser = Parser::default();
        let packets = decode(
            &mut parser,
            &[0xF0, 0x71, 0x41, 0xF9, 0x02, 0x05, 0x42, 0x00, 0xF7],
        );
        // The realtime message is emitted as its own packet without ending the
        // envelope; payload accumulation then resumes.
        assert_eq!(packets.len(), 5);
        assert_eq!(packets[0].name, "START_SYSEX");
        assert_eq!(packets[1].name, DATA_SYSEX);
        assert_eq!(packets[1].data, vec![0x71, 0x41]);
        assert_eq!(packets[2].name, "REPORT_VERSION");
        assert_eq!(packets[2].data, vec![0x02, 0x05]);
        assert_eq!(packets[3].name, DATA_SYSEX);
        assert_eq!(packets[3].data, vec![0x42, 0x00]);
        assert_eq!(packets[4].name, "END_SYSEX");
    }

    #[test]
    fn test_chunking_invariance() {
        let stream = [
            0x90, 0x3C, 0x7F, // digital message
            0xF0, 0x79, 0x02, 0x05, 0x41, 0x00, 0xF7, // sysex envelope
            0xE1, 0x10, 0x02, // analog message
            0xC2, 0x01, // report analog
        ];

        let mut whole = Parser::default();
        let expected = decode(&mut whole, &stream);
        assert_eq!(expected.len(), 6);

        for split in 1..stream.len() {
            let mut chunked = Parser::default();
            let mut packets = decode(&mut chunked, &stream[..split]);
            packets.extend(decode(&mut chunked, &stream[split..]));
            assert_eq!(packets, expected, "split at byte {}", split);
        }

        let mut trickled = Parser::default();
        let mut packets = Vec::new();
        for byte in stream {
            packets.extend(decode(&mut trickled, &[byte]));
        }
        assert_eq!(packets, expected, "byte-at-a-time feeding");
    }

    #[test]
    fn test_partial_sysex_stays_buffered() {
        let mut parser = Parser::default();
        let packets = decode(&mut parser, &[0xF0, 0x79, 0x02]);
        assert_eq!(packets.len(), 1, "payload run is held until closed");
        assert_eq!(packets[0].name, "START_SYSEX");

        let packets = decode(&mut parser, &[0x05, 0xF7]);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].data, vec![0x79, 0x02, 0x05]);
        assert_eq!(packets[1].name, "END_SYSEX");
    }

    #[test]
    fn test_data_length_table() {
        assert_eq!(data_length(0x90), 2);
        assert_eq!(data_length(0x9F), 2);
        assert_eq!(data_length(0xAB), 2);
        assert_eq!(data_length(0xE0), 2);
        assert_eq!(data_length(0xC0), 1);
        assert_eq!(data_length(0xD7), 1);
        assert_eq!(data_length(0xF0), 0);
        assert_eq!(data_length(0xF4), 2);
        assert_eq!(data_length(0xF9), 2);
        assert_eq!(data_length(0x71), 0);
        assert_eq!(data_length(0xFF), 0);
    }
}
