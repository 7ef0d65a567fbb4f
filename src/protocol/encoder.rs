//! Rotary encoder sub-protocol: attach quadrature encoders and read their
//! positions, on demand or auto-reported each sampling interval.
//!
//! <https://github.com/firmata/protocol/blob/master/encoder.md>

use crate::protocol::session::Session;

// Sub-commands.
pub const ENCODER_ATTACH: u8 = 0;
pub const ENCODER_REPORT_POSITION: u8 = 1;
pub const ENCODER_REPORT_POSITIONS: u8 = 2;
pub const ENCODER_RESET_POSITION: u8 = 3;
pub const ENCODER_REPORT_AUTO: u8 = 4;
pub const ENCODER_DETACH: u8 = 5;

/// Direction bit in the per-encoder report byte.
const ENCODER_DIRECTION_MASK: u8 = 0x40;
/// Encoder number bits in the per-encoder report byte.
const ENCODER_CHANNEL_MASK: u8 = 0x3F;

/// Signed position of one encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderPosition {
    pub encoder: u8,
    pub position: i32,
}

impl Session {
    /// Attaches an encoder to a pair of interrupt-capable pins.
    pub fn encoder_attach(&self, encoder: u8, pin_a: u8, pin_b: u8) -> Vec<u8> {
        self.sysex_command("ENCODER_DATA", &[ENCODER_ATTACH, encoder, pin_a, pin_b])
    }

    /// Asks for the current position of one encoder.
    pub fn encoder_report_position(&self, encoder: u8) -> Vec<u8> {
        self.sysex_command("ENCODER_DATA", &[ENCODER_REPORT_POSITION, encoder])
    }

    /// Asks for the current positions of every attached encoder.
    pub fn encoder_report_positions(&self) -> Vec<u8> {
        self.sysex_command("ENCODER_DATA", &[ENCODER_REPORT_POSITIONS])
    }

    /// Resets the position of one encoder to zero.
    pub fn encoder_reset_position(&self, encoder: u8) -> Vec<u8> {
        self.sysex_command("ENCODER_DATA", &[ENCODER_RESET_POSITION, encoder])
    }

    /// Enables or disables automatic position reports each sampling interval.
    pub fn encoder_report_auto(&self, enabled: bool) -> Vec<u8> {
        self.sysex_command("ENCODER_DATA", &[ENCODER_REPORT_AUTO, u8::from(enabled)])
    }

    /// Detaches one encoder, freeing its pins.
    pub fn encoder_detach(&self, encoder: u8) -> Vec<u8> {
        self.sysex_command("ENCODER_DATA", &[ENCODER_DETACH, encoder])
    }
}

/// Decodes an encoder SysEx body: a run of 5-byte records, each the encoder
/// number with a direction bit followed by a 28-bit magnitude as two 14-bit
/// halves. A trailing partial record is dropped.
pub(crate) fn decode_positions(data: &[u8]) -> Vec<EncoderPosition> {
    data.chunks_exact(5)
        .map(|record| {
            let low14 = (record[1] as u32 & 0x7F) | ((record[2] as u32 & 0x7F) << 7);
            let high14 = (record[3] as u32 & 0x7F) | ((record[4] as u32 & 0x7F) << 7);
            let magnitude = (low14 | (high14 << 14)) as i32;
            EncoderPosition {
                encoder: record[0] & ENCODER_CHANNEL_MASK,
                position: match record[0] & ENCODER_DIRECTION_MASK {
                    0 => magnitude,
                    _ => -magnitude,
                },
            }
        })
        .collect()
}
