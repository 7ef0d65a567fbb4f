//! Serial passthrough sub-protocol: drive UARTs (hardware or software) wired
//! to the board. The port number travels in the low nibble of every
//! sub-command byte.
//!
//! <https://github.com/firmata/protocol/blob/master/serial-1.0.md>

use snafu::ensure;

use crate::errors::{Error, PortOutOfRangeSnafu};
use crate::protocol::encoding::{decode_double_7bit, encode_14bit, encode_double_7bit};
use crate::protocol::session::Session;
use crate::protocol::sysex::SysexResponse;

// Sub-commands, port number in the low nibble.
pub const SERIAL_CONFIG: u8 = 0x10;
pub const SERIAL_WRITE: u8 = 0x20;
pub const SERIAL_READ: u8 = 0x30;
pub const SERIAL_REPLY: u8 = 0x40;
pub const SERIAL_CLOSE: u8 = 0x50;
pub const SERIAL_FLUSH: u8 = 0x60;
pub const SERIAL_LISTEN: u8 = 0x70;

/// Highest addressable port: 0-7 are hardware UARTs, 8-15 software ones.
pub const SERIAL_MAX_PORT: u8 = 15;

/// Read lifecycle requested alongside `SERIAL_READ`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SerialReadMode {
    /// Report reads continuously, each sampling interval.
    Continuously = 0,
    /// Stop reporting reads.
    Stop = 1,
}

impl Session {
    /// Opens a port at `baud` (21 bits, three 7-bit bytes). Software serial
    /// ports carry their `(rx, tx)` pins behind the baud rate.
    pub fn serial_config(
        &self,
        port: u8,
        baud: u32,
        pins: Option<(u8, u8)>,
    ) -> Result<Vec<u8>, Error> {
        ensure_port(port)?;
        let mut payload = vec![
            SERIAL_CONFIG | port,
            (baud & 0x7F) as u8,
            ((baud >> 7) & 0x7F) as u8,
            ((baud >> 14) & 0x7F) as u8,
        ];
        if let Some((rx, tx)) = pins {
            payload.push(rx);
            payload.push(tx);
        }
        Ok(self.sysex_command("SERIAL_DATA", &payload))
    }

    /// Writes bytes out of a port, split in two 7-bit halves each.
    pub fn serial_write(&self, port: u8, data: &[u8]) -> Result<Vec<u8>, Error> {
        ensure_port(port)?;
        let mut payload = vec![SERIAL_WRITE | port];
        payload.extend(encode_double_7bit(data));
        Ok(self.sysex_command("SERIAL_DATA", &payload))
    }

    /// Starts or stops read reporting for a port, optionally bounding each
    /// report to `max_bytes`.
    pub fn serial_read(
        &self,
        port: u8,
        mode: SerialReadMode,
        max_bytes: Option<u16>,
    ) -> Result<Vec<u8>, Error> {
        ensure_port(port)?;
        let mut payload = vec![SERIAL_READ | port, mode as u8];
        if let Some(max_bytes) = max_bytes {
            payload.extend(encode_14bit(max_bytes));
        }
        Ok(self.sysex_command("SERIAL_DATA", &payload))
    }

    /// Closes a port.
    pub fn serial_close(&self, port: u8) -> Result<Vec<u8>, Error> {
        ensure_port(port)?;
        Ok(self.sysex_command("SERIAL_DATA", &[SERIAL_CLOSE | port]))
    }

    /// Flushes a port's buffers.
    pub fn serial_flush(&self, port: u8) -> Result<Vec<u8>, Error> {
        ensure_port(port)?;
        Ok(self.sysex_command("SERIAL_DATA", &[SERIAL_FLUSH | port]))
    }

    /// Moves a software serial port to the listening position.
    pub fn serial_listen(&self, port: u8) -> Result<Vec<u8>, Error> {
        ensure_port(port)?;
        Ok(self.sysex_command("SERIAL_DATA", &[SERIAL_LISTEN | port]))
    }
}

fn ensure_port(port: u8) -> Result<(), Error> {
    ensure!(port <= SERIAL_MAX_PORT, PortOutOfRangeSnafu { id: port });
    Ok(())
}

/// Decodes a serial SysEx body (the bytes following the SERIAL_DATA
/// sub-command). Only replies travel inbound; everything else returns `None`.
pub(crate) fn decode_reply(data: &[u8]) -> Option<SysexResponse> {
    let command = *data.first()?;
    if command & 0xF0 != SERIAL_REPLY {
        return None;
    }
    Some(SysexResponse::SerialReply {
        port: command & 0x0F,
        data: decode_double_7bit(data.get(1..).unwrap_or_default()),
    })
}
