//! 1-Wire bus sub-protocol: bus configuration, device search and the
//! composite task request combining reset/skip/select/read/delay/write.
//!
//! <https://github.com/firmata/protocol/blob/master/onewire.md>

use crate::protocol::encoding::{pack_as_7bit, unpack_from_7bit};
use crate::protocol::session::Session;
use crate::protocol::version::ProtocolVersion;

// Sub-commands.
/// Ask the bus to enumerate its devices
pub const ONEWIRE_SEARCH_REQUEST: u8 = 0x40;
/// Configure a pin as a 1-Wire bus
pub const ONEWIRE_CONFIG_REQUEST: u8 = 0x41;
/// Reply with the enumerated device addresses
pub const ONEWIRE_SEARCH_REPLY: u8 = 0x42;
/// Reply with bytes read from a device
pub const ONEWIRE_READ_REPLY: u8 = 0x43;
/// Ask the bus to enumerate devices in alarm state
pub const ONEWIRE_SEARCH_ALARMS_REQUEST: u8 = 0x44;
/// Reply with the enumerated alarmed device addresses
pub const ONEWIRE_SEARCH_ALARMS_REPLY: u8 = 0x45;

// Task request bitmask.
pub const ONEWIRE_RESET_REQUEST_BIT: u8 = 0x01;
pub const ONEWIRE_SKIP_REQUEST_BIT: u8 = 0x02;
pub const ONEWIRE_SELECT_REQUEST_BIT: u8 = 0x04;
pub const ONEWIRE_READ_REQUEST_BIT: u8 = 0x08;
pub const ONEWIRE_DELAY_REQUEST_BIT: u8 = 0x10;
pub const ONEWIRE_WITHDATA_REQUEST_BIT: u8 = 0x20;

/// A 64-bit 1-Wire ROM address: family code, 48-bit identity, CRC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OneWireAddress {
    pub family: u8,
    pub identity: [u8; 6],
    pub crc: u8,
}

impl OneWireAddress {
    /// The 8-byte wire layout of the address.
    pub fn encode(&self) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[0] = self.family;
        bytes[1..7].copy_from_slice(&self.identity);
        bytes[7] = self.crc;
        bytes
    }

    /// Reads an address back from its wire layout; `None` below 8 bytes.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let mut identity = [0; 6];
        identity.copy_from_slice(&data[1..7]);
        Some(Self {
            family: data[0],
            identity,
            crc: data[7],
        })
    }
}

/// One composite bus transaction. Set fields compose into the sub-command
/// bitmask; the body concatenates in the fixed wire order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OneWireTask {
    /// Pulse a bus reset before anything else.
    pub reset: bool,
    /// Address every device at once instead of selecting one.
    pub skip: bool,
    /// Address one device.
    pub select: Option<OneWireAddress>,
    /// Number of bytes to read back.
    pub read: Option<u16>,
    /// Correlates the read reply with this request. Not part of the `V_2_04`
    /// wire format, where replies echo the device address instead.
    pub correlation_id: Option<u16>,
    /// Delay before execution, in milliseconds.
    pub delay: Option<u32>,
    /// Bytes to write to the selected device.
    pub write: Vec<u8>,
}

/// A decoded 1-Wire response.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OneWireReply {
    /// Devices enumerated by a search.
    SearchReply {
        pin: u8,
        devices: Vec<OneWireAddress>,
    },
    /// Devices in alarm state enumerated by an alarm search.
    SearchAlarmsReply {
        pin: u8,
        devices: Vec<OneWireAddress>,
    },
    /// Bytes read from the bus. `device` is set by `V_2_04` peers,
    /// `correlation_id` by every other revision.
    ReadReply {
        pin: u8,
        correlation_id: Option<u16>,
        device: Option<OneWireAddress>,
        data: Vec<u8>,
    },
}

impl Session {
    /// Configures `pin` as a 1-Wire bus, optionally powering parasitic
    /// devices between commands.
    pub fn onewire_config(&self, pin: u8, parasitic_power: bool) -> Vec<u8> {
        self.sysex_command(
            "ONEWIRE_DATA",
            &[ONEWIRE_CONFIG_REQUEST, pin, u8::from(parasitic_power)],
        )
    }

    /// Enumerates the devices on the bus at `pin`.
    pub fn onewire_search(&self, pin: u8) -> Vec<u8> {
        self.sysex_command("ONEWIRE_DATA", &[ONEWIRE_SEARCH_REQUEST, pin])
    }

    /// Enumerates the devices in alarm state on the bus at `pin`.
    pub fn onewire_search_alarms(&self, pin: u8) -> Vec<u8> {
        self.sysex_command("ONEWIRE_DATA", &[ONEWIRE_SEARCH_ALARMS_REQUEST, pin])
    }

    /// Pulses a reset on the bus at `pin`.
    pub fn onewire_reset(&self, pin: u8) -> Vec<u8> {
        self.onewire_task(
            pin,
            &OneWireTask {
                reset: true,
                ..Default::default()
            },
        )
    }

    /// Addresses every device on the bus at once.
    pub fn onewire_skip(&self, pin: u8) -> Vec<u8> {
        self.onewire_task(
            pin,
            &OneWireTask {
                skip: true,
                ..Default::default()
            },
        )
    }

    /// Selects one device on the bus.
    pub fn onewire_select(&self, pin: u8, device: OneWireAddress) -> Vec<u8> {
        self.onewire_task(
            pin,
            &OneWireTask {
                select: Some(device),
                ..Default::default()
            },
        )
    }

    /// Reads `count` bytes from the previously selected device.
    pub fn onewire_read(&self, pin: u8, count: u16, correlation_id: u16) -> Vec<u8> {
        self.onewire_task(
            pin,
            &OneWireTask {
                read: Some(count),
                correlation_id: Some(correlation_id),
                ..Default::default()
            },
        )
    }

    /// Delays the next bus command by `delay` milliseconds.
    pub fn onewire_delay(&self, pin: u8, delay: u32) -> Vec<u8> {
        self.onewire_task(
            pin,
            &OneWireTask {
                delay: Some(delay),
                ..Default::default()
            },
        )
    }

    /// Writes bytes to the previously selected device.
    pub fn onewire_write(&self, pin: u8, data: &[u8]) -> Vec<u8> {
        self.onewire_task(
            pin,
            &OneWireTask {
                write: data.to_vec(),
                ..Default::default()
            },
        )
    }

    /// Builds the composite task request. The body concatenates, in order:
    /// selected device, read count (+ correlation id outside `V_2_04`),
    /// delay, write bytes; the whole body is repacked to 7-bit wire bytes.
    pub fn onewire_task(&self, pin: u8, task: &OneWireTask) -> Vec<u8> {
        let mut subcommand = 0;
        let mut body = Vec::new();

        if task.reset {
            subcommand |= ONEWIRE_RESET_REQUEST_BIT;
        }
        if task.skip {
            subcommand |= ONEWIRE_SKIP_REQUEST_BIT;
        }
        if let Some(device) = &task.select {
            subcommand |= ONEWIRE_SELECT_REQUEST_BIT;
            body.extend(device.encode());
        }
        if let Some(count) = task.read {
            subcommand |= ONEWIRE_READ_REQUEST_BIT;
            body.extend(count.to_le_bytes());
            if self.version() != ProtocolVersion::V2_04 {
                body.extend(task.correlation_id.unwrap_or(0).to_le_bytes());
            }
        }
        if let Some(delay) = task.delay {
            subcommand |= ONEWIRE_DELAY_REQUEST_BIT;
            body.extend(delay.to_le_bytes());
        }
        if !task.write.is_empty() {
            subcommand |= ONEWIRE_WITHDATA_REQUEST_BIT;
            body.extend(&task.write);
        }

        let mut payload = vec![subcommand, pin];
        payload.extend(pack_as_7bit(&body));
        self.sysex_command("ONEWIRE_DATA", &payload)
    }
}

/// Decodes a 1-Wire SysEx body (the bytes following the ONEWIRE_DATA
/// sub-command). Requests and unknown sub-commands return `None`.
pub(crate) fn decode_reply(version: ProtocolVersion, data: &[u8]) -> Option<OneWireReply> {
    let command = *data.first()?;
    let pin = data.get(1).copied().unwrap_or(0);
    let unpacked = unpack_from_7bit(data.get(2..).unwrap_or_default());

    match command {
        ONEWIRE_SEARCH_REPLY => Some(OneWireReply::SearchReply {
            pin,
            devices: decode_addresses(&unpacked),
        }),
        ONEWIRE_SEARCH_ALARMS_REPLY => Some(OneWireReply::SearchAlarmsReply {
            pin,
            devices: decode_addresses(&unpacked),
        }),
        ONEWIRE_READ_REPLY => {
            if version == ProtocolVersion::V2_04 {
                // 2.4 peers echo the addressed device ahead of the data.
                Some(OneWireReply::ReadReply {
                    pin,
                    correlation_id: None,
                    device: OneWireAddress::decode(&unpacked),
                    data: unpacked.get(8..).unwrap_or_default().to_vec(),
                })
            } else {
                let correlation_id = match unpacked.get(0..2) {
                    Some(&[lsb, msb]) => Some(u16::from_le_bytes([lsb, msb])),
                    _ => None,
                };
                Some(OneWireReply::ReadReply {
                    pin,
                    correlation_id,
                    device: None,
                    data: unpacked.get(2..).unwrap_or_default().to_vec(),
                })
            }
        }
        _ => None,
    }
}

fn decode_addresses(data: &[u8]) -> Vec<OneWireAddress> {
    data.chunks_exact(8)
        .filter_map(OneWireAddress::decode)
        .collect()
}
