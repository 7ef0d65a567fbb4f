//! Interprets reassembled SysEx payloads as feature responses.
//!
//! The raw parser only segments envelopes; the payload collected between
//! `START_SYSEX` and `END_SYSEX` is handed here and dispatched on its first
//! byte. Dispatchers are tolerant of truncation: they return whatever shape
//! the available bytes describe instead of raising.

use crate::errors::{Error, ProtocolError};
use crate::protocol::accelstepper;
use crate::protocol::constants::*;
use crate::protocol::encoder::{self, EncoderPosition};
use crate::protocol::encoding::{decode_14bit, decode_double_7bit};
use crate::protocol::onewire::{self, OneWireReply};
use crate::protocol::scheduler::{self, SchedulerReply};
use crate::protocol::serial;
use crate::protocol::version::ProtocolVersion;

/// One `(mode, resolution)` capability of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinCapability {
    pub mode: u8,
    pub resolution: u8,
}

/// One analog channel to pin number association.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalogMapping {
    pub channel: u8,
    pub pin: u8,
}

/// Data read back from an I2C device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct I2cReply {
    pub address: u16,
    pub register: u16,
    pub data: Vec<u16>,
}

/// A SysEx payload given its feature shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SysexResponse {
    /// Text message from the board, 14 bits per character.
    StringData { text: String },
    /// Firmware version and name.
    ReportFirmware {
        major: u8,
        minor: u8,
        name: String,
    },
    /// Supported modes and resolutions, one entry per pin.
    CapabilityResponse { pins: Vec<Vec<PinCapability>> },
    /// Analog channel to pin associations.
    AnalogMappingResponse { mappings: Vec<AnalogMapping> },
    /// Current mode and value of one pin.
    PinStateResponse {
        pin: u8,
        mode: u8,
        mode_name: &'static str,
        state: u64,
    },
    /// Data read back from an I2C device.
    I2cReply(I2cReply),
    /// A 1-Wire bus response.
    OneWire(OneWireReply),
    /// A task scheduler response.
    Scheduler(SchedulerReply),
    /// Legacy stepper move completion.
    StepperMoveComplete { stepper: u8 },
    /// An AccelStepper response.
    AccelStepper(accelstepper::AccelStepperReply),
    /// Current encoder positions, one record per reporting encoder.
    EncoderData { positions: Vec<EncoderPosition> },
    /// Bytes read from a serial passthrough port.
    SerialReply { port: u8, data: Vec<u8> },
    /// Chip-specific payload passed through uninterpreted.
    ReservedCommand { data: Vec<u8> },
    /// Sub-command absent from the dispatch table; payload passed through.
    Unknown { command: u8, data: Vec<u8> },
}

/// Dispatches a reassembled SysEx payload on its leading sub-command byte.
///
/// Only an empty payload is an error; unknown sub-commands come back as
/// [`SysexResponse::Unknown`] and truncated bodies decode best-effort.
pub(crate) fn sysex_parse(
    version: ProtocolVersion,
    payload: &[u8],
) -> Result<SysexResponse, Error> {
    let Some((&command, data)) = payload.split_first() else {
        return Err(ProtocolError::MessageTooShort {
            operation: "sysex_parse",
            expected: 1,
            received: 0,
        }
        .into());
    };

    let response = match command {
        STRING_DATA => SysexResponse::StringData {
            text: String::from_utf8_lossy(&decode_double_7bit(data))
                .replace('\0', ""),
        },
        REPORT_FIRMWARE => decode_report_firmware(data),
        CAPABILITY_RESPONSE => decode_capabilities(data),
        ANALOG_MAPPING_RESPONSE => decode_analog_mapping(data),
        PIN_STATE_RESPONSE => decode_pin_state(data),
        I2C_REPLY => decode_i2c_reply(data),
        ONEWIRE_DATA => onewire::decode_reply(version, data)
            .map(SysexResponse::OneWire)
            .unwrap_or_else(|| unknown(command, data)),
        SCHEDULER_DATA => scheduler::decode_reply(data)
            .map(SysexResponse::Scheduler)
            .unwrap_or_else(|| unknown(command, data)),
        STEPPER_DATA => SysexResponse::StepperMoveComplete {
            stepper: data.first().copied().unwrap_or(0),
        },
        ACCELSTEPPER_DATA => accelstepper::decode_reply(data)
            .map(SysexResponse::AccelStepper)
            .unwrap_or_else(|| unknown(command, data)),
        ENCODER_DATA => SysexResponse::EncoderData {
            positions: encoder::decode_positions(data),
        },
        SERIAL_DATA => serial::decode_reply(data).unwrap_or_else(|| unknown(command, data)),
        RESERVED_COMMAND => SysexResponse::ReservedCommand {
            data: data.to_vec(),
        },
        _ => unknown(command, data),
    };
    Ok(response)
}

fn unknown(command: u8, data: &[u8]) -> SysexResponse {
    SysexResponse::Unknown {
        command,
        data: data.to_vec(),
    }
}

fn decode_report_firmware(data: &[u8]) -> SysexResponse {
    SysexResponse::ReportFirmware {
        major: data.first().copied().unwrap_or(0),
        minor: data.get(1).copied().unwrap_or(0),
        name: String::from_utf8_lossy(&decode_double_7bit(data.get(2..).unwrap_or_default()))
            .replace('\0', ""),
    }
}

fn decode_capabilities(data: &[u8]) -> SysexResponse {
    let mut pins = Vec::new();
    let mut modes = Vec::new();
    let mut i = 0;
    while i < data.len() {
        if data[i] == SYSEX_REALTIME {
            pins.push(std::mem::take(&mut modes));
            i += 1;
        } else if i + 1 < data.len() {
            modes.push(PinCapability {
                mode: data[i],
                resolution: data[i + 1],
            });
            i += 2;
        } else {
            // Dangling mode byte without its resolution.
            break;
        }
    }
    if !modes.is_empty() {
        pins.push(modes);
    }
    SysexResponse::CapabilityResponse { pins }
}

fn decode_analog_mapping(data: &[u8]) -> SysexResponse {
    let mappings = data
        .iter()
        .enumerate()
        .filter(|(_, &channel)| channel != SYSEX_REALTIME)
        .map(|(pin, &channel)| AnalogMapping {
            channel,
            pin: pin as u8,
        })
        .collect();
    SysexResponse::AnalogMappingResponse { mappings }
}

fn decode_pin_state(data: &[u8]) -> SysexResponse {
    let mode = data.get(1).copied().unwrap_or(0);
    // Variable-length value, 7 bits per byte, least significant first.
    let state = data
        .get(2..)
        .unwrap_or_default()
        .iter()
        .take(9)
        .enumerate()
        .fold(0u64, |state, (i, &byte)| {
            state | (((byte & 0x7F) as u64) << (7 * i))
        });
    SysexResponse::PinStateResponse {
        pin: data.first().copied().unwrap_or(0),
        mode,
        mode_name: pin_mode_name(mode),
        state,
    }
}

fn decode_i2c_reply(data: &[u8]) -> SysexResponse {
    let mut reply = I2cReply {
        address: decode_14bit(data).unwrap_or(0),
        register: decode_14bit(data.get(2..).unwrap_or_default()).unwrap_or(0),
        ..Default::default()
    };
    for pair in data.get(4..).unwrap_or_default().chunks(2) {
        if let Some(value) = decode_14bit(pair) {
            reply.data.push(value);
        }
    }
    SysexResponse::I2cReply(reply)
}
