//! AccelStepper sub-protocol: up to 10 independently driven stepper motors
//! with speed/acceleration profiles, plus coordinated groups of motors.
//!
//! <https://github.com/firmata/protocol/blob/master/accelStepperFirmata.md>

use snafu::ensure;

use crate::errors::{DeviceOutOfRangeSnafu, Error, GroupOutOfRangeSnafu, GroupTooLargeSnafu, NotEnoughPinsSnafu};
use crate::protocol::encoding::{decode_32bit_signed, encode_32bit_signed, encode_custom_float};
use crate::protocol::session::Session;

// Sub-commands.
pub const ACCELSTEPPER_CONFIG: u8 = 0x00;
pub const ACCELSTEPPER_ZERO: u8 = 0x01;
pub const ACCELSTEPPER_STEP: u8 = 0x02;
pub const ACCELSTEPPER_TO: u8 = 0x03;
pub const ACCELSTEPPER_ENABLE: u8 = 0x04;
pub const ACCELSTEPPER_STOP: u8 = 0x05;
pub const ACCELSTEPPER_REPORT_POSITION: u8 = 0x06;
pub const ACCELSTEPPER_SET_ACCELERATION: u8 = 0x08;
pub const ACCELSTEPPER_SET_SPEED: u8 = 0x09;
pub const ACCELSTEPPER_MOVE_COMPLETE: u8 = 0x0A;
// Group sub-commands.
pub const MULTISTEPPER_CONFIG: u8 = 0x20;
pub const MULTISTEPPER_TO: u8 = 0x21;
pub const MULTISTEPPER_STOP: u8 = 0x23;
pub const MULTISTEPPER_MOVE_COMPLETE: u8 = 0x24;

/// Highest addressable device id.
pub const ACCELSTEPPER_MAX_DEVICE: u8 = 9;
/// Highest addressable group id.
pub const MULTISTEPPER_MAX_GROUP: u8 = 4;

/// Driver wiring of an AccelStepper device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccelStepperInterface {
    /// Step + direction driver board.
    Driver = 1,
    TwoWire = 2,
    ThreeWire = 3,
    FourWire = 4,
}

impl AccelStepperInterface {
    fn required_pins(&self) -> usize {
        match self {
            AccelStepperInterface::Driver | AccelStepperInterface::TwoWire => 2,
            AccelStepperInterface::ThreeWire => 3,
            AccelStepperInterface::FourWire => 4,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AccelStepperInterface::Driver => "DRIVER",
            AccelStepperInterface::TwoWire => "TWO_WIRE",
            AccelStepperInterface::ThreeWire => "THREE_WIRE",
            AccelStepperInterface::FourWire => "FOUR_WIRE",
        }
    }
}

/// Step resolution of an AccelStepper device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepSize {
    Whole = 0,
    Half = 1,
}

/// Wiring declaration of one AccelStepper device.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelStepperConfig {
    pub interface: AccelStepperInterface,
    pub step_size: StepSize,
    /// Motor pins, in wiring order; the interface fixes how many are used.
    pub pins: Vec<u8>,
    /// Active-low or externally switched drivers expose an enable pin.
    pub enable_pin: Option<u8>,
    /// Pins whose signal must be inverted, out of `pins` + `enable_pin`.
    pub invert: Vec<u8>,
}

/// A decoded AccelStepper response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccelStepperReply {
    /// A device finished its requested move; reports its absolute position.
    MoveComplete { device: u8, position: i32 },
    /// Absolute position answered to a report request.
    ReportPosition { device: u8, position: i32 },
    /// Every device of a group finished its requested move.
    MultiMoveComplete { group: u8 },
}

impl Session {
    /// Declares an AccelStepper device: wiring interface, step resolution,
    /// motor pins, optional enable pin and the pin inversion mask.
    pub fn accelstepper_config(
        &self,
        device: u8,
        config: &AccelStepperConfig,
    ) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        let expected = config.interface.required_pins();
        ensure!(
            config.pins.len() >= expected,
            NotEnoughPinsSnafu {
                interface: config.interface.name(),
                expected,
                supplied: config.pins.len(),
            }
        );

        let interface = ((config.interface as u8 & 0x07) << 4)
            | ((config.step_size as u8 & 0x07) << 1)
            | u8::from(config.enable_pin.is_some());

        let mut payload = vec![ACCELSTEPPER_CONFIG, device, interface];
        payload.extend(&config.pins[..expected]);
        payload.extend(config.enable_pin);

        // One bit per configured pin, set when that pin is inverted.
        let configured = payload[3..].to_vec();
        let mut invert_mask = 0u8;
        for (i, pin) in configured.iter().enumerate() {
            if config.invert.contains(pin) {
                invert_mask |= 1 << i;
            }
        }
        payload.push(invert_mask);

        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Resets the device's current position to zero.
    pub fn accelstepper_zero(&self, device: u8) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &[ACCELSTEPPER_ZERO, device]))
    }

    /// Moves the device by `steps` relative to its current position.
    pub fn accelstepper_step(&self, device: u8, steps: i32) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        let mut payload = vec![ACCELSTEPPER_STEP, device];
        payload.extend(encode_32bit_signed(steps));
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Moves the device to the absolute `position`.
    pub fn accelstepper_to(&self, device: u8, position: i32) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        let mut payload = vec![ACCELSTEPPER_TO, device];
        payload.extend(encode_32bit_signed(position));
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Drives the enable pin of the device.
    pub fn accelstepper_enable(&self, device: u8, enabled: bool) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        Ok(self.sysex_command(
            "ACCELSTEPPER_DATA",
            &[ACCELSTEPPER_ENABLE, device, u8::from(enabled)],
        ))
    }

    /// Stops the device, respecting its deceleration profile.
    pub fn accelstepper_stop(&self, device: u8) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &[ACCELSTEPPER_STOP, device]))
    }

    /// Asks for the device's absolute position.
    pub fn accelstepper_report_position(&self, device: u8) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &[ACCELSTEPPER_REPORT_POSITION, device]))
    }

    /// Sets the device's acceleration, in steps / s².
    pub fn accelstepper_set_acceleration(
        &self,
        device: u8,
        acceleration: f64,
    ) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        let mut payload = vec![ACCELSTEPPER_SET_ACCELERATION, device];
        payload.extend(encode_custom_float(acceleration));
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Sets the device's maximum speed, in steps / s.
    pub fn accelstepper_set_speed(&self, device: u8, speed: f64) -> Result<Vec<u8>, Error> {
        ensure_device(device)?;
        let mut payload = vec![ACCELSTEPPER_SET_SPEED, device];
        payload.extend(encode_custom_float(speed));
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Gathers up to 10 configured devices under a group id for coordinated
    /// moves.
    pub fn accelstepper_multi_config(&self, group: u8, devices: &[u8]) -> Result<Vec<u8>, Error> {
        ensure_group(group)?;
        ensure!(devices.len() <= 10, GroupTooLargeSnafu { count: devices.len() });
        for &device in devices {
            ensure_device(device)?;
        }

        let mut payload = vec![MULTISTEPPER_CONFIG, group];
        payload.extend(devices);
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Moves every device of the group to the absolute `position`,
    /// coordinating their speeds to arrive together.
    pub fn accelstepper_multi_to(&self, group: u8, position: i32) -> Result<Vec<u8>, Error> {
        ensure_group(group)?;
        let mut payload = vec![MULTISTEPPER_TO, group];
        payload.extend(encode_32bit_signed(position));
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &payload))
    }

    /// Stops every device of the group immediately.
    pub fn accelstepper_multi_stop(&self, group: u8) -> Result<Vec<u8>, Error> {
        ensure_group(group)?;
        Ok(self.sysex_command("ACCELSTEPPER_DATA", &[MULTISTEPPER_STOP, group]))
    }
}

fn ensure_device(device: u8) -> Result<(), Error> {
    ensure!(
        device <= ACCELSTEPPER_MAX_DEVICE,
        DeviceOutOfRangeSnafu { id: device }
    );
    Ok(())
}

fn ensure_group(group: u8) -> Result<(), Error> {
    ensure!(
        group <= MULTISTEPPER_MAX_GROUP,
        GroupOutOfRangeSnafu { id: group }
    );
    Ok(())
}

/// Decodes an AccelStepper SysEx body (the bytes following the
/// ACCELSTEPPER_DATA sub-command). Requests and unknown sub-commands return
/// `None`.
pub(crate) fn decode_reply(data: &[u8]) -> Option<AccelStepperReply> {
    let command = *data.first()?;
    let id = data.get(1).copied().unwrap_or(0);
    let position = decode_32bit_signed(data.get(2..).unwrap_or_default());

    match command {
        ACCELSTEPPER_MOVE_COMPLETE => Some(AccelStepperReply::MoveComplete {
            device: id,
            position,
        }),
        ACCELSTEPPER_REPORT_POSITION => Some(AccelStepperReply::ReportPosition {
            device: id,
            position,
        }),
        MULTISTEPPER_MOVE_COMPLETE => Some(AccelStepperReply::MultiMoveComplete { group: id }),
        _ => None,
    }
}
