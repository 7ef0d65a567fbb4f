//! Legacy stepper motor sub-protocol (superseded by AccelStepper).
//!
//! <https://github.com/firmata/protocol/blob/master/stepper-legacy.md>

use std::fmt::{Display, Formatter};

use snafu::ensure;

use crate::errors::{Error, NotEnoughPinsSnafu};
use crate::protocol::encoding::encode_14bit;
use crate::protocol::session::Session;

// Sub-commands.
pub const STEPPER_CONFIG: u8 = 0;
pub const STEPPER_STEP: u8 = 1;

/// Driver wiring of a legacy stepper.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepperInterface {
    /// Step + direction driver board.
    Driver = 1,
    TwoWire = 2,
    FourWire = 4,
}

impl StepperInterface {
    fn required_pins(&self) -> usize {
        match self {
            StepperInterface::Driver | StepperInterface::TwoWire => 2,
            StepperInterface::FourWire => 4,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            StepperInterface::Driver => "DRIVER",
            StepperInterface::TwoWire => "TWO_WIRE",
            StepperInterface::FourWire => "FOUR_WIRE",
        }
    }
}

impl Display for StepperInterface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rotation direction of a step request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepperDirection {
    Ccw = 0,
    Cw = 1,
}

impl Session {
    /// Declares a stepper: its wiring, steps per revolution and motor pins.
    /// The pin count is fixed by the interface; two for DRIVER and TWO_WIRE,
    /// four for FOUR_WIRE.
    pub fn stepper_config(
        &self,
        stepper: u8,
        interface: StepperInterface,
        steps_per_revolution: u16,
        pins: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let expected = interface.required_pins();
        ensure!(
            pins.len() >= expected,
            NotEnoughPinsSnafu {
                interface: interface.name(),
                expected,
                supplied: pins.len(),
            }
        );

        let mut payload = vec![STEPPER_CONFIG, stepper, interface as u8];
        payload.extend(encode_14bit(steps_per_revolution));
        payload.extend(&pins[..expected]);
        Ok(self.sysex_command("STEPPER_DATA", &payload))
    }

    /// Turns a stepper by `steps` (21 bits) at `speed` steps per second,
    /// optionally ramping with an `(acceleration, deceleration)` pair.
    pub fn stepper_step(
        &self,
        stepper: u8,
        direction: StepperDirection,
        steps: u32,
        speed: u16,
        ramp: Option<(u16, u16)>,
    ) -> Vec<u8> {
        let steps = steps & 0x1F_FFFF;
        let mut payload = vec![
            STEPPER_STEP,
            stepper,
            direction as u8,
            (steps & 0x7F) as u8,
            ((steps >> 7) & 0x7F) as u8,
            ((steps >> 14) & 0x7F) as u8,
        ];
        payload.extend(encode_14bit(speed));
        if let Some((acceleration, deceleration)) = ramp {
            payload.extend(encode_14bit(acceleration));
            payload.extend(encode_14bit(deceleration));
        }
        self.sysex_command("STEPPER_DATA", &payload)
    }
}
