//! Firmata protocol constants.
//!
//! Official Firmata documentation: <https://github.com/firmata/protocol>

// ########################################
// Message command bytes (128-255/0x80-0xFF)

/// Send data for a digital port (collection of 8 pins)
pub const DIGITAL_MESSAGE: u8 = 0x90;
/// Send data for an analog pin (or PWM)
pub const ANALOG_MESSAGE: u8 = 0xE0;
/// Enable analog input by pin #
pub const REPORT_ANALOG: u8 = 0xC0;
/// Enable digital input by port pair
pub const REPORT_DIGITAL: u8 = 0xD0;
//
/// Set a pin to INPUT/OUTPUT/PWM/etc
pub const SET_PIN_MODE: u8 = 0xF4;
/// Set value of an individual digital pin
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;
//
/// Report protocol version
pub const REPORT_VERSION: u8 = 0xF9;
/// Reset from MIDI
pub const SYSTEM_RESET: u8 = 0xFF;
//
/// Start a MIDI Sysex message
pub const START_SYSEX: u8 = 0xF0;
/// End a MIDI Sysex message
pub const END_SYSEX: u8 = 0xF7;

// ########################################
// Extended command set using sysex (0-127/0x00-0x7F)

/// 2nd SysEx data byte is a chip-specific command (AVR, PIC, TI, etc)
pub const RESERVED_COMMAND: u8 = 0x00;
/// Communicate with serial devices, including other boards
pub const SERIAL_DATA: u8 = 0x60;
/// Reply with encoders current positions
pub const ENCODER_DATA: u8 = 0x61;
/// Control a stepper motor through the AccelStepper library
pub const ACCELSTEPPER_DATA: u8 = 0x62;
/// Ask for mapping of analog to pin numbers
pub const ANALOG_MAPPING_QUERY: u8 = 0x69;
/// Reply with mapping info
pub const ANALOG_MAPPING_RESPONSE: u8 = 0x6A;
/// Ask for supported modes and resolution of all pins
pub const CAPABILITY_QUERY: u8 = 0x6B;
/// Reply with supported modes and resolution
pub const CAPABILITY_RESPONSE: u8 = 0x6C;
/// Ask for a pin's current mode and value
pub const PIN_STATE_QUERY: u8 = 0x6D;
/// Reply with pin's current mode and value
pub const PIN_STATE_RESPONSE: u8 = 0x6E;
/// Analog write (PWM, Servo, etc) to any pin
pub const EXTENDED_ANALOG: u8 = 0x6F;
/// Set max angle, minPulse, maxPulse, freq
pub const SERVO_CONFIG: u8 = 0x70;
/// String message with 14-bits per char
pub const STRING_DATA: u8 = 0x71;
/// Control a stepper motor (legacy protocol)
pub const STEPPER_DATA: u8 = 0x72;
/// Send an OneWire read/write/reset/select/skip/search request
pub const ONEWIRE_DATA: u8 = 0x73;
/// Bitstream to/from a shift register
pub const SHIFT_DATA: u8 = 0x75;
/// Send an I2C read/write request
pub const I2C_REQUEST: u8 = 0x76;
/// Reply to an I2C read request
pub const I2C_REPLY: u8 = 0x77;
/// Config I2C settings such as delay times and power pins
pub const I2C_CONFIG: u8 = 0x78;
/// Report name and version of the firmware
pub const REPORT_FIRMWARE: u8 = 0x79;
/// Set the poll rate of the main loop
pub const SAMPLING_INTERVAL: u8 = 0x7A;
/// Send a createtask/deletetask/addtotask/schedule/querytasks/querytask request to the scheduler
pub const SCHEDULER_DATA: u8 = 0x7B;
/// MIDI Reserved for non-realtime messages
pub const SYSEX_NON_REALTIME: u8 = 0x7E;
/// MIDI Reserved for realtime messages
pub const SYSEX_REALTIME: u8 = 0x7F;

// ########################################
// I2C additions.

/// 10-bit address mode flag in the I2C request flags byte
pub const I2C_10BIT_ADDRESS_MODE_MASK: u8 = 0x20;
/// Auto-restart transmission flag in the I2C request flags byte
pub const I2C_END_TX_MASK: u8 = 0x40;

/// Read/write mode carried in bits 3-4 of the I2C request flags byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum I2cMode {
    Write = 0,
    Read = 1,
    ReadContinuously = 2,
    StopReading = 3,
}

// ########################################
// Pin modes.

pub const PIN_MODE_INPUT: u8 = 0x00;
pub const PIN_MODE_OUTPUT: u8 = 0x01;
pub const PIN_MODE_ANALOG: u8 = 0x02;
pub const PIN_MODE_PWM: u8 = 0x03;
pub const PIN_MODE_SERVO: u8 = 0x04;
pub const PIN_MODE_SHIFT: u8 = 0x05;
pub const PIN_MODE_I2C: u8 = 0x06;
pub const PIN_MODE_ONEWIRE: u8 = 0x07;
pub const PIN_MODE_STEPPER: u8 = 0x08;
pub const PIN_MODE_ENCODER: u8 = 0x09;
pub const PIN_MODE_SERIAL: u8 = 0x0A;
pub const PIN_MODE_PULLUP: u8 = 0x0B;
/// Pin configured to be ignored by digitalWrite and capabilityResponse
pub const PIN_MODE_IGNORE: u8 = 0x7F;

/// Symbolic name of a pin mode, `UNKNOWN` when the mode byte is not part of
/// the vocabulary.
pub fn pin_mode_name(mode: u8) -> &'static str {
    match mode {
        PIN_MODE_INPUT => "INPUT",
        PIN_MODE_OUTPUT => "OUTPUT",
        PIN_MODE_ANALOG => "ANALOG",
        PIN_MODE_PWM => "PWM",
        PIN_MODE_SERVO => "SERVO",
        PIN_MODE_SHIFT => "SHIFT",
        PIN_MODE_I2C => "I2C",
        PIN_MODE_ONEWIRE => "ONEWIRE",
        PIN_MODE_STEPPER => "STEPPER",
        PIN_MODE_ENCODER => "ENCODER",
        PIN_MODE_SERIAL => "SERIAL",
        PIN_MODE_PULLUP => "PULLUP",
        PIN_MODE_IGNORE => "IGNORE",
        _ => "UNKNOWN",
    }
}
