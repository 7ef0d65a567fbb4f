//! Pure codec for the [Firmata protocol](https://github.com/firmata/protocol):
//! a MIDI-derived framing over a serial byte link used to command and observe
//! microcontroller pins and peripherals.
//!
//! The crate owns no transport. Bytes read from the device are pushed into a
//! [`Session`](protocol::Session) which drains structured
//! [`Packet`](protocol::Packet)s; request builders produce byte vectors ready
//! to be written back by the host.

pub mod errors;
pub mod protocol;
pub mod utils;
