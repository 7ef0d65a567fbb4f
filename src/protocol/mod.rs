//! Implements the [Firmata protocol](https://github.com/firmata/protocol) as a
//! pure byte codec: framing, feature sub-protocols and version-gated vocabulary.

pub mod constants;

mod accelstepper;
mod encoder;
mod encoding;
mod onewire;
mod parser;
mod scheduler;
mod serial;
mod session;
mod stepper;
mod sysex;
mod version;

// Re-exports.
pub use accelstepper::*;
pub use encoder::*;
pub use encoding::*;
pub use onewire::*;
pub use parser::*;
pub use scheduler::*;
pub use serial::*;
pub use session::*;
pub use stepper::*;
pub use sysex::*;
pub use version::*;
// --
