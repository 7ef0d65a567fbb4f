use snafu::Snafu;

pub use crate::errors::Error::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Protocol error: {source}.
    ProtocolError { source: ProtocolError },
    /// Message error: {source}.
    MessageError { source: MessageError },
}

impl From<ProtocolError> for Error {
    fn from(value: ProtocolError) -> Self {
        Self::ProtocolError { source: value }
    }
}

impl From<MessageError> for Error {
    fn from(value: MessageError) -> Self {
        Self::MessageError { source: value }
    }
}

/// Decode-side failures: the inbound bytes cannot be given a shape at all.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProtocolError {
    /// Not enough bytes received - '{operation}' expected {expected} bytes, {received} received
    MessageTooShort {
        operation: &'static str,
        expected: usize,
        received: usize,
    },
}

/// Encoder-side argument rejections: the codec refuses to emit bytes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MessageError {
    /// Stepper device id ({id}) exceeds the maximum of 9
    DeviceOutOfRange { id: u8 },
    /// Stepper group id ({id}) exceeds the maximum of 4
    GroupOutOfRange { id: u8 },
    /// Stepper group of {count} devices exceeds the maximum of 10
    GroupTooLarge { count: usize },
    /// Interface {interface} requires {expected} motor pins, {supplied} supplied
    NotEnoughPins {
        interface: &'static str,
        expected: usize,
        supplied: usize,
    },
    /// Serial port id ({id}) exceeds the maximum of 15
    PortOutOfRange { id: u8 },
}

#[cfg(test)]
mod tests {
    use crate::errors::MessageError::{DeviceOutOfRange, NotEnoughPins};
    use crate::errors::ProtocolError::MessageTooShort;

    use super::*;

    #[test]
    fn test_error_display() {
        let protocol_error = Error::from(MessageTooShort {
            operation: "sysex_parse",
            expected: 1,
            received: 0,
        });
        assert_eq!(
            format!("{}", protocol_error),
            "Protocol error: Not enough bytes received - 'sysex_parse' expected 1 bytes, 0 received."
        );

        let message_error = Error::from(DeviceOutOfRange { id: 12 });
        assert_eq!(
            format!("{}", message_error),
            "Message error: Stepper device id (12) exceeds the maximum of 9."
        );

        let message_error = Error::from(NotEnoughPins {
            interface: "FOUR_WIRE",
            expected: 4,
            supplied: 2,
        });
        assert_eq!(
            format!("{}", message_error),
            "Message error: Interface FOUR_WIRE requires 4 motor pins, 2 supplied."
        );
    }

    #[test]
    fn test_from_protocol_error() {
        let error: Error = MessageTooShort {
            operation: "test",
            expected: 2,
            received: 1,
        }
        .into();
        assert!(matches!(error, Error::ProtocolError { .. }));
    }

    #[test]
    fn test_from_message_error() {
        let error: Error = MessageError::PortOutOfRange { id: 16 }.into();
        assert_eq!(
            format!("{}", error),
            "Message error: Serial port id (16) exceeds the maximum of 15."
        );
    }
}
