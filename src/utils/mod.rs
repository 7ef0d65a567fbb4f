//! Various utilities and helper functions.

pub use log;

/// Formats a byte buffer as a comma-separated list of hex values.
///
/// Used in test assertion messages and trace logs where raw `{:?}` output
/// would print decimal bytes.
pub fn format_as_hex(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("0x{:02X}", byte))
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use crate::utils::format_as_hex;

    #[test]
    fn test_format_as_hex() {
        assert_eq!(format_as_hex(&[]), "");
        assert_eq!(format_as_hex(&[0x00]), "0x00");
        assert_eq!(format_as_hex(&[0xF0, 0x79, 0xF7]), "0xF0, 0x79, 0xF7");
    }
}
