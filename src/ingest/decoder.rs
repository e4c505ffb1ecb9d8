//! Output-script to mainnet address decoding.

use bitcoin::{Address, Network, ScriptBuf};

/// Decodes a hex-encoded output script into its mainnet address string.
///
/// Absent, empty, or whitespace-only input returns `None` without reaching the
/// script parser. Invalid hex and non-standard scripts (no address form) also
/// return `None`.
pub fn decode_script_address(hex_script: Option<&str>) -> Option<String> {
    let trimmed = hex_script.map(str::trim).filter(|hex| !hex.is_empty())?;

    let bytes = match hex::decode(trimmed) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(script = trimmed, error = %err, "script is not valid hex");
            return None;
        }
    };

    let script = ScriptBuf::from_bytes(bytes);
    match Address::from_script(&script, Network::Bitcoin) {
        Ok(address) => Some(address.to_string()),
        Err(err) => {
            tracing::debug!(script = trimmed, error = %err, "script has no address form");
            None
        }
    }
}
