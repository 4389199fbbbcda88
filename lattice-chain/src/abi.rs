//! Minimal ABI encoding for the two read-only calls the core issues.

use lattice_core::ChainError;

/// keccak256("isCommandExecuted(bytes32)")[..4]
pub const IS_COMMAND_EXECUTED_SELECTOR: &str = "d26ff210";

/// keccak256("depositAddress(bytes32)")[..4]
pub const DEPOSIT_ADDRESS_SELECTOR: &str = "b5270c34";

/// Encode `selector(bytes32)` calldata for a single 32-byte argument.
///
/// The argument may carry a `0x` prefix and may be shorter than 32
/// bytes; it is left-padded with zeros as ABI requires.
pub fn encode_bytes32_call(selector: &str, arg: &str, method: &str) -> Result<String, ChainError> {
    let raw = arg.strip_prefix("0x").unwrap_or(arg);
    if raw.len() > 64 || raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ChainError::AbiDecode {
            method: method.to_string(),
            reason: format!("argument is not a bytes32 hex string: {}", arg),
        });
    }
    Ok(format!("0x{}{:0>64}", selector, raw.to_lowercase()))
}

/// Decode a `bool` return word.
pub fn decode_bool(result: &str, method: &str) -> Result<bool, ChainError> {
    let word = decode_word(result, method)?;
    Ok(word.iter().any(|b| *b != 0))
}

/// Decode an `address` return word into a lower-case `0x` address.
pub fn decode_address(result: &str, method: &str) -> Result<String, ChainError> {
    let word = decode_word(result, method)?;
    Ok(format!("0x{}", hex::encode(&word[12..])))
}

fn decode_word(result: &str, method: &str) -> Result<[u8; 32], ChainError> {
    let raw = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(raw).map_err(|e| ChainError::AbiDecode {
        method: method.to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() < 32 {
        return Err(ChainError::AbiDecode {
            method: method.to_string(),
            reason: format!("result too short: {} bytes", bytes.len()),
        });
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[..32]);
    Ok(word)
}
