//! Room code generation.
//!
//! The alphabet excludes visually ambiguous characters (`0`/`O`, `1`/`I`),
//! matching the excluded set from the legacy signaling server's "clean"
//! code generator.

use rand::RngExt;

const CLEAN_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Generate a random room code of `length` characters from the clean
/// alphabet. Collision checking against the registry is the caller's
/// responsibility (see `RoomRegistry::create_room`).
pub fn generate_room_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CLEAN_ALPHABET.len());
            CLEAN_ALPHABET[idx] as char
        })
        .collect()
}

/// Canonicalize a client-supplied room code for lookup: trim, uppercase.
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
