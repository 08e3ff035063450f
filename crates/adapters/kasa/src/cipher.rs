//! Kasa payload obfuscation.
//!
//! A running-key XOR stream: the key starts at `0xAB` and each ciphertext
//! byte becomes the key for the next one. It hides nothing from anyone who
//! knows the scheme.
//!
//! TCP frames prefix the ciphertext with its length as a big-endian `u32`;
//! UDP datagrams carry the bare ciphertext.

/// Initial key of the stream.
pub const INITIAL_KEY: u8 = 0xAB;

/// Length of the TCP frame header.
pub const HEADER_LEN: usize = 4;

/// Obfuscate `plain` in a single pass.
#[must_use]
pub fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    plain
        .iter()
        .map(|byte| {
            key ^= byte;
            key
        })
        .collect()
}

/// Reverse [`encrypt`].
#[must_use]
pub fn decrypt(cipher: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    cipher
        .iter()
        .map(|byte| {
            let plain = key ^ byte;
            key = *byte;
            plain
        })
        .collect()
}

/// Build a TCP frame: `u32be length | encrypt(payload)`.
///
/// Payloads longer than `u32::MAX` bytes are not representable; commands
/// are a few hundred bytes.
#[must_use]
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend(encrypt(payload));
    out
}

/// Payload length announced by a TCP frame header.
#[must_use]
pub fn frame_len(header: [u8; HEADER_LEN]) -> usize {
    u32::from_be_bytes(header) as usize
}
