//! XOR-255 pre-transform.
//!
//! Inverts every bit before LZW sees the data. It does not change the
//! compression ratio; containers written with it set [`flags::XOR255`] and
//! are undone after decoding.
//!
//! [`flags::XOR255`]: crate::header::flags::XOR255

/// Invert every byte in place.
pub fn xor255_in_place(data: &mut [u8]) {
    for byte in data {
        *byte ^= 0xFF;
    }
}

/// Return an inverted copy of `data`.
pub fn xor255(data: &[u8]) -> Vec<u8> {
    data.iter().map(|b| b ^ 0xFF).collect()
}
