//! Reflected CRCs used as RCH payload checksums.
//!
//! - [`Crc32`]: ISO 3309 / zlib CRC-32, the default
//! - [`Crc64`]: CRC-64/XZ (ECMA-182 polynomial), selected by a header flag
//!
//! Both process eight bytes per step with slicing tables built at compile
//! time; remainders go through the first table byte by byte.

/// Slicing-by-8 tables for a reflected polynomial of width `$t`.
macro_rules! slicing_tables {
    ($name:ident, $t:ty) => {
        const fn $name(poly: $t) -> [[$t; 256]; 8] {
            let mut tables = [[0 as $t; 256]; 8];
            let mut n = 0usize;
            while n < 256 {
                let mut value = n as $t;
                let mut bit = 0;
                while bit < 8 {
                    let carry = value & 1;
                    value >>= 1;
                    if carry != 0 {
                        value ^= poly;
                    }
                    bit += 1;
                }
                tables[0][n] = value;
                n += 1;
            }
            let mut slice = 1;
            while slice < 8 {
                let mut n = 0usize;
                while n < 256 {
                    let below = tables[slice - 1][n];
                    tables[slice][n] = (below >> 8) ^ tables[0][(below & 0xFF) as usize];
                    n += 1;
                }
                slice += 1;
            }
            tables
        }
    };
}

slicing_tables!(tables32, u32);
slicing_tables!(tables64, u64);

static TABLES32: [[u32; 256]; 8] = tables32(0xEDB8_8320);
static TABLES64: [[u64; 256]; 8] = tables64(0xC96C_5795_D787_0F42);

/// Running reflected CRC over `$t` with all-ones init and final XOR.
macro_rules! reflected_crc {
    ($(#[$doc:meta])* $name:ident, $t:ty, $tables:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            state: $t,
        }

        impl $name {
            /// Start a new digest.
            pub fn new() -> Self {
                Self { state: <$t>::MAX }
            }

            /// Feed more bytes.
            #[inline]
            pub fn update(&mut self, data: &[u8]) {
                let mut state = self.state;
                let mut words = data.chunks_exact(8);
                for word in &mut words {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(word);
                    let mixed = u64::from_le_bytes(bytes) ^ state as u64;
                    state = 0;
                    for (k, table) in $tables.iter().rev().enumerate() {
                        state ^= table[((mixed >> (8 * k)) & 0xFF) as usize];
                    }
                }
                for &byte in words.remainder() {
                    state = (state >> 8) ^ $tables[0][((state ^ byte as $t) & 0xFF) as usize];
                }
                self.state = state;
            }

            /// The digest of everything fed so far.
            pub fn finalize(self) -> $t {
                !self.state
            }

            /// Digest of `data` in one call.
            pub fn compute(data: &[u8]) -> $t {
                let mut crc = Self::new();
                crc.update(data);
                crc.finalize()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

reflected_crc!(
    /// CRC-32 (polynomial 0x04C11DB7, reflected 0xEDB88320).
    ///
    /// ```rust
    /// use ercha_core::Crc32;
    ///
    /// let mut crc = Crc32::new();
    /// crc.update(b"12345");
    /// crc.update(b"6789");
    /// assert_eq!(crc.finalize(), 0xCBF4_3926);
    /// ```
    Crc32,
    u32,
    TABLES32
);

reflected_crc!(
    /// CRC-64/XZ (polynomial 0x42F0E1EBA9EA3693, reflected 0xC96C5795D7870F42).
    Crc64,
    u64,
    TABLES64
);
