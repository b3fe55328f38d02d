/// Magic number opening every standard lz4 frame (0x184D2204, little endian).
pub const LZ4_FRAME_MAGIC: [u8; 4] = [0x04, 0x22, 0x4D, 0x18];

/// Offset of the block word inside an lz4 frame produced without a
/// content-size field or dictionary id.
///   magic[4] + FLG:u8 + BD:u8 + HC:u8 = 7
pub const LZ4_BLOCK_WORD_OFFSET: usize = 7;

/// Offset of the bare block payload inside such a frame.
///   frame header[7] + block word:u32 = 11
pub const LZ4_BLOCK_PAYLOAD_OFFSET: usize = 11;

/// Default width, in characters, of one rendered literal line.
pub const DEFAULT_LINE_WIDTH: usize = 120;

// ── Packed row word ────────────────────────────────────────────────────────
//
//   bit  31 ........................... 2   1   0
//        [        decoded size          ] [format]
//
// The generated loader only ever uses `packed & 0x3` and `packed >> 2`, so the
// layout is the same on every compiler and target.

/// Bits of the packed word reserved for the format code.
pub const FORMAT_BITS: u32 = 2;

/// Mask selecting the format code from a packed word.
pub const FORMAT_MASK: u32 = (1 << FORMAT_BITS) - 1;

/// Decoded sizes must be strictly below this to fit the packed word.
pub const MAX_DECODED_SIZE: u64 = 1 << (32 - FORMAT_BITS);

/// Encoded sizes are stored as a plain `uint32_t`.
pub const MAX_ENCODED_SIZE: u64 = 1 << 32;

// ── Format codes ───────────────────────────────────────────────────────────

/// How an entry's bytes are stored in the generated table.
///
/// Two bits are reserved in the row, so at most four formats can exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCode {
    /// Bytes are the file content; the loader returns them in place.
    Identity = 0,
    /// Bytes are a bare lz4 block; the loader allocates and decompresses.
    BlockCompressed = 1,
}

impl FormatCode {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Identity),
            1 => Some(Self::BlockCompressed),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::BlockCompressed => "lz4 block",
        }
    }
}

/// Pack a format code and decoded size into one row word.
///
/// Returns `None` when `decoded_size` does not fit in 30 bits.
pub fn pack_row_word(format: FormatCode, decoded_size: u64) -> Option<u32> {
    if decoded_size >= MAX_DECODED_SIZE {
        return None;
    }
    Some(((decoded_size as u32) << FORMAT_BITS) | format.code())
}

/// Split a row word back into its raw format code and decoded size.
///
/// The code is returned undecoded so that callers can report codes with no
/// [`FormatCode`] counterpart.
pub fn unpack_row_word(word: u32) -> (u32, u32) {
    (word & FORMAT_MASK, word >> FORMAT_BITS)
}
