use cembed_core::format::{LZ4_BLOCK_PAYLOAD_OFFSET, LZ4_BLOCK_WORD_OFFSET, LZ4_FRAME_MAGIC};
use cembed_core::{EmbedError, Encoded, EncodingStrategy, FormatCode, Result, Source};

use crate::compressor::Compressor;

// FLG byte of the lz4 frame descriptor.
const FLG_VERSION_MASK: u8 = 0b1100_0000;
const FLG_VERSION_01: u8 = 0b0100_0000;
const FLG_BLOCK_CHECKSUM: u8 = 1 << 4;
const FLG_CONTENT_SIZE: u8 = 1 << 3;
const FLG_DICT_ID: u8 = 1 << 0;

/// High bit of a block word: the block is stored uncompressed.
const BLOCK_UNCOMPRESSED: u32 = 1 << 31;

/// The single data block carried by a validated frame.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameBlock<'a> {
    /// The frame holds no block at all (empty input).
    Empty,
    /// The compressor gave up and stored the input verbatim.
    Stored(&'a [u8]),
    /// A bare compressed block, ready for the runtime decompressor.
    Compressed(&'a [u8]),
}

/// Validate an lz4 frame and locate its only block.
///
/// Accepts exactly what the runtime contract can consume: a version-01 frame
/// whose descriptor has no content size, dictionary id or block checksums
/// (so the block starts at offset 11), followed by one block and the end mark.
pub fn extract_block(frame: &[u8]) -> std::result::Result<FrameBlock<'_>, String> {
    if frame.len() < 4 || frame[..4] != LZ4_FRAME_MAGIC {
        let head = &frame[..frame.len().min(4)];
        return Err(format!("magic number is {head:02x?}, expected {LZ4_FRAME_MAGIC:02x?}"));
    }
    if frame.len() < LZ4_BLOCK_PAYLOAD_OFFSET {
        return Err(format!("frame is only {} bytes long", frame.len()));
    }

    let flg = frame[4];
    if flg & FLG_VERSION_MASK != FLG_VERSION_01 {
        return Err(format!("unsupported frame version bits {:#04x}", flg & FLG_VERSION_MASK));
    }
    if flg & (FLG_CONTENT_SIZE | FLG_DICT_ID) != 0 {
        return Err(format!("frame descriptor {flg:#04x} carries optional fields; block would not start at offset {LZ4_BLOCK_PAYLOAD_OFFSET}"));
    }
    if flg & FLG_BLOCK_CHECKSUM != 0 {
        return Err("frame uses block checksums".to_string());
    }

    let word = read_u32_le(frame, LZ4_BLOCK_WORD_OFFSET);
    if word == 0 {
        return Ok(FrameBlock::Empty);
    }
    let len = (word & !BLOCK_UNCOMPRESSED) as usize;
    let end = LZ4_BLOCK_PAYLOAD_OFFSET + len;
    if frame.len() < end + 4 {
        return Err(format!("block of {len} bytes is truncated (frame is {} bytes)", frame.len()));
    }
    if read_u32_le(frame, end) != 0 {
        return Err("frame holds more than one block; use a larger lz4 block size".to_string());
    }

    let payload = &frame[LZ4_BLOCK_PAYLOAD_OFFSET..end];
    if word & BLOCK_UNCOMPRESSED != 0 {
        Ok(FrameBlock::Stored(payload))
    } else {
        Ok(FrameBlock::Compressed(payload))
    }
}

fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// lz4 block compression through an external [`Compressor`].
///
/// The compressor's frame is validated with [`extract_block`] and reduced to
/// the bare block the runtime decompressor expects. Blocks the compressor
/// stored uncompressed (and empty inputs) are embedded as identity rows,
/// since a block decompressor cannot consume them.
///
/// Best for: text, tile maps, sound samples; anything that shrinks.
pub struct BlockCompressStrategy<C> {
    compressor: C,
}

impl<C: Compressor> BlockCompressStrategy<C> {
    pub fn new(compressor: C) -> Self {
        Self { compressor }
    }
}

impl<C: Compressor> EncodingStrategy for BlockCompressStrategy<C> {
    fn tags(&self) -> &'static [&'static str] {
        &["lz4", "block-compress"]
    }

    fn format(&self) -> FormatCode {
        FormatCode::BlockCompressed
    }

    fn encode(&self, source: &Source<'_>) -> Result<Encoded> {
        let frame = self.compressor.compress_file(source.path)?;
        let mismatch = |reason: String| EmbedError::ContainerMismatch {
            path: source.path.to_path_buf(),
            reason: format!("{} output: {reason}", self.compressor.program()),
        };

        match extract_block(&frame).map_err(mismatch)? {
            FrameBlock::Empty if source.data.is_empty() => Ok(Encoded::identity(Vec::new())),
            FrameBlock::Empty => Err(mismatch(format!(
                "empty frame for a {} byte file",
                source.data.len()
            ))),
            FrameBlock::Stored(payload) if payload == source.data => Ok(Encoded::identity(payload.to_vec())),
            FrameBlock::Stored(payload) => Err(mismatch(format!(
                "stored block of {} bytes does not match the {} byte file",
                payload.len(),
                source.data.len()
            ))),
            FrameBlock::Compressed(payload) => Ok(Encoded {
                format: FormatCode::BlockCompressed,
                bytes: payload.to_vec(),
            }),
        }
    }
}
