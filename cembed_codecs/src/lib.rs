mod block;
mod compressor;
mod identity;

pub use block::{extract_block, BlockCompressStrategy, FrameBlock};
pub use compressor::{Compressor, Lz4Command, LZ4_ARGS};
pub use identity::IdentityStrategy;

use cembed_core::Encoder;

/// An encoder knowing every bundled strategy: `raw`/`identity` and
/// `lz4`/`block-compress` backed by `compressor`.
///
/// Used by the CLI with [`Lz4Command`], and by tests with in-process
/// compressors.
pub fn default_encoder<C: Compressor + 'static>(compressor: C) -> Encoder {
    Encoder::new()
        .register(Box::new(IdentityStrategy))
        .register(Box::new(BlockCompressStrategy::new(compressor)))
}
