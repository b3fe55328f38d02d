use std::path::Path;

use crate::error::Result;
use crate::format::FormatCode;

/// The input handed to a strategy: where the bytes came from and the bytes.
///
/// Strategies that delegate to an external tool use `path`; in-process ones
/// only need `data`.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub path: &'a Path,
    pub data: &'a [u8],
}

/// Output of a strategy: the bytes to embed and how the loader must treat them.
///
/// `format` may differ from [`EncodingStrategy::format`] when a strategy
/// decides an input is better stored another way (e.g. an incompressible
/// block kept verbatim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub format: FormatCode,
    pub bytes: Vec<u8>,
}

impl Encoded {
    pub fn identity(bytes: Vec<u8>) -> Self {
        Self {
            format: FormatCode::Identity,
            bytes,
        }
    }
}

/// One way of turning a file into embeddable bytes.
///
/// Each strategy:
/// - Is selected by one of its `tags()` in a `FILE:TAG` argument; the first
///   tag is its canonical name.
/// - Owns its own validation. Anything it cannot vouch for must be an error,
///   never silently embedded, because the generated loader trusts the row.
/// - Is invoked exactly once per entry; there is no retry.
pub trait EncodingStrategy: Send + Sync {
    /// Tags selecting this strategy. Must not be empty.
    fn tags(&self) -> &'static [&'static str];

    /// Format code this strategy normally produces. The encoder logs entries
    /// that come back in another format.
    fn format(&self) -> FormatCode;

    /// Encode one source.
    fn encode(&self, source: &Source<'_>) -> Result<Encoded>;

    /// Canonical tag, used in log lines.
    fn name(&self) -> &'static str {
        self.tags().first().copied().unwrap_or("?")
    }
}
