use cembed_core::{Encoded, EncodingStrategy, FormatCode, Result, Source, RAW_TAG};

/// Embeds files verbatim.
///
/// Useful for:
/// - Data that is already compressed (PNG, OGG) where lz4 would only add
///   a decode step.
/// - Raw mode, where no loader exists to undo an encoding.
pub struct IdentityStrategy;

impl EncodingStrategy for IdentityStrategy {
    fn tags(&self) -> &'static [&'static str] {
        &[RAW_TAG, "identity"]
    }

    fn format(&self) -> FormatCode {
        FormatCode::Identity
    }

    fn encode(&self, source: &Source<'_>) -> Result<Encoded> {
        Ok(Encoded::identity(source.data.to_vec()))
    }
}
