use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EmbedError, Result};
use crate::model::{OutputDocument, ResourceEntry};
use crate::sanitize::symbol_for_path;
use crate::strategy::{EncodingStrategy, Source};

/// Tag of the identity strategy, used when an argument names none and when
/// raw output is forced.
pub const RAW_TAG: &str = "raw";

/// One `FILE[:TAG]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub path: PathBuf,
    pub tag: String,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tag: tag.into(),
        }
    }
}

impl FromStr for InputSpec {
    type Err = EmbedError;

    /// The tag is whatever follows the last `:`, provided it holds no path
    /// separator. `C:\assets\logo.png` is therefore a plain path.
    fn from_str(arg: &str) -> Result<Self> {
        let (path, tag) = match arg.rsplit_once(':') {
            Some((path, tag)) if !tag.contains(['/', '\\']) => (path, tag),
            _ => (arg, RAW_TAG),
        };
        if path.is_empty() || tag.is_empty() {
            return Err(EmbedError::InvalidInputSpec(arg.to_string()));
        }
        Ok(Self::new(path, tag))
    }
}

/// Reads input files and runs them through the strategy registered for
/// their tag.
///
/// Strategies are looked up in registration order; the first one listing a
/// tag wins.
pub struct Encoder {
    strategies: Vec<Box<dyn EncodingStrategy>>,
    force_raw: bool,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            force_raw: false,
        }
    }

    pub fn register(mut self, strategy: Box<dyn EncodingStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// When set, every argument is encoded with the `raw` strategy whatever
    /// tag it names.
    pub fn force_raw(mut self, force_raw: bool) -> Self {
        self.force_raw = force_raw;
        self
    }

    /// Every registered tag, in registration order.
    pub fn known_tags(&self) -> Vec<String> {
        self.strategies
            .iter()
            .flat_map(|s| s.tags().iter().map(|t| t.to_string()))
            .collect()
    }

    /// Find the strategy for `tag`, honouring forced raw mode.
    pub fn resolve(&self, tag: &str) -> Result<&dyn EncodingStrategy> {
        let tag = if self.force_raw { RAW_TAG } else { tag };
        self.strategies
            .iter()
            .find(|s| s.tags().iter().any(|t| *t == tag))
            .map(|s| &**s)
            .ok_or_else(|| EmbedError::UnknownEncoding {
                tag: tag.to_string(),
                known: self.known_tags(),
            })
    }

    fn encode_with(&self, strategy: &dyn EncodingStrategy, input: &InputSpec) -> Result<ResourceEntry> {
        let data = fs::read(&input.path).map_err(|source| EmbedError::Io {
            path: input.path.clone(),
            source,
        })?;
        let encoded = strategy.encode(&Source {
            path: &input.path,
            data: &data,
        })?;
        if encoded.format != strategy.format() {
            log::info!(
                "{}: {} strategy stored it as {}",
                input.path.display(),
                strategy.name(),
                encoded.format.name()
            );
        }

        let entry = ResourceEntry {
            source_path: input.path.clone(),
            symbol: symbol_for_path(&input.path),
            format: encoded.format,
            encoded: encoded.bytes,
            decoded_size: data.len() as u64,
        };
        log::debug!(
            "{}: {} -> {} bytes as {} (strategy {})",
            input.path.display(),
            entry.decoded_size,
            entry.encoded_size(),
            entry.format.name(),
            strategy.name()
        );
        Ok(entry)
    }

    /// Encode every input, in order, into a document.
    ///
    /// All tags are resolved before any file is read, so an unknown tag fails
    /// the run without invoking a compressor.
    pub fn build_document(&self, prefix: &str, inputs: &[InputSpec]) -> Result<OutputDocument> {
        let strategies = inputs
            .iter()
            .map(|input| self.resolve(&input.tag))
            .collect::<Result<Vec<_>>>()?;

        let entries = strategies
            .into_iter()
            .zip(inputs)
            .map(|(strategy, input)| self.encode_with(strategy, input))
            .collect::<Result<Vec<_>>>()?;

        let document = OutputDocument::new(prefix, entries)?;
        log::info!(
            "encoded {} resources: {} bytes -> {} bytes",
            document.len(),
            document.decoded_size(),
            document.encoded_size()
        );
        Ok(document)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatCode;
    use crate::strategy::Encoded;

    struct Verbatim;

    impl EncodingStrategy for Verbatim {
        fn tags(&self) -> &'static [&'static str] {
            &["raw"]
        }

        fn format(&self) -> FormatCode {
            FormatCode::Identity
        }

        fn encode(&self, source: &Source<'_>) -> Result<Encoded> {
            Ok(Encoded::identity(source.data.to_vec()))
        }
    }

    #[test]
    fn input_spec_defaults_to_raw() {
        let spec: InputSpec = "assets/logo.png".parse().unwrap();
        assert_eq!(spec, InputSpec::new("assets/logo.png", "raw"));
    }

    #[test]
    fn input_spec_splits_on_last_colon() {
        let spec: InputSpec = "music.mod:lz4".parse().unwrap();
        assert_eq!(spec, InputSpec::new("music.mod", "lz4"));

        let spec: InputSpec = "weird:name.bin:raw".parse().unwrap();
        assert_eq!(spec, InputSpec::new("weird:name.bin", "raw"));
    }

    #[test]
    fn drive_letter_is_not_a_tag() {
        let spec: InputSpec = r"C:\assets\logo.png".parse().unwrap();
        assert_eq!(spec, InputSpec::new(r"C:\assets\logo.png", "raw"));
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(matches!("".parse::<InputSpec>(), Err(EmbedError::InvalidInputSpec(_))));
        assert!(matches!(":lz4".parse::<InputSpec>(), Err(EmbedError::InvalidInputSpec(_))));
        assert!(matches!("file:".parse::<InputSpec>(), Err(EmbedError::InvalidInputSpec(_))));
    }

    #[test]
    fn unknown_tag_lists_known_tags() {
        let encoder = Encoder::new().register(Box::new(Verbatim));
        let err = encoder.resolve("gzip").err().unwrap();
        assert_eq!(err.to_string(), "unknown encoding 'gzip' (known: raw)");
    }

    #[test]
    fn force_raw_overrides_any_tag() {
        let encoder = Encoder::new().register(Box::new(Verbatim)).force_raw(true);
        assert!(encoder.resolve("gzip").is_ok());
        assert!(encoder.resolve("lz4").is_ok());
    }

    #[test]
    fn missing_file_is_an_io_failure() {
        let encoder = Encoder::new().register(Box::new(Verbatim));
        let err = encoder
            .build_document("d_", &[InputSpec::new("/definitely/not/here.bin", "raw")])
            .unwrap_err();
        assert!(matches!(err, EmbedError::Io { .. }));
    }
}
