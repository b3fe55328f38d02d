use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{EmbedError, Result};
use crate::format::{FormatCode, MAX_DECODED_SIZE, MAX_ENCODED_SIZE};
use crate::sanitize::is_identifier;

/// One embedded file, fully encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Path the file was read from.
    pub source_path: PathBuf,
    /// Sanitized identifier fragment derived from the base name.
    pub symbol: String,
    pub format: FormatCode,
    /// Bytes placed in the generated literal.
    pub encoded: Vec<u8>,
    /// Length of the original file.
    pub decoded_size: u64,
}

impl ResourceEntry {
    pub fn encoded_size(&self) -> u64 {
        self.encoded.len() as u64
    }
}

/// The complete, immutable input to the emitter.
///
/// Entry order is the resource-id contract: entry `i` becomes enum ordinal
/// `i` and table row `i`.
#[derive(Debug, Clone)]
pub struct OutputDocument {
    prefix: String,
    entries: Vec<ResourceEntry>,
}

impl OutputDocument {
    /// Assemble a document, rejecting entries whose symbols collide.
    ///
    /// The prefix is glued in front of identifiers, so it must be empty or an
    /// identifier itself.
    pub fn new(prefix: impl Into<String>, entries: Vec<ResourceEntry>) -> Result<Self> {
        let prefix = prefix.into();
        if !prefix.is_empty() && !is_identifier(&prefix) {
            return Err(EmbedError::InvalidIdentifier {
                what: "prefix",
                name: prefix,
            });
        }
        let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(entries.len());
        for entry in &entries {
            if let Some(first) = seen.insert(entry.symbol.as_str(), entry.source_path.as_path()) {
                return Err(EmbedError::DuplicateSymbol {
                    symbol: entry.symbol.clone(),
                    first: first.to_path_buf(),
                    second: entry.source_path.clone(),
                });
            }
        }
        Ok(Self { prefix, entries })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total encoded bytes across all entries.
    pub fn encoded_size(&self) -> u64 {
        self.entries.iter().map(ResourceEntry::encoded_size).sum()
    }

    /// Total decoded bytes across all entries.
    pub fn decoded_size(&self) -> u64 {
        self.entries.iter().map(|e| e.decoded_size).sum()
    }

    /// Check that every entry fits a table row: 32-bit encoded size and
    /// 30-bit decoded size.
    pub fn check_table_limits(&self) -> Result<()> {
        for entry in &self.entries {
            if entry.encoded_size() >= MAX_ENCODED_SIZE {
                return Err(EmbedError::SizeOverflow {
                    path: entry.source_path.clone(),
                    field: "encoded size",
                    size: entry.encoded_size(),
                    limit: MAX_ENCODED_SIZE - 1,
                });
            }
            if entry.decoded_size >= MAX_DECODED_SIZE {
                return Err(EmbedError::SizeOverflow {
                    path: entry.source_path.clone(),
                    field: "decoded size",
                    size: entry.decoded_size,
                    limit: MAX_DECODED_SIZE - 1,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, symbol: &str, decoded_size: u64) -> ResourceEntry {
        ResourceEntry {
            source_path: PathBuf::from(path),
            symbol: symbol.to_string(),
            format: FormatCode::Identity,
            encoded: vec![0; 4],
            decoded_size,
        }
    }

    #[test]
    fn colliding_symbols_are_rejected() {
        let err = OutputDocument::new("data_", vec![entry("a.b", "a_b", 4), entry("a_b", "a_b", 4)])
            .unwrap_err();
        match err {
            EmbedError::DuplicateSymbol { symbol, first, second } => {
                assert_eq!(symbol, "a_b");
                assert_eq!(first, PathBuf::from("a.b"));
                assert_eq!(second, PathBuf::from("a_b"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prefix_must_be_an_identifier() {
        let err = OutputDocument::new("my-data", vec![entry("a", "a", 4)]).unwrap_err();
        assert_eq!(err.to_string(), "prefix 'my-data' is not a valid C identifier");
        assert!(OutputDocument::new("", vec![entry("a", "a", 4)]).is_ok());
    }

    #[test]
    fn entry_order_is_preserved() {
        let doc = OutputDocument::new(
            "data_",
            vec![entry("z", "z", 4), entry("a", "a", 4), entry("m", "m", 4)],
        )
        .unwrap();
        let symbols: Vec<_> = doc.entries().iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, ["z", "a", "m"]);
        assert_eq!(doc.encoded_size(), 12);
    }

    #[test]
    fn decoded_size_limit_is_thirty_bits() {
        let ok = OutputDocument::new("d", vec![entry("a", "a", MAX_DECODED_SIZE - 1)]).unwrap();
        assert!(ok.check_table_limits().is_ok());

        let too_big = OutputDocument::new("d", vec![entry("a", "a", MAX_DECODED_SIZE)]).unwrap();
        assert!(matches!(
            too_big.check_table_limits(),
            Err(EmbedError::SizeOverflow { field: "decoded size", .. })
        ));
    }
}
