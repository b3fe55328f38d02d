use std::path::PathBuf;

/// Every way a generation run can fail.
///
/// None of these are recovered locally: the first error aborts the run before
/// any part of the document is written.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("cannot read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown encoding '{tag}' (known: {})", .known.join(", "))]
    UnknownEncoding { tag: String, known: Vec<String> },

    #[error("compressor output for {} is not a usable lz4 frame: {reason}", .path.display())]
    ContainerMismatch { path: PathBuf, reason: String },

    #[error("external compressor '{program}' failed: {reason}")]
    ExternalTool { program: String, reason: String },

    #[error("symbol '{symbol}' produced by both {} and {}", .first.display(), .second.display())]
    DuplicateSymbol {
        symbol: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{} is too large for the resource table: {field} = {size} (limit {limit})", .path.display())]
    SizeOverflow {
        path: PathBuf,
        field: &'static str,
        size: u64,
        limit: u64,
    },

    #[error("invalid input argument '{0}': expected FILE[:ENCODING]")]
    InvalidInputSpec(String),

    #[error("{what} '{name}' is not a valid C identifier")]
    InvalidIdentifier { what: &'static str, name: String },

    #[error("{owner} would define '{name}', which is already used by {other}")]
    NameClash {
        name: String,
        owner: String,
        other: String,
    },

    #[error("a table-mode header needs at least one resource")]
    EmptyDocument,
}

pub type Result<T> = std::result::Result<T, EmbedError>;
