pub mod emitter;
pub mod encoder;
pub mod error;
pub mod format;
pub mod literal;
pub mod model;
pub mod pipeline;
pub mod reader;
pub mod sanitize;
pub mod strategy;

pub use emitter::{EmitOptions, Emitter, Mode};
pub use encoder::{Encoder, InputSpec, RAW_TAG};
pub use error::{EmbedError, Result};
pub use format::FormatCode;
pub use model::{OutputDocument, ResourceEntry};
pub use pipeline::{Generated, Generator};
pub use reader::GeneratedHeader;
pub use strategy::{Encoded, EncodingStrategy, Source};
