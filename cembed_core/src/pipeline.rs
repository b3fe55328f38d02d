use crate::emitter::{EmitOptions, Emitter, Mode};
use crate::encoder::{Encoder, InputSpec};
use crate::error::Result;
use crate::model::OutputDocument;

/// Result of a successful run: the document and its rendered text.
#[derive(Debug)]
pub struct Generated {
    pub document: OutputDocument,
    pub text: String,
}

/// Encoder, emitter and prefix wired together for one run.
///
/// Raw mode has no loader to undo an encoding, so building a `Generator` in
/// raw mode forces the encoder to `raw` for every input.
pub struct Generator {
    encoder: Encoder,
    emitter: Emitter,
    prefix: String,
}

impl Generator {
    pub fn new(encoder: Encoder, options: EmitOptions, prefix: impl Into<String>) -> Self {
        let encoder = if options.mode == Mode::Raw {
            encoder.force_raw(true)
        } else {
            encoder
        };
        Self {
            encoder,
            emitter: Emitter::new(options),
            prefix: prefix.into(),
        }
    }

    /// Encode every input and render the header.
    ///
    /// Fails before rendering anything if any input fails or the document
    /// would not compile, so callers never see a partial or broken header.
    pub fn generate(&self, inputs: &[InputSpec]) -> Result<Generated> {
        let document = self.encoder.build_document(&self.prefix, inputs)?;
        let text = self.emitter.render(&document)?;
        Ok(Generated { document, text })
    }
}
