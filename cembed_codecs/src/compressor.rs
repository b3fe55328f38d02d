use std::path::{Path, PathBuf};
use std::process::Command;

use cembed_core::{EmbedError, Result};

/// Produces a complete lz4 frame for a file.
///
/// The frame must be written at maximum compression, without content
/// checksum and without sparse-file handling; everything past offset 11 is
/// handed to the runtime block decompressor.
pub trait Compressor: Send + Sync {
    /// Program name, for diagnostics.
    fn program(&self) -> &str;

    fn compress_file(&self, path: &Path) -> Result<Vec<u8>>;
}

/// The `lz4` command-line tool, run once per file.
///
/// Equivalent to `lz4 -9 --no-frame-crc --no-sparse -c FILE`; stdout is the
/// frame. A non-zero exit status, or a program that cannot be found or
/// started, is an [`EmbedError::ExternalTool`].
#[derive(Debug, Clone)]
pub struct Lz4Command {
    program: String,
}

/// Flags passed before the input path.
pub const LZ4_ARGS: &[&str] = &["-9", "--no-frame-crc", "--no-sparse", "-c"];

impl Lz4Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|e| EmbedError::ExternalTool {
            program: self.program.clone(),
            reason: format!("not found: {e}"),
        })
    }
}

impl Default for Lz4Command {
    fn default() -> Self {
        Self::new("lz4")
    }
}

impl Compressor for Lz4Command {
    fn program(&self) -> &str {
        &self.program
    }

    fn compress_file(&self, path: &Path) -> Result<Vec<u8>> {
        let executable = self.locate()?;
        log::debug!("running {} {} {}", executable.display(), LZ4_ARGS.join(" "), path.display());

        let output = Command::new(&executable)
            .args(LZ4_ARGS)
            .arg(path)
            .output()
            .map_err(|e| EmbedError::ExternalTool {
                program: self.program.clone(),
                reason: format!("cannot launch {}: {e}", executable.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EmbedError::ExternalTool {
                program: self.program.clone(),
                reason: format!("{} on {}: {}", output.status, path.display(), stderr.trim()),
            });
        }
        Ok(output.stdout)
    }
}
