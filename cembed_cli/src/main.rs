use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use cembed_codecs::{default_encoder, Lz4Command};
use cembed_core::format::DEFAULT_LINE_WIDTH;
use cembed_core::{EmitOptions, GeneratedHeader, Generated, Generator, InputSpec, Mode};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "cembed",
    about = "Embed binary files in a C header, optionally lz4-compressed",
    long_about = "Embed binary files in a C header, optionally lz4-compressed.\n\n\
        Define <PREFIX>IMPLEMENTATION (upper-cased prefix) in exactly one translation \
        unit to get the data. In table mode, call the loader with an enum id; lz4 \
        entries need an allocator and an lz4 block decompressor from your program.",
    after_help = "example: cembed ./test.data embed.py:raw test.txt:lz4 --prefix=_mydata",
    version
)]
struct Cli {
    /// Files to embed, each optionally tagged with an encoding: raw | lz4
    #[arg(value_name = "FILE[:ENCODING]", required = true)]
    inputs: Vec<InputSpec>,

    /// Prefix for every generated C identifier
    #[arg(long, default_value = "data_")]
    prefix: String,

    /// Only expose raw pointers; disables every encoding
    #[arg(long)]
    raw: bool,

    /// Write the header here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Characters per string-literal line
    #[arg(long, default_value_t = DEFAULT_LINE_WIDTH as u16, value_parser = clap::value_parser!(u16).range(1..))]
    line_width: u16,

    /// lz4 executable used for lz4 entries
    #[arg(long, default_value = "lz4")]
    lz4: String,

    /// Name of the generated loader function
    #[arg(long, default_value = "load_resource")]
    loader: String,

    /// Runtime allocator the loader calls
    #[arg(long, default_value = "t_malloc")]
    allocator: String,

    /// Runtime lz4 block decompressor the loader calls
    #[arg(long, default_value = "lz4_block_decompress")]
    decompressor: String,

    /// Parse the generated header back and check every resource decodes
    /// to its file before writing anything
    #[arg(long)]
    verify: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

/// Check that the rendered text gives back every input file.
fn verify(generated: &Generated, mode: Mode) -> anyhow::Result<()> {
    let header = GeneratedHeader::parse(&generated.text).context("re-parsing generated header")?;
    let prefix = generated.document.prefix();

    for (id, entry) in generated.document.entries().iter().enumerate() {
        let original = fs::read(&entry.source_path)
            .with_context(|| format!("re-reading {}", entry.source_path.display()))?;
        let embedded = match mode {
            Mode::Table => header
                .load_resource(id)
                .with_context(|| format!("loading resource {id} ({})", entry.source_path.display()))?,
            Mode::Raw => {
                let name = format!("{prefix}{}", entry.symbol);
                header
                    .literal(&name)
                    .with_context(|| format!("no pointer named {name} in output"))?
                    .to_vec()
            }
        };
        if embedded != original {
            bail!(
                "verification failed for {}: embedded data differs from the file",
                entry.source_path.display()
            );
        }
    }
    log::info!("verified {} resources", generated.document.len());
    Ok(())
}

/// Replace `path` with `text` in one step, so a failed run never leaves a
/// half-written header behind.
fn write_atomically(path: &Path, text: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    tmp.write_all(text.as_bytes())
        .with_context(|| format!("writing {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = if cli.raw { Mode::Raw } else { Mode::Table };
    let options = EmitOptions {
        mode,
        line_width: usize::from(cli.line_width),
        loader: cli.loader,
        allocator: cli.allocator,
        decompressor: cli.decompressor,
        ..EmitOptions::default()
    };

    let encoder = default_encoder(Lz4Command::new(cli.lz4));
    let generator = Generator::new(encoder, options, cli.prefix);
    let generated = generator.generate(&cli.inputs)?;

    if cli.verify {
        verify(&generated, mode)?;
    }

    match &cli.output {
        Some(path) => write_atomically(path, &generated.text)?,
        None => io::stdout()
            .lock()
            .write_all(generated.text.as_bytes())
            .context("writing to stdout")?,
    }

    log::info!(
        "{} resources, {} -> {} embedded ({} of source text)",
        generated.document.len(),
        human_bytes(generated.document.decoded_size()),
        human_bytes(generated.document.encoded_size()),
        human_bytes(generated.text.len() as u64)
    );
    Ok(())
}
