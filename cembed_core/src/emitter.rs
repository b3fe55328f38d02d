use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{self, Write};

use crate::error::{EmbedError, Result};
use crate::format::{pack_row_word, FormatCode, DEFAULT_LINE_WIDTH, FORMAT_BITS, FORMAT_MASK};
use crate::literal::LiteralLines;
use crate::model::{OutputDocument, ResourceEntry};
use crate::sanitize::is_identifier;

/// File-scope names the implementation section pulls in from the C library.
const LIBRARY_NAMES: &[(&str, &str)] = &[
    ("size_t", "<stddef.h>"),
    ("uint8_t", "<stdint.h>"),
    ("uint32_t", "<stdint.h>"),
];

/// Shape of the generated header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Enum of resource ids, row table and a decoding loader.
    #[default]
    Table,
    /// One exported pointer per resource; no table, no loader, no decoding.
    Raw,
}

/// Everything the emitter needs besides the document itself.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub mode: Mode,
    /// Characters per literal line.
    pub line_width: usize,
    /// Name of the generated `void *(int id)` loader.
    pub loader: String,
    /// Runtime allocator, `void *(size_t)`, supplied by the embedding program.
    pub allocator: String,
    /// Runtime block decompressor, `void (const uint8_t *, uint32_t, void *)`,
    /// supplied by the embedding program.
    pub decompressor: String,
    /// Program name quoted in the banner.
    pub generator: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Table,
            line_width: DEFAULT_LINE_WIDTH,
            loader: "load_resource".to_string(),
            allocator: "t_malloc".to_string(),
            decompressor: "lz4_block_decompress".to_string(),
            generator: "cembed".to_string(),
        }
    }
}

/// Renders an [`OutputDocument`] as a single C header.
///
/// # Layout (table mode)
/// ```text
/// banner comment
/// #ifndef _<P>DEFINITION           ← P = upper-cased prefix
///   enum <prefix>enum { <prefix><symbol>, ... };
///   void *<loader>(int id);
/// #endif
/// #ifdef <P>IMPLEMENTATION         ← defined by exactly one translation unit
///   runtime collaborator declarations
///   static const char _<prefix><symbol>[] = "...";   ← one per entry
///   _<prefix>table[] = { { data, data_sz, packed }, ... }
///   <loader> body
/// #endif
/// ```
///
/// [`render`](Self::render) runs [`check`](Self::check) first and refuses any
/// document that would not compile.
pub struct Emitter {
    options: EmitOptions,
}

impl Emitter {
    pub fn new(options: EmitOptions) -> Self {
        Self { options }
    }

    /// Check that `document` can be emitted as valid C.
    ///
    /// Table mode needs at least one entry, every size within a row's limits,
    /// and every file-scope name distinct: enum members `<prefix><symbol>`,
    /// arrays `_<prefix><symbol>`, the row table, the runtime functions and
    /// the library types the loader uses. Raw mode only declares
    /// `<prefix><symbol>`, which the document already keeps distinct.
    pub fn check(&self, document: &OutputDocument) -> Result<()> {
        if self.options.mode == Mode::Raw {
            return Ok(());
        }
        if document.is_empty() {
            return Err(EmbedError::EmptyDocument);
        }
        document.check_table_limits()?;

        let prefix = document.prefix();
        let EmitOptions {
            loader,
            allocator,
            decompressor,
            ..
        } = &self.options;

        let mut owners: HashMap<String, String> = HashMap::new();
        let mut claim = |name: String, owner: String| match owners.entry(name) {
            Entry::Occupied(taken) => Err(EmbedError::NameClash {
                name: taken.key().clone(),
                owner,
                other: taken.get().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(owner);
                Ok(())
            }
        };

        for (name, header) in LIBRARY_NAMES {
            claim(name.to_string(), header.to_string())?;
        }
        for (what, name) in [("loader", loader), ("allocator", allocator), ("decompressor", decompressor)] {
            if !is_identifier(name) {
                return Err(EmbedError::InvalidIdentifier {
                    what,
                    name: name.clone(),
                });
            }
            claim(name.clone(), format!("the {what}"))?;
        }
        claim(format!("_{prefix}table"), "the row table".to_string())?;
        for entry in document.entries() {
            let owner = entry.source_path.display().to_string();
            claim(format!("{prefix}{}", entry.symbol), owner.clone())?;
            claim(format!("_{prefix}{}", entry.symbol), owner)?;
        }
        Ok(())
    }

    /// Check `document`, then render the complete header into a string.
    pub fn render(&self, document: &OutputDocument) -> Result<String> {
        self.check(document)?;
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.emit(document, &mut buf);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn emit<W: Write>(&self, document: &OutputDocument, out: &mut W) -> io::Result<()> {
        let guard = document.prefix().to_uppercase();
        self.write_banner(&guard, out)?;
        match self.options.mode {
            Mode::Table => self.write_table_mode(document, &guard, out),
            Mode::Raw => self.write_raw_mode(document, &guard, out),
        }
    }

    fn write_banner<W: Write>(&self, guard: &str, out: &mut W) -> io::Result<()> {
        writeln!(out, "/*")?;
        writeln!(out, "  file autogenerated by {}, do not edit.", self.options.generator)?;
        writeln!(out, "  define {guard}IMPLEMENTATION to include the real data, once.")?;
        writeln!(out, "*/")?;
        writeln!(out)
    }

    fn write_implementation_open<W: Write>(guard: &str, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "#ifdef {guard}IMPLEMENTATION  // {}", "-".repeat(80))?;
        writeln!(out)
    }

    fn write_literal<W: Write>(&self, declaration: &str, bytes: &[u8], out: &mut W) -> io::Result<()> {
        writeln!(out, "{declaration} =")?;
        let mut lines = LiteralLines::new(bytes, self.options.line_width).peekable();
        while let Some(line) = lines.next() {
            let end = if lines.peek().is_some() { "" } else { ";" };
            writeln!(out, " \"{line}\"{end}")?;
        }
        writeln!(out)
    }

    // ── Raw mode ───────────────────────────────────────────────────────────

    fn write_raw_mode<W: Write>(&self, document: &OutputDocument, guard: &str, out: &mut W) -> io::Result<()> {
        let prefix = document.prefix();
        writeln!(out, "#ifndef _{guard}DEFINITION")?;
        writeln!(out, "#define _{guard}DEFINITION")?;
        for entry in document.entries() {
            writeln!(out, "extern const void *{prefix}{};", entry.symbol)?;
        }
        writeln!(out, "#endif // _{guard}DEFINITION")?;

        Self::write_implementation_open(guard, out)?;
        for entry in document.entries() {
            let declaration = format!("const void *{prefix}{}", entry.symbol);
            self.write_literal(&declaration, &entry.encoded, out)?;
        }
        writeln!(out, "#endif // {guard}IMPLEMENTATION")
    }

    // ── Table mode ─────────────────────────────────────────────────────────

    fn write_table_mode<W: Write>(&self, document: &OutputDocument, guard: &str, out: &mut W) -> io::Result<()> {
        let prefix = document.prefix();
        let EmitOptions {
            loader,
            allocator,
            decompressor,
            ..
        } = &self.options;

        writeln!(out, "#ifndef _{guard}DEFINITION")?;
        writeln!(out, "#define _{guard}DEFINITION")?;
        writeln!(out, "enum {prefix}enum {{")?;
        for entry in document.entries() {
            writeln!(out, "    {prefix}{},", entry.symbol)?;
        }
        writeln!(out, "}};")?;
        writeln!(out, "void *{loader}(int id);")?;
        writeln!(out, "#endif // _{guard}DEFINITION")?;

        Self::write_implementation_open(guard, out)?;
        writeln!(out, "#include <stddef.h>")?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out)?;
        writeln!(out, "// defined by the embedding program")?;
        writeln!(out, "void *{allocator}(size_t size);")?;
        writeln!(out, "void {decompressor}(const uint8_t *src, uint32_t src_sz, void *dst);")?;
        writeln!(out)?;

        for entry in document.entries() {
            let declaration = format!("static const char _{prefix}{}[]", entry.symbol);
            self.write_literal(&declaration, &entry.encoded, out)?;
        }

        writeln!(out, "static const struct {{")?;
        writeln!(out, "    const char *data;")?;
        writeln!(out, "    uint32_t data_sz;")?;
        writeln!(out, "    uint32_t packed; // bits 0-{}: format, bits {}-31: decoded size", FORMAT_BITS - 1, FORMAT_BITS)?;
        writeln!(out, "}} _{prefix}table[] = {{")?;
        for entry in document.entries() {
            Self::write_row(prefix, entry, out)?;
        }
        writeln!(out, "}};")?;
        writeln!(out)?;

        writeln!(out, "void *{loader}(int id)")?;
        writeln!(out, "{{")?;
        writeln!(out, "    uint32_t packed = _{prefix}table[id].packed;")?;
        writeln!(out, "    if ((packed & 0x{FORMAT_MASK:x}u) == {}) {{", FormatCode::Identity.code())?;
        writeln!(out, "        return (void *)_{prefix}table[id].data;")?;
        writeln!(out, "    }} else {{")?;
        writeln!(out, "        void *data = {allocator}(packed >> {FORMAT_BITS});  // reserve memory")?;
        writeln!(
            out,
            "        {decompressor}((const uint8_t *)_{prefix}table[id].data, _{prefix}table[id].data_sz, data);"
        )?;
        writeln!(out, "        return data;")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "#endif // {guard}IMPLEMENTATION")
    }

    fn write_row<W: Write>(prefix: &str, entry: &ResourceEntry, out: &mut W) -> io::Result<()> {
        // `check` has bounded every decoded size.
        let packed = pack_row_word(entry.format, entry.decoded_size).unwrap_or(0);
        writeln!(
            out,
            "    {{ _{prefix}{}, {}, 0x{packed:08x}u }}, // {}, {} bytes",
            entry.symbol,
            entry.encoded_size(),
            entry.format.name(),
            entry.decoded_size
        )
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new(EmitOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn document(entries: &[(&str, FormatCode, &[u8], u64)]) -> OutputDocument {
        let entries = entries
            .iter()
            .map(|(symbol, format, bytes, decoded_size)| ResourceEntry {
                source_path: PathBuf::from(symbol),
                symbol: symbol.to_string(),
                format: *format,
                encoded: bytes.to_vec(),
                decoded_size: *decoded_size,
            })
            .collect();
        OutputDocument::new("_mydata", entries).unwrap()
    }

    #[test]
    fn table_mode_guards_and_enum() {
        let doc = document(&[("test_txt", FormatCode::Identity, b"Hello, World!\n", 14)]);
        let out = Emitter::default().render(&doc).unwrap();

        assert!(out.contains("#ifndef __MYDATADEFINITION\n#define __MYDATADEFINITION\n"));
        assert!(out.contains("enum _mydataenum {\n    _mydatatest_txt,\n};\n"));
        assert!(out.contains("void *load_resource(int id);\n#endif // __MYDATADEFINITION\n"));
        assert!(out.contains("#ifdef _MYDATAIMPLEMENTATION"));
        assert!(out.trim_end().ends_with("#endif // _MYDATAIMPLEMENTATION"));
    }

    #[test]
    fn table_mode_row_and_literal() {
        let doc = document(&[("test_txt", FormatCode::Identity, b"Hello, World!\n", 14)]);
        let out = Emitter::default().render(&doc).unwrap();

        assert!(out.contains("static const char __mydatatest_txt[] =\n \"Hello, World!\\12\";\n"));
        assert!(out.contains("    { __mydatatest_txt, 14, 0x00000038u }, // identity, 14 bytes\n"));
    }

    #[test]
    fn compressed_row_sets_format_bit() {
        let doc = document(&[("song_mod", FormatCode::BlockCompressed, b"\x10a", 1000)]);
        let out = Emitter::default().render(&doc).unwrap();
        assert!(out.contains("{ __mydatasong_mod, 2, 0x00000fa1u }, // lz4 block, 1000 bytes"));
    }

    #[test]
    fn loader_uses_configured_runtime_names() {
        let options = EmitOptions {
            loader: "get_asset".to_string(),
            allocator: "my_alloc".to_string(),
            decompressor: "unlz4".to_string(),
            ..EmitOptions::default()
        };
        let doc = document(&[("a", FormatCode::Identity, b"x", 1)]);
        let out = Emitter::new(options).render(&doc).unwrap();

        assert!(out.contains("void *get_asset(int id);"));
        assert!(out.contains("void *my_alloc(size_t size);"));
        assert!(out.contains("void unlz4(const uint8_t *src, uint32_t src_sz, void *dst);"));
        assert!(out.contains("void *data = my_alloc(packed >> 2);"));
        assert!(out.contains("unlz4((const uint8_t *)__mydatatable[id].data, __mydatatable[id].data_sz, data);"));
    }

    #[test]
    fn rows_follow_enum_order() {
        let doc = document(&[
            ("zeta", FormatCode::Identity, b"z", 1),
            ("alpha", FormatCode::Identity, b"a", 1),
        ]);
        let out = Emitter::default().render(&doc).unwrap();

        let enum_zeta = out.find("    _mydatazeta,").unwrap();
        let enum_alpha = out.find("    _mydataalpha,").unwrap();
        assert!(enum_zeta < enum_alpha);

        let row_zeta = out.find("{ __mydatazeta,").unwrap();
        let row_alpha = out.find("{ __mydataalpha,").unwrap();
        assert!(row_zeta < row_alpha);
    }

    #[test]
    fn raw_mode_exports_pointers_only() {
        let options = EmitOptions {
            mode: Mode::Raw,
            ..EmitOptions::default()
        };
        let doc = document(&[("logo_png", FormatCode::Identity, b"\x89PNG", 4)]);
        let out = Emitter::new(options).render(&doc).unwrap();

        assert!(out.contains("extern const void *_mydatalogo_png;\n"));
        assert!(out.contains("const void *_mydatalogo_png =\n \"\\211PNG\";\n"));
        assert!(!out.contains("enum"));
        assert!(!out.contains("load_resource"));
        assert!(!out.contains("table"));
    }

    fn table_entry(path: &str, symbol: &str) -> ResourceEntry {
        ResourceEntry {
            source_path: PathBuf::from(path),
            symbol: symbol.to_string(),
            format: FormatCode::Identity,
            encoded: b"x".to_vec(),
            decoded_size: 1,
        }
    }

    #[test]
    fn file_named_table_clashes_with_row_table() {
        let doc = OutputDocument::new("d_", vec![table_entry("test.txt", "test_txt"), table_entry("table", "table")])
            .unwrap();
        let err = Emitter::default().render(&doc).unwrap_err();
        match err {
            EmbedError::NameClash { name, owner, other } => {
                assert_eq!(name, "_d_table");
                assert_eq!(owner, "table");
                assert_eq!(other, "the row table");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_named_table_is_fine_in_raw_mode() {
        let options = EmitOptions {
            mode: Mode::Raw,
            ..EmitOptions::default()
        };
        let doc = OutputDocument::new("d_", vec![table_entry("table", "table")]).unwrap();
        let out = Emitter::new(options).render(&doc).unwrap();
        assert!(out.contains("const void *d_table =\n \"x\";\n"));
    }

    #[test]
    fn members_and_arrays_share_one_namespace() {
        // With an empty prefix, the array for `x` is `_x`, which is also the
        // member for `_x`.
        let doc = OutputDocument::new("", vec![table_entry("x", "x"), table_entry("_x", "_x")]).unwrap();
        let err = Emitter::default().render(&doc).unwrap_err();
        assert!(matches!(err, EmbedError::NameClash { ref name, .. } if name == "_x"), "{err}");
    }

    #[test]
    fn symbol_matching_a_runtime_name_is_rejected() {
        let doc = OutputDocument::new("", vec![table_entry("t_malloc", "t_malloc")]).unwrap();
        let err = Emitter::default().render(&doc).unwrap_err();
        assert_eq!(err.to_string(), "t_malloc would define 't_malloc', which is already used by the allocator");

        let doc = OutputDocument::new("", vec![table_entry("uint32_t", "uint32_t")]).unwrap();
        assert!(Emitter::default().render(&doc).is_err());
    }

    #[test]
    fn runtime_names_must_be_identifiers() {
        let options = EmitOptions {
            loader: "load-resource".to_string(),
            ..EmitOptions::default()
        };
        let doc = document(&[("a", FormatCode::Identity, b"x", 1)]);
        let err = Emitter::new(options).render(&doc).unwrap_err();
        assert_eq!(err.to_string(), "loader 'load-resource' is not a valid C identifier");
    }

    #[test]
    fn empty_document_is_rejected_in_table_mode() {
        let doc = OutputDocument::new("d_", Vec::new()).unwrap();
        assert!(matches!(Emitter::default().render(&doc), Err(EmbedError::EmptyDocument)));

        let options = EmitOptions {
            mode: Mode::Raw,
            ..EmitOptions::default()
        };
        assert!(Emitter::new(options).render(&doc).is_ok());
    }

    #[test]
    fn oversized_entry_is_rejected_before_rendering() {
        let doc = document(&[("huge", FormatCode::Identity, b"x", crate::format::MAX_DECODED_SIZE)]);
        let err = Emitter::default().render(&doc).unwrap_err();
        assert!(matches!(err, EmbedError::SizeOverflow { field: "decoded size", .. }), "{err}");
    }

    #[test]
    fn long_literals_span_several_lines() {
        let data = vec![b'a'; 250];
        let options = EmitOptions {
            line_width: 100,
            ..EmitOptions::default()
        };
        let doc = document(&[("big", FormatCode::Identity, &data, 250)]);
        let out = Emitter::new(options).render(&doc).unwrap();

        let a100 = "a".repeat(100);
        let a50 = "a".repeat(50);
        let expected = format!(
            "static const char __mydatabig[] =\n \"{a100}\"\n \"{a100}\"\n \"{a50}\";\n"
        );
        assert!(out.contains(&expected), "{out}");
    }
}
