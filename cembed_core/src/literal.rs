//! Rendering of arbitrary bytes as C string-literal fragments.
//!
//! Each fragment is the body of one `"..."` literal; adjacent literals are
//! concatenated by the C compiler, so the fragments of one buffer can be laid
//! out one per line.
//!
//! A byte is written as itself only when it is printable ASCII and none of
//! `\`, `"`, `0`-`9` or `*`. Everything else becomes a bare octal escape
//! (`\0`, `\12`, `\377`). Since digits are never literal, no escape can be
//! extended by the character after it. Since `*` is never literal, `*/` can
//! never appear. A `?` following a literal `?` is also escaped so the output
//! never contains a trigraph.

use std::fmt::Write as _;

/// Whether `byte` may appear unescaped in a fragment, ignoring trigraphs.
pub fn is_printable(byte: u8) -> bool {
    (0x20..0x7F).contains(&byte) && !matches!(byte, b'\\' | b'"' | b'0'..=b'9' | b'*')
}

/// Iterator over the literal fragments of a byte slice.
///
/// A fragment is cut as soon as it reaches `width` characters. The final
/// fragment is always yielded, even when empty, so every input (including the
/// empty one) produces at least one fragment.
pub struct LiteralLines<'a> {
    bytes: &'a [u8],
    pos: usize,
    width: usize,
    last_was_question: bool,
    done: bool,
}

impl<'a> LiteralLines<'a> {
    /// `width` is clamped to at least 1.
    pub fn new(bytes: &'a [u8], width: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            width: width.max(1),
            last_was_question: false,
            done: false,
        }
    }
}

impl Iterator for LiteralLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let mut line = String::with_capacity(self.width + 4);
        while let Some(&byte) = self.bytes.get(self.pos) {
            self.pos += 1;
            let trigraph_risk = byte == b'?' && self.last_was_question;
            if is_printable(byte) && !trigraph_risk {
                line.push(byte as char);
                self.last_was_question = byte == b'?';
            } else {
                // Writing into a String cannot fail.
                let _ = write!(line, "\\{:o}", byte);
                self.last_was_question = false;
            }
            if line.len() >= self.width {
                return Some(line);
            }
        }
        self.done = true;
        Some(line)
    }
}

/// Collect every fragment of `bytes` at the given width.
pub fn render_lines(bytes: &[u8], width: usize) -> Vec<String> {
    LiteralLines::new(bytes, width).collect()
}
