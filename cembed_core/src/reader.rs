use anyhow::{bail, Context};

use crate::format::{unpack_row_word, FormatCode};

/// One row of a generated `_<prefix>table[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Name of the literal array the row points at.
    pub data: String,
    pub data_size: u32,
    /// Raw two-bit format code.
    pub format: u32,
    pub decoded_size: u32,
}

/// A generated header parsed back into its parts.
///
/// Only understands the layout written by [`Emitter`](crate::emitter::Emitter);
/// it is a checking tool, not a C parser.
///
/// # What is recovered
/// - enum members, in declaration order (their index is the resource id)
/// - every literal, decoded back to bytes (table arrays and raw pointers)
/// - every table row
///
/// [`load_resource`](Self::load_resource) then does what the generated
/// loader does at run time, decoding format-1 rows with `lz4_flex`.
#[derive(Debug, Default)]
pub struct GeneratedHeader {
    members: Vec<String>,
    literals: Vec<(String, Vec<u8>)>,
    rows: Vec<TableRow>,
}

enum State {
    Top,
    Enum,
    Table,
    Literal { name: String, bytes: Vec<u8> },
}

impl GeneratedHeader {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut header = Self::default();
        let mut state = State::Top;

        for (number, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            let number = number + 1;
            state = match state {
                State::Top => Self::parse_top(line),
                State::Enum if line == "};" => State::Top,
                State::Enum => {
                    let member = line
                        .strip_suffix(',')
                        .with_context(|| format!("line {number}: malformed enum member {line:?}"))?;
                    header.members.push(member.to_string());
                    State::Enum
                }
                State::Table if line == "};" => State::Top,
                State::Table => {
                    let row = parse_row(line).with_context(|| format!("line {number}: malformed table row"))?;
                    header.rows.push(row);
                    State::Table
                }
                State::Literal { name, mut bytes } => {
                    let (body, last) = match line.strip_suffix(';') {
                        Some(body) => (body, true),
                        None => (line, false),
                    };
                    let body = body
                        .strip_prefix('"')
                        .and_then(|b| b.strip_suffix('"'))
                        .with_context(|| format!("line {number}: expected a string literal, got {line:?}"))?;
                    bytes.extend(unescape(body).with_context(|| format!("line {number}"))?);
                    if last {
                        if header.literals.iter().any(|(seen, _)| *seen == name) {
                            bail!("line {number}: {name} is defined twice");
                        }
                        header.literals.push((name, bytes));
                        State::Top
                    } else {
                        State::Literal { name, bytes }
                    }
                }
            };
        }

        if !matches!(state, State::Top) {
            bail!("generated header ends inside a declaration");
        }
        Ok(header)
    }

    fn parse_top(line: &str) -> State {
        if line.starts_with("enum ") && line.ends_with('{') {
            return State::Enum;
        }
        if line.starts_with("} ") && line.ends_with("table[] = {") {
            return State::Table;
        }
        let Some(declaration) = line.strip_suffix(" =") else {
            return State::Top;
        };
        let name = if let Some(rest) = declaration.strip_prefix("static const char ") {
            rest.trim_end_matches("[]")
        } else if let Some(rest) = declaration.strip_prefix("const void *") {
            rest
        } else {
            return State::Top;
        };
        State::Literal {
            name: name.to_string(),
            bytes: Vec::new(),
        }
    }

    /// Enum members in id order. Empty for raw-mode headers.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Resource id of an enum member.
    pub fn resource_id(&self, member: &str) -> Option<usize> {
        self.members.iter().position(|m| m == member)
    }

    /// Decoded bytes of a named literal (array or raw-mode pointer).
    pub fn literal(&self, name: &str) -> Option<&[u8]> {
        self.literals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Reproduce the generated loader for resource `id`.
    pub fn load_resource(&self, id: usize) -> anyhow::Result<Vec<u8>> {
        let Some(row) = self.rows.get(id) else {
            bail!("resource id {id} out of range (table has {} rows)", self.rows.len());
        };
        let data = self
            .literal(&row.data)
            .with_context(|| format!("row {id} points at undefined array {}", row.data))?;
        if data.len() != row.data_size as usize {
            bail!(
                "row {id} claims {} encoded bytes but {} holds {}",
                row.data_size,
                row.data,
                data.len()
            );
        }

        let decoded = match FormatCode::from_code(row.format) {
            Some(FormatCode::Identity) => data.to_vec(),
            Some(FormatCode::BlockCompressed) => lz4_flex::block::decompress(data, row.decoded_size as usize)
                .map_err(|e| anyhow::anyhow!("row {id}: lz4 block decompress error: {e}"))?,
            None => bail!("row {id} has unknown format code {}", row.format),
        };
        if decoded.len() != row.decoded_size as usize {
            bail!(
                "row {id} decodes to {} bytes, expected {}",
                decoded.len(),
                row.decoded_size
            );
        }
        Ok(decoded)
    }
}

/// Parse `{ name, size, 0xXXXXXXXXu }, // comment`.
fn parse_row(line: &str) -> anyhow::Result<TableRow> {
    let body = line
        .strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map(|(body, _)| body)
        .with_context(|| format!("expected '{{ ... }}', got {line:?}"))?;
    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    let &[data, size, packed] = fields.as_slice() else {
        bail!("expected three fields, got {}", fields.len());
    };
    let packed = packed
        .strip_prefix("0x")
        .map(|hex| hex.trim_end_matches('u'))
        .with_context(|| format!("packed word {packed:?} is not hex"))?;
    let packed = u32::from_str_radix(packed, 16).with_context(|| format!("bad packed word {packed:?}"))?;
    let (format, decoded_size) = unpack_row_word(packed);
    Ok(TableRow {
        data: data.to_string(),
        data_size: size.parse().with_context(|| format!("bad data size {size:?}"))?,
        format,
        decoded_size,
    })
}

/// Decode the body of one C string literal (without the quotes).
pub fn unescape(body: &str) -> anyhow::Result<Vec<u8>> {
    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        i += 1;
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        let Some(&escape) = bytes.get(i) else {
            bail!("dangling backslash at end of literal");
        };
        i += 1;
        let value = match escape {
            b'0'..=b'7' => {
                let mut value = u32::from(escape - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match bytes.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                u8::try_from(value).with_context(|| format!("octal escape \\{value:o} out of range"))?
            }
            b'x' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                let digits = &body[start..i];
                u8::from_str_radix(digits, 16).with_context(|| format!("bad hex escape \\x{digits}"))?
            }
            b'n' => b'\n',
            b't' => b'\t',
            b'r' => b'\r',
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'v' => 0x0B,
            b'\\' | b'"' | b'\'' | b'?' => escape,
            other => bail!("unsupported escape \\{}", other as char),
        };
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_octal_and_simple_escapes() {
        assert_eq!(unescape(r"a\12b").unwrap(), b"a\nb");
        assert_eq!(unescape(r"\0\377\52").unwrap(), b"\0\xff*");
        assert_eq!(unescape(r#"\n\t\\\"\x41"#).unwrap(), b"\n\t\\\"A");
    }

    #[test]
    fn octal_escape_stops_after_three_digits() {
        assert_eq!(unescape(r"\1011").unwrap(), b"A1");
    }

    #[test]
    fn unescape_rejects_garbage() {
        assert!(unescape("abc\\").is_err());
        assert!(unescape(r"\q").is_err());
        assert!(unescape(r"\777").is_err());
    }

    #[test]
    fn parse_row_unpacks_word() {
        let row = parse_row("{ __dx, 14, 0x00000038u }, // identity, 14 bytes").unwrap();
        assert_eq!(
            row,
            TableRow {
                data: "__dx".to_string(),
                data_size: 14,
                format: 0,
                decoded_size: 14,
            }
        );
    }

    #[test]
    fn truncated_header_is_an_error() {
        let text = "static const char _x[] =\n \"abc\"\n";
        assert!(GeneratedHeader::parse(text).is_err());
    }

    #[test]
    fn literal_defined_twice_is_an_error() {
        let text = "static const char _d_a[] =\n \"x\";\nstatic const char _d_a[] =\n \"y\";\n";
        let err = GeneratedHeader::parse(text).unwrap_err();
        assert!(err.to_string().contains("_d_a is defined twice"), "{err}");
    }
}
