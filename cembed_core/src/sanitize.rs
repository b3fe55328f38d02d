use std::path::Path;

/// Final path component of `path`, lossily converted to UTF-8.
///
/// Falls back to the whole path when it has no file name (e.g. `..`).
pub fn basename(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Turn a file base name into a C identifier fragment.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, and so does a first
/// character that is not a letter. The result always matches
/// `[A-Za-z_][A-Za-z0-9_]*`; an empty name yields `_`.
pub fn sanitize_symbol(name: &str) -> String {
    let mut out = String::with_capacity(name.len().max(1));
    for (i, c) in name.chars().enumerate() {
        let keep = if i == 0 {
            c.is_ascii_alphabetic()
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };
        out.push(if keep { c } else { '_' });
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Whether `s` is a complete C identifier, `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Sanitized symbol for the base name of `path`.
pub fn symbol_for_path(path: &Path) -> String {
    sanitize_symbol(&basename(path))
}
