//! Escaping untrusted text for inclusion in LaTeX markup.
//!
//! [`escape_latex`] makes arbitrary text safe to drop into a LaTeX document
//! body: every character with special meaning is replaced by markup that
//! typesets it literally, everything else is copied through. The table is
//! fixed; see [`escape_latex_char`].

/// Replacement markup for `c`, or `None` if `c` is safe as-is.
pub fn escape_latex_char(c: char) -> Option<&'static str> {
    match c {
        '$' => Some("\\$"),
        '%' => Some("\\%"),
        '&' => Some("\\&"),
        '#' => Some("\\#"),
        '_' => Some("\\_"),
        '{' => Some("\\{"),
        '}' => Some("\\}"),
        '[' => Some("{[}"),
        ']' => Some("{]}"),
        '"' => Some("{''}"),
        '\\' => Some("\\textbackslash{}"),
        '~' => Some("\\textasciitilde{}"),
        '<' => Some("\\textless{}"),
        '>' => Some("\\textgreater{}"),
        '^' => Some("\\textasciicircum{}"),
        // breaks the ?` and !` ligatures
        '`' => Some("{}`"),
        '\n' => Some("\\\\"),
        _ => None,
    }
}

/// Escape `s` for direct use in LaTeX.
///
/// ```
/// use tex2doc::escape_latex;
///
/// assert_eq!(escape_latex("100% & $5_free"), "100\\% \\& \\$5\\_free");
/// ```
pub fn escape_latex(s: &str) -> String {
    let len = s
        .chars()
        .map(|c| escape_latex_char(c).map_or(c.len_utf8(), str::len))
        .sum();

    let mut escaped = String::with_capacity(len);
    for c in s.chars() {
        match escape_latex_char(c) {
            Some(replacement) => escaped.push_str(replacement),
            None => escaped.push(c),
        }
    }
    debug_assert_eq!(escaped.len(), len);
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_mixed_text() {
        assert_eq!(escape_latex("100% & $5_free"), "100\\% \\& \\$5\\_free");
    }

    #[test]
    fn table_is_exact() {
        let table = [
            ('$', "\\$"),
            ('%', "\\%"),
            ('&', "\\&"),
            ('#', "\\#"),
            ('_', "\\_"),
            ('{', "\\{"),
            ('}', "\\}"),
            ('[', "{[}"),
            (']', "{]}"),
            ('"', "{''}"),
            ('\\', "\\textbackslash{}"),
            ('~', "\\textasciitilde{}"),
            ('<', "\\textless{}"),
            ('>', "\\textgreater{}"),
            ('^', "\\textasciicircum{}"),
            ('`', "{}`"),
            ('\n', "\\\\"),
        ];
        for (c, expected) in table {
            assert_eq!(escape_latex_char(c), Some(expected), "char {c:?}");
            assert_eq!(escape_latex(&c.to_string()), expected, "char {c:?}");
        }
    }

    #[test]
    fn plain_text_passes_through() {
        let plain = "Hello, World! 1+1=2 (ok) 'quoted' é ü 漢字 \t\r";
        assert_eq!(escape_latex(plain), plain);
        for c in plain.chars() {
            assert_eq!(escape_latex_char(c), None, "char {c:?}");
        }
    }

    #[test]
    fn empty_string() {
        assert_eq!(escape_latex(""), "");
    }

    #[test]
    fn embedded_nul_is_kept() {
        assert_eq!(escape_latex("a\0b_c"), "a\0b\\_c");
    }

    #[test]
    fn backslash_sequences_are_not_idempotent() {
        let once = escape_latex("\\");
        assert_eq!(once, "\\textbackslash{}");
        assert_ne!(escape_latex(&once), once);
    }

    #[test]
    fn multiline_and_ligature_guard() {
        assert_eq!(escape_latex("?`\n!`"), "?{}`\\\\!{}`");
    }
}
