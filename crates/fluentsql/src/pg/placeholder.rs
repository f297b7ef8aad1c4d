//! Rewrite `:name` placeholders into Postgres `$n` positional parameters.

use std::fmt::Write;

/// SQL with named placeholders replaced by `$1, $2, ...`.
///
/// `names[i]` is the placeholder name bound to `$(i + 1)`. A name that occurs
/// several times maps to a single position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql {
    pub sql: String,
    pub names: Vec<String>,
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_ident_char(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Index just past a `'...'` or `"..."` run starting at `start`. Doubled
/// quotes are escapes, and so is a backslash when `backslash_escapes` is set
/// (`E'...'` strings).
fn skip_quoted(bytes: &[u8], start: usize, backslash_escapes: bool) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if backslash_escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Whether the `'` at `i` opens an `E'...'` escape string.
fn is_escape_string(bytes: &[u8], i: usize) -> bool {
    i > 0
        && matches!(bytes[i - 1], b'E' | b'e')
        && (i < 2 || !is_ident_char(bytes[i - 2]))
}

/// Index just past a `/* ... */` comment starting at `start`. Comments nest.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index just past a `$tag$ ... $tag$` body starting at `start`, or `None`
/// if the `$` does not open a dollar-quoted string.
fn skip_dollar_quoted(sql: &str, start: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut end = start + 1;
    if bytes.get(end).is_some_and(|b| is_ident_start(*b)) {
        while end < bytes.len() && is_ident_char(bytes[end]) {
            end += 1;
        }
    }
    if bytes.get(end) != Some(&b'$') {
        return None;
    }
    let tag = &sql[start..=end];
    let body = end + 1;
    Some(match sql[body..].find(tag) {
        Some(pos) => body + pos + tag.len(),
        None => bytes.len(),
    })
}

/// Replace every `:name` outside string literals, quoted identifiers,
/// comments and `::` casts with its `$n` position.
pub fn rewrite_named(sql: &str) -> NamedSql {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => i = skip_quoted(bytes, i, is_escape_string(bytes, i)),
            b'"' => i = skip_quoted(bytes, i, false),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = match sql[i..].find('\n') {
                    Some(pos) => i + pos + 1,
                    None => bytes.len(),
                };
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            // `$1` style params and identifiers containing `$` are left alone.
            b'$' if i == 0 || !is_ident_char(bytes[i - 1]) => {
                i = skip_dollar_quoted(sql, i).unwrap_or(i + 1);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes.get(i + 1).is_some_and(|b| is_ident_start(*b)) => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && is_ident_char(bytes[end]) {
                    end += 1;
                }
                let name = &sql[start..end];
                let position = match names.iter().position(|n| n == name) {
                    Some(pos) => pos + 1,
                    None => {
                        names.push(name.to_string());
                        names.len()
                    }
                };

                out.push_str(&sql[copied..i]);
                let _ = write!(out, "${position}");
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[copied..]);

    NamedSql { sql: out, names }
}
