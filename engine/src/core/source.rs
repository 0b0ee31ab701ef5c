//! Structural scans and rewrites of submitted source text.

use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Error: No public class found in the Java code")]
    NoPublicClass,
}

/// Modifiers that may sit between `public` and `class`.
const CLASS_MODIFIERS: &[&str] = &["final", "abstract", "static", "strictfp", "sealed"];

/// Name of the first top-level `public class` declared in Java source.
///
/// Comments, string literals, text blocks and character literals are
/// skipped, so a `public class` mentioned inside them does not count.
pub fn public_class_name(source: &str) -> Result<&str, SourceError> {
    let tokens = java_tokens(source);
    for (index, token) in tokens.iter().enumerate() {
        if *token != "public" {
            continue;
        }
        let mut rest = tokens[index + 1..].iter();
        let mut next = rest.next();
        while let Some(modifier) = next {
            if !CLASS_MODIFIERS.contains(modifier) && *modifier != "non-sealed" {
                break;
            }
            next = rest.next();
        }
        if next != Some(&"class") {
            continue;
        }
        if let Some(name) = rest.next().filter(|name| is_identifier(name)) {
            return Ok(name);
        }
    }
    Err(SourceError::NoPublicClass)
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(ch) if is_word_char(ch) && !ch.is_ascii_digit())
        && chars.all(is_word_char)
}

/// Split Java source into identifier-like words and single punctuation
/// characters, dropping comments and literals.
fn java_tokens(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let rest = &source[pos..];
        let byte = bytes[pos];
        let Some(first) = rest.chars().next() else {
            break;
        };
        if first.is_whitespace() {
            pos += first.len_utf8();
        } else if rest.starts_with("//") {
            pos += rest.find('\n').unwrap_or(rest.len());
        } else if rest.starts_with("/*") {
            pos += rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
        } else if rest.starts_with("\"\"\"") {
            pos += rest[3..].find("\"\"\"").map_or(rest.len(), |end| end + 6);
        } else if byte == b'"' || byte == b'\'' {
            pos += quoted_len(rest, byte);
        } else if is_word_char(first) {
            // `first` matches, so the word is never empty.
            let len = rest
                .find(|ch: char| !(is_word_char(ch) || ch == '-'))
                .unwrap_or(rest.len());
            tokens.push(&rest[..len]);
            pos += len;
        } else {
            let len = first.len_utf8();
            tokens.push(&rest[..len]);
            pos += len;
        }
    }
    tokens
}

/// Java identifier characters, including currency symbols and other
/// non-ASCII letters.
fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || (!ch.is_ascii() && !ch.is_whitespace())
}

/// Length of a string or char literal starting at `rest[0]`, including quotes.
fn quoted_len(rest: &str, quote: u8) -> usize {
    let bytes = rest.as_bytes();
    let mut pos = 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' => return pos,
            byte if byte == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}

/// Ensure Go source declares a package, inserting `package <name>` when absent.
///
/// The clause goes before the first line that is neither blank nor a
/// comment, so leading comment directives stay on top.
pub fn ensure_package_clause<'a>(source: &'a str, package: &str) -> Cow<'a, str> {
    let mut in_block = false;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        if in_block {
            in_block = !trimmed.contains("*/");
        } else if trimmed.starts_with("/*") {
            in_block = !trimmed[2..].contains("*/");
        } else if !trimmed.is_empty() && !trimmed.starts_with("//") {
            if trimmed == "package" || trimmed.starts_with("package ") {
                return Cow::Borrowed(source);
            }
            break;
        }
        offset += line.len();
    }

    let (head, tail) = source.split_at(offset);
    let mut out = String::with_capacity(source.len() + package.len() + 10);
    out.push_str(head);
    if !head.is_empty() && !head.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("package ");
    out.push_str(package);
    out.push_str("\n\n");
    out.push_str(tail);
    Cow::Owned(out)
}

/// Remove every occurrence of the given directory paths from `text`.
///
/// `dir/` is removed first so file paths collapse to bare file names; any
/// remaining bare `dir` occurrences are replaced by `.`.
pub fn redact_paths<S: AsRef<str>>(text: &str, roots: &[S]) -> String {
    let mut out = text.to_string();
    for root in roots {
        let root = root.as_ref().trim_end_matches('/');
        if root.is_empty() {
            continue;
        }
        out = out.replace(&format!("{root}/"), "");
        out = out.replace(root, ".");
    }
    out
}
