//! Leading-line source directives.
//!
//! A snippet may start with one comment line that configures its pipeline:
//!
//! ```text
//! // -O3 -fno-inline            compiler flags (C, C++)
//! // arch: x86_64 syntax: intel  target declaration (assembly, mandatory)
//! ```
//!
//! Grammar: optional leading `//` line, whitespace-separated tokens, where
//! `key:value` (or `key: value`) tokens are settings and tokens starting
//! with `-` are flags. Everything else on the line is ignored prose.

use std::fmt;

use thiserror::Error;

/// Architectures accepted by the assembly pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    X86,
    Arm64,
}

impl Arch {
    pub const ALL: [Arch; 3] = [Arch::X86_64, Arch::X86, Arch::Arm64];

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|arch| arch.as_str() == value)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction syntax accepted by the assembly pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Syntax {
    #[default]
    Intel,
    Att,
}

impl Syntax {
    pub const ALL: [Syntax; 2] = [Syntax::Intel, Syntax::Att];

    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Intel => "intel",
            Syntax::Att => "att",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|syntax| syntax.as_str() == value)
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `// arch: … syntax: …` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsmDirective {
    pub arch: Arch,
    pub syntax: Syntax,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error(
        "First line must be a comment specifying architecture and syntax.\nExample: // arch: x86_64 syntax: intel"
    )]
    Missing,
    #[error("Architecture not specified. Use '// arch: x86_64|x86|arm64'")]
    MissingArch,
    #[error("Invalid architecture. Must be one of: x86_64, x86, arm64")]
    InvalidArch(String),
    #[error("Invalid syntax. Must be one of: intel, att")]
    InvalidSyntax(String),
}

/// Split `source` into the body of its leading `//` comment and the rest.
///
/// Leading blank space before the comment marker on the first line is
/// tolerated; a first line that is not a `//` comment yields `None`.
pub fn split_leading_comment(source: &str) -> Option<(&str, &str)> {
    let (first, rest) = source.split_once('\n').unwrap_or((source, ""));
    let body = first.trim_start().strip_prefix("//")?;
    Some((body.trim_end_matches('\r'), rest))
}

/// `key:value` settings on a directive line, keys and values lowercased.
pub fn settings(body: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut tokens = body.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let value = if value.is_empty() {
            match tokens.peek() {
                Some(next) if !next.contains(':') => tokens.next().unwrap_or_default(),
                _ => "",
            }
        } else {
            value
        };
        out.push((key.to_ascii_lowercase(), word(value).to_ascii_lowercase()));
    }
    out
}

/// Leading word characters of `value` (letters, digits, underscore).
fn word(value: &str) -> &str {
    let end = value
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
        .unwrap_or(value.len());
    &value[..end]
}

/// Compiler flags declared on the first line, e.g. `// -O3 -march=native`.
///
/// Only tokens starting with `-` count, so an ordinary leading comment is
/// never passed to the compiler.
pub fn compiler_flags(source: &str) -> Vec<String> {
    split_leading_comment(source)
        .map(|(body, _)| {
            body.split_whitespace()
                .filter(|token| token.starts_with('-') && token.len() > 1)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the mandatory assembly directive.
///
/// Returns the directive and the source with the directive line removed.
/// `syntax` defaults to `intel` when omitted.
pub fn parse_asm_directive(source: &str) -> Result<(AsmDirective, &str), DirectiveError> {
    let (body, rest) = split_leading_comment(source).ok_or(DirectiveError::Missing)?;
    let settings = settings(body);
    let lookup = |key: &str| {
        settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let arch = match lookup("arch") {
        None | Some("") => return Err(DirectiveError::MissingArch),
        Some(value) => Arch::parse(value).ok_or_else(|| DirectiveError::InvalidArch(value.into()))?,
    };
    let syntax = match lookup("syntax") {
        None => Syntax::default(),
        Some(value) => {
            Syntax::parse(value).ok_or_else(|| DirectiveError::InvalidSyntax(value.into()))?
        }
    };
    Ok((AsmDirective { arch, syntax }, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arch_and_syntax() {
        let (directive, rest) =
            parse_asm_directive("// arch: x86_64 syntax: att\nmov $60, %rax\n").expect("parse");
        assert_eq!(directive.arch, Arch::X86_64);
        assert_eq!(directive.syntax, Syntax::Att);
        assert_eq!(rest, "mov $60, %rax\n");
    }

    #[test]
    fn accepts_compact_and_mixed_case_values() {
        let (directive, _) = parse_asm_directive("//arch:ARM64 Syntax:Intel").expect("parse");
        assert_eq!(directive.arch, Arch::Arm64);
        assert_eq!(directive.syntax, Syntax::Intel);
    }

    #[test]
    fn syntax_defaults_to_intel() {
        let (directive, _) = parse_asm_directive("// arch: x86\nnop").expect("parse");
        assert_eq!(directive.arch, Arch::X86);
        assert_eq!(directive.syntax, Syntax::Intel);
    }

    #[test]
    fn missing_comment_is_rejected() {
        let err = parse_asm_directive("\n    section .text\n").unwrap_err();
        assert_eq!(err, DirectiveError::Missing);
        assert!(err.to_string().starts_with("First line must be a comment"));
    }

    #[test]
    fn missing_arch_is_rejected() {
        let err = parse_asm_directive("// syntax: intel\nnop").unwrap_err();
        assert_eq!(err, DirectiveError::MissingArch);
        assert!(err.to_string().contains("Architecture not specified"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_asm_directive("// arch: invalid syntax: intel").unwrap_err();
        assert_eq!(err, DirectiveError::InvalidArch("invalid".to_string()));
        assert!(err.to_string().contains("Invalid architecture"));

        let err = parse_asm_directive("// arch: x86_64 syntax: invalid").unwrap_err();
        assert_eq!(err, DirectiveError::InvalidSyntax("invalid".to_string()));
        assert!(err.to_string().contains("Invalid syntax"));
    }

    #[test]
    fn compiler_flags_ignore_prose() {
        assert_eq!(compiler_flags("// -O3 -Wall\nint main(){}"), vec!["-O3", "-Wall"]);
        assert!(compiler_flags("// compute a factorial\nint main(){}").is_empty());
        assert!(compiler_flags("#include <stdio.h>\n// -O2").is_empty());
        assert!(compiler_flags("").is_empty());
    }

    #[test]
    fn settings_skip_empty_keys_and_trailing_punctuation() {
        let parsed = settings(" arch: x86_64, :x syntax:intel.");
        assert_eq!(
            parsed,
            vec![
                ("arch".to_string(), "x86_64".to_string()),
                ("syntax".to_string(), "intel".to_string()),
            ]
        );
    }
}
