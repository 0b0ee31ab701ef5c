//! Host and object-file architecture labels.

use std::sync::LazyLock;

use regex::Regex;

static FILE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"file format\s+([^\n]+)").expect("file format pattern is valid")
});

/// Architecture of the machine running the engine.
pub fn host_arch() -> &'static str {
    arch_label(std::env::consts::ARCH)
}

/// Normalize a Rust target architecture name to the labels used in artifacts.
pub fn arch_label(target_arch: &str) -> &'static str {
    match target_arch {
        "x86_64" | "amd64" => "x86_64",
        "aarch64" | "arm64" => "arm64",
        "x86" | "i386" | "i686" => "x86",
        _ => "unknown",
    }
}

/// Whether the host compiler understands `-masm=intel`.
pub fn host_is_x86() -> bool {
    matches!(host_arch(), "x86_64" | "x86")
}

/// Architecture named by the `file format` line of `objdump -d` output.
///
/// Falls back to the raw format string when it is not recognized and to
/// `unknown` when the line is missing.
pub fn objdump_arch(disassembly: &str) -> String {
    let Some(captures) = FILE_FORMAT.captures(disassembly) else {
        return "unknown".to_string();
    };
    let format = captures[1].trim();
    let lowered = format.to_ascii_lowercase();
    if lowered.contains("arm64") || lowered.contains("aarch64") {
        "arm64".to_string()
    } else if lowered.contains("x86-64") {
        "x86_64".to_string()
    } else if lowered.contains("i386") || lowered.contains("x86") {
        "x86".to_string()
    } else if lowered.contains("mach-o") {
        "mach-o".to_string()
    } else {
        format.to_string()
    }
}
