//! Addressed hex + ASCII dumps of binary artifacts.

use std::fmt::Write;

/// Bytes rendered per line.
pub const WIDTH: usize = 16;
const GROUP: usize = 8;

/// Format `data` as a canonical hex dump.
///
/// Each line is `<8-digit hex offset>  <16 hex pairs, split 8+8>  |<ascii>|`.
/// Lines made only of zero bytes are skipped; each run of them is marked by a
/// single `*` line. Bytes outside printable ASCII render as `.`.
pub fn format_hexdump(data: &[u8]) -> String {
    let mut out = String::new();
    let mut in_zero_run = false;

    for (index, chunk) in data.chunks(WIDTH).enumerate() {
        if chunk.iter().all(|&byte| byte == 0) {
            if !in_zero_run {
                out.push_str("*\n");
                in_zero_run = true;
            }
            continue;
        }
        in_zero_run = false;
        push_line(&mut out, index * WIDTH, chunk);
    }
    out
}

/// Format at most `limit` bytes of `data`, noting how much was left out.
pub fn format_hexdump_limited(data: &[u8], limit: usize) -> String {
    if data.len() <= limit {
        return format_hexdump(data);
    }
    let mut out = format_hexdump(&data[..limit]);
    let _ = writeln!(
        out,
        "[{} more bytes not shown, {} total]",
        data.len() - limit,
        data.len()
    );
    out
}

fn push_line(out: &mut String, offset: usize, chunk: &[u8]) {
    let _ = write!(out, "{offset:08x}  ");
    for slot in 0..WIDTH {
        match chunk.get(slot) {
            Some(byte) => {
                let _ = write!(out, "{byte:02x} ");
            }
            None => out.push_str("   "),
        }
        if slot + 1 == GROUP {
            out.push(' ');
        }
    }
    out.push_str(" |");
    out.extend(chunk.iter().map(|&byte| printable(byte)));
    out.push_str("|\n");
}

fn printable(byte: u8) -> char {
    if (0x20..=0x7e).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}
