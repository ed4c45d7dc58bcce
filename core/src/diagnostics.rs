// Diagnostic views: checksum and hex dump
//
// Both are read-only and purely informational. The checksum is a simple
// additive sum for before/after comparison in logs; it is not an integrity
// guarantee.

/// Additive checksum over the first min(1024, len) bytes, with explicit
/// wrapping 32-bit addition (no carry beyond 32 bits).
pub fn checksum(data: &[u8]) -> u32 {
    data.iter()
        .take(1024)
        .fold(0u32, |sum, &byte| sum.wrapping_add(byte as u32))
}

/// Format a window of the buffer as a classic hex dump: 16 bytes per line,
/// 8-digit uppercase address, hex column padded to 48 characters, then a
/// printable-ASCII column with '.' for non-printables. The window is
/// clamped to the buffer, never read past its end.
pub fn hex_dump(data: &[u8], offset: usize, length: usize) -> String {
    let start = offset.min(data.len());
    let end = offset.saturating_add(length).min(data.len());
    let window = &data[start..end];

    let mut dump = String::new();
    for (i, line) in window.chunks(16).enumerate() {
        let addr = offset + i * 16;
        let hex: Vec<String> = line.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = line
            .iter()
            .map(|&b| {
                if (32..=126).contains(&b) {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        dump.push_str(&format!("{:08X}: {:<48} {}\n", addr, hex.join(" "), ascii));
    }
    dump
}
