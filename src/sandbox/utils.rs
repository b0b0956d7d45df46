//! Diagnostic formatting helpers

/// Bytes shown per hex dump line.
const HEXDUMP_WIDTH: usize = 16;

/// Formats `bytes` as a hex listing, one line per 16 bytes.
///
/// Each line is prefixed with its offset, counted from `base`.
pub fn hexdump(bytes: &[u8], base: usize) -> String {
    bytes
        .chunks(HEXDUMP_WIDTH)
        .enumerate()
        .map(|(line, chunk)| {
            let grouped: Vec<String> = chunk.iter().map(|byte| hex::encode([*byte])).collect();
            format!("{:08x}  {}", base + line * HEXDUMP_WIDTH, grouped.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
