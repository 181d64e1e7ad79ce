//! Human-friendly byte sizes for command-line flags.

/// Parse a size such as `5MiB`, `512K`, `1g` or `4096`.
///
/// Suffixes are binary multiples and case-insensitive: `B`, `K`/`KiB`,
/// `M`/`MiB`, `G`/`GiB`. A bare number is bytes. Zero is rejected.
pub fn parse_size(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(format!("'{input}' does not start with a number"));
    }
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("'{input}' is not a valid size: {e}"))?;

    let multiplier: u64 = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kib" => 1 << 10,
        "m" | "mib" => 1 << 20,
        "g" | "gib" => 1 << 30,
        other => {
            return Err(format!(
                "unknown size suffix '{other}' (use B, K/KiB, M/MiB or G/GiB)"
            ));
        }
    };

    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{input}' is too large"))?;
    if bytes == 0 {
        return Err("size must be at least 1 byte".to_string());
    }
    Ok(bytes)
}
