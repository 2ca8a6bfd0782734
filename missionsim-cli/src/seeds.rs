use anyhow::{Result, bail};

/// Parse a `--seed` argument.
///
/// Accepts decimal integers (negative values map to their magnitude) and
/// `0x`-prefixed hexadecimal.
pub fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    if token.is_empty() {
        bail!("seed must not be empty");
    }

    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return match u64::from_str_radix(hex, 16) {
            Ok(value) => Ok(value),
            Err(err) => bail!("invalid hexadecimal seed {token:?}: {err}"),
        };
    }

    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }

    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }

    bail!("unrecognized seed {token:?}: expected an integer or 0x-prefixed hex")
}
