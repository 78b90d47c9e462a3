use anyhow::{Result, bail};

/// Parse a `--seed` argument: decimal, negative decimal or `0x` hex.
pub fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map_err(|err| anyhow::anyhow!("invalid hex seed {token}: {err}"));
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    bail!("Unrecognized seed token: {token}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_negative_and_hex() {
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert_eq!(parse_seed("-7").unwrap(), 7);
        assert_eq!(parse_seed("0xFF").unwrap(), 255);
        assert_eq!(parse_seed(" 18446744073709551615 ").unwrap(), u64::MAX);
        assert!(parse_seed("ORANGE").is_err());
        assert!(parse_seed("0xZZ").is_err());
    }
}
