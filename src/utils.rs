// =============================================================================
// SMALL SHARED HELPERS
// =============================================================================

/// First 8 characters of a signature or mint for log lines.
pub fn short_id(value: &str) -> &str {
    match value.char_indices().nth(8) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Signed SOL difference between two lamport balances.
pub fn lamports_delta_to_sol(pre: u64, post: u64) -> f64 {
    (post as i128 - pre as i128) as f64 / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_long_values() {
        assert_eq!(short_id("5UfDuX9A27qFq8wKwgFJk6rmjKsi34wuaS3Q"), "5UfDuX9A");
        assert_eq!(short_id("short"), "short");
    }

    #[test]
    fn lamports_delta_signs() {
        assert_eq!(lamports_delta_to_sol(2_000_000_000, 1_500_000_000), -0.5);
        assert_eq!(lamports_delta_to_sol(1_000_000_000, 1_000_000_000), 0.0);
        assert_eq!(lamports_delta_to_sol(0, 250_000_000), 0.25);
    }
}
