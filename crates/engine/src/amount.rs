//! Amount input helpers.
//!
//! Amounts are whole currency units (yen) stored as `i64`. Forms accept
//! free-typed text such as `"100,000"` or `"¥1,200円"`; only the digits count.
//!
//! ```rust
//! use engine::{format_amount, parse_amount_input};
//!
//! assert_eq!(parse_amount_input("¥100,000"), 100_000);
//! assert_eq!(parse_amount_input(""), 0);
//! assert_eq!(format_amount(1_234_567), "1,234,567");
//! ```

/// Extract the digits of a typed amount and read them as a number.
///
/// Non-digit characters are ignored and an input without digits is `0`.
/// Absurdly long inputs saturate at `i64::MAX`, which amount validation then
/// rejects.
#[must_use]
pub fn parse_amount_input(input: &str) -> i64 {
    input
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit))
        })
}

/// Render an amount with `,` thousands separators.
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_digits_only() {
        assert_eq!(parse_amount_input("40,000"), 40_000);
        assert_eq!(parse_amount_input("1 2 3"), 123);
        assert_eq!(parse_amount_input("３００"), 0);
        assert_eq!(parse_amount_input("abc"), 0);
    }

    #[test]
    fn parse_saturates() {
        assert_eq!(parse_amount_input(&"9".repeat(40)), i64::MAX);
    }

    #[test]
    fn format_groups_thousands() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1_000), "1,000");
        assert_eq!(format_amount(100_000), "100,000");
        assert_eq!(format_amount(-2_500), "-2,500");
    }
}
