//! Money presentation helpers.

/// Formats whole rupiah with the Indonesian thousands separator:
/// `15000` becomes `Rp15.000`.
pub fn format_idr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("Rp-{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_idr_groups_thousands_with_dots() {
        assert_eq!(format_idr(0), "Rp0");
        assert_eq!(format_idr(500), "Rp500");
        assert_eq!(format_idr(15_000), "Rp15.000");
        assert_eq!(format_idr(45_000), "Rp45.000");
        assert_eq!(format_idr(1_234_567), "Rp1.234.567");
    }

    #[test]
    fn test_format_idr_keeps_the_sign_inside() {
        assert_eq!(format_idr(-15_000), "Rp-15.000");
    }
}
