//! Number formatting for report tables (`1,234,567.89` style).

/// Format `value` with `decimals` places and a comma every three integer digits.
pub fn with_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return String::from("-");
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    // Avoid "-0.00"
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Optional values render as an empty cell.
pub fn optional(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| with_thousands(v, decimals)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(with_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(with_thousands(999.0, 0), "999");
        assert_eq!(with_thousands(1000.0, 0), "1,000");
        assert_eq!(with_thousands(-2500.5, 1), "-2,500.5");
    }

    #[test]
    fn zero_and_non_finite() {
        assert_eq!(with_thousands(-0.001, 2), "0.00");
        assert_eq!(with_thousands(f64::NAN, 2), "-");
        assert_eq!(optional(None, 2), "");
    }
}
