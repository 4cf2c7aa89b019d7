//! Display formatting. Stored values are never rounded; these helpers only
//! produce strings.

/// `1234.5` -> `$1,234.50`, `-3.2` -> `-$3.20`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = value < 0.0 && fixed != "0.00";
    format!(
        "{}${}.{}",
        if negative { "-" } else { "" },
        group_thousands(whole),
        cents
    )
}

/// Formats a ratio as a percentage, `0.2553` -> `25.53%`.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Wastage is edited and shown as a whole percent, `0.1` -> `10%`.
pub fn format_wastage(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_and_rounds() {
        assert_eq!(format_currency(315671.66), "$315,671.66");
        assert_eq!(format_currency(311.0), "$311.00");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-3.2), "-$3.20");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn percentages() {
        assert_eq!(format_percentage(0.25), "25.00%");
        assert_eq!(format_wastage(0.1), "10%");
        assert_eq!(format_wastage(0.05), "5%");
    }
}
