use crate::numbers::NumberLocale;

/// Format an amount with two decimals and thousands separators in the given
/// convention: `1.234,56` (DE) or `1,234.56` (EN).
pub fn amount(val: f64, locale: NumberLocale) -> String {
    let (thousands, decimal) = match locale {
        NumberLocale::De => ('.', ','),
        NumberLocale::En => (',', '.'),
    };
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(thousands);
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped}{decimal}{dec_part}")
    } else {
        format!("{grouped}{decimal}{dec_part}")
    }
}

pub fn format_bytes(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_formatting() {
        assert_eq!(amount(1234.56, NumberLocale::En), "1,234.56");
        assert_eq!(amount(1234.56, NumberLocale::De), "1.234,56");
        assert_eq!(amount(-500.0, NumberLocale::De), "-500,00");
        assert_eq!(amount(0.0, NumberLocale::En), "0.00");
        assert_eq!(amount(1000000.99, NumberLocale::En), "1,000,000.99");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(64 * 1024 * 1024), "64.0 MB");
    }
}
