use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{DepotError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberLocale {
    /// `1.234,56`
    De,
    /// `1,234.56`
    En,
}

impl NumberLocale {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "de" | "de-de" => Some(Self::De),
            "en" | "en-us" | "en-gb" => Some(Self::En),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberOptions {
    pub locale: Option<NumberLocale>,
    pub fallback: Option<f64>,
    pub throw_on_error: bool,
}

/// Guess the decimal convention of a number string. With both separators
/// present the rightmost one is the decimal mark; a lone comma means DE,
/// anything else EN.
pub fn detect_number_format(raw: &str) -> NumberLocale {
    match (raw.rfind(','), raw.rfind('.')) {
        (Some(comma), Some(dot)) => {
            if dot > comma {
                NumberLocale::En
            } else {
                NumberLocale::De
            }
        }
        (Some(_), None) => NumberLocale::De,
        _ => NumberLocale::En,
    }
}

/// Parse a user or file supplied number. On failure the fallback wins, then
/// `throw_on_error`, otherwise the result is `NaN`.
pub fn to_number(raw: &str, opts: &NumberOptions) -> Result<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .collect();
    let locale = opts.locale.unwrap_or_else(|| detect_number_format(&cleaned));
    let canonical = match locale {
        NumberLocale::De => cleaned.replace('.', "").replace(',', "."),
        NumberLocale::En => cleaned.replace(',', ""),
    };

    match canonical.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => {
            if let Some(fallback) = opts.fallback {
                Ok(fallback)
            } else if opts.throw_on_error {
                Err(DepotError::InvalidNumber(raw.to_string()))
            } else {
                Ok(f64::NAN)
            }
        }
    }
}

/// Epoch milliseconds to `YYYY-MM-DD` (UTC).
pub fn iso_date(epoch_ms: f64) -> Result<String> {
    if !epoch_ms.is_finite() {
        return Err(DepotError::InvalidTimestamp(epoch_ms));
    }
    DateTime::from_timestamp_millis(epoch_ms.trunc() as i64)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .ok_or(DepotError::InvalidTimestamp(epoch_ms))
}

/// `YYYY-MM-DD` to a UTC timestamp at midnight.
pub fn utc_date(iso: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| DepotError::InvalidDate(iso.to_string()))
}

pub fn normalize_booking_type_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
