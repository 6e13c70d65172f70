use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Why an identifier was rejected. `code()` is stable across releases and
/// independent of the display text.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("value is required")]
    Required,
    #[error("unknown country code")]
    UnknownCountry,
    #[error("wrong length")]
    Length,
    #[error("invalid format")]
    Format,
    #[error("checksum mismatch")]
    Checksum,
    #[error("bank code must be 4 letters")]
    BankCode,
    #[error("country code must be 2 letters")]
    CountryCode,
    #[error("location code must be 2 letters or digits")]
    LocationCode,
    #[error("branch code must be 3 letters or digits")]
    BranchCode,
    #[error("test BIC (location code starts with 0)")]
    TestBic,
}

impl IdentifierError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::UnknownCountry => "unknown_country",
            Self::Length => "length",
            Self::Format => "format",
            Self::Checksum => "checksum",
            Self::BankCode => "bank_code",
            Self::CountryCode => "country_code",
            Self::LocationCode => "location_code",
            Self::BranchCode => "branch_code",
            Self::TestBic => "test_bic",
        }
    }
}

pub type Validation = std::result::Result<(), IdentifierError>;

// (country, IBAN length)
const IBAN_LENGTHS: &[(&str, usize)] = &[
    ("AD", 24), ("AE", 23), ("AL", 28), ("AT", 20), ("AZ", 28), ("BA", 20), ("BE", 16),
    ("BG", 22), ("BH", 22), ("BR", 29), ("BY", 28), ("CH", 21), ("CR", 22), ("CY", 28),
    ("CZ", 24), ("DE", 22), ("DK", 18), ("DO", 28), ("EE", 20), ("EG", 29), ("ES", 24),
    ("FI", 18), ("FO", 18), ("FR", 27), ("GB", 22), ("GE", 22), ("GI", 23), ("GL", 18),
    ("GR", 27), ("GT", 28), ("HR", 21), ("HU", 28), ("IE", 22), ("IL", 23), ("IQ", 23),
    ("IS", 26), ("IT", 27), ("JO", 30), ("KW", 30), ("KZ", 20), ("LB", 28), ("LC", 32),
    ("LI", 21), ("LT", 20), ("LU", 20), ("LV", 21), ("MC", 27), ("MD", 24), ("ME", 22),
    ("MK", 19), ("MR", 27), ("MT", 31), ("MU", 30), ("NL", 18), ("NO", 15), ("PK", 24),
    ("PL", 28), ("PS", 29), ("PT", 25), ("QA", 29), ("RO", 24), ("RS", 22), ("SA", 24),
    ("SC", 31), ("SE", 24), ("SI", 19), ("SK", 24), ("SM", 27), ("ST", 25), ("SV", 28),
    ("TL", 23), ("TN", 24), ("TR", 26), ("UA", 29), ("VA", 22), ("VG", 24), ("XK", 20),
];

// ISIN prefixes: ISO 3166 countries plus the supranational XS.
const ISIN_COUNTRIES: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AR", "AT", "AU", "AW", "AZ", "BA", "BB",
    "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BM", "BN", "BO", "BR", "BS", "BT", "BW", "BY",
    "BZ", "CA", "CD", "CF", "CG", "CH", "CI", "CL", "CM", "CN", "CO", "CR", "CU", "CV", "CW",
    "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE", "EG", "ER", "ES", "ET", "FI",
    "FJ", "FO", "FR", "GA", "GB", "GD", "GE", "GG", "GH", "GI", "GL", "GM", "GN", "GQ", "GR",
    "GT", "GW", "GY", "HK", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IQ", "IR",
    "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KM", "KN", "KR", "KW", "KY", "KZ",
    "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME",
    "MG", "MK", "ML", "MM", "MN", "MO", "MR", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA",
    "NE", "NG", "NI", "NL", "NO", "NP", "NZ", "OM", "PA", "PE", "PG", "PH", "PK", "PL", "PS",
    "PT", "PY", "QA", "RO", "RS", "RU", "RW", "SA", "SB", "SC", "SD", "SE", "SG", "SI", "SK",
    "SL", "SM", "SN", "SO", "SR", "SV", "SY", "SZ", "TD", "TG", "TH", "TJ", "TN", "TO", "TR",
    "TT", "TW", "TZ", "UA", "UG", "US", "UY", "UZ", "VC", "VE", "VG", "VN", "VU", "WS", "XS",
    "YE", "ZA", "ZM", "ZW",
];

fn iban_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]+$").expect("static regex"))
}

fn isin_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}[A-Z0-9]{9}[0-9]$").expect("static regex"))
}

fn swift_format() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$").expect("static regex")
    })
}

/// Strip all whitespace and uppercase.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Append the decimal digits of an alphanumeric character: 0-9 as is,
/// A=10 .. Z=35.
fn push_digits(c: char, out: &mut Vec<u32>) {
    if let Some(d) = c.to_digit(10) {
        out.push(d);
    } else {
        let v = c as u32 - 55;
        out.push(v / 10);
        out.push(v % 10);
    }
}

pub fn validate_iban(raw: &str) -> Validation {
    let iban = normalize(raw);
    if iban.is_empty() {
        return Err(IdentifierError::Required);
    }
    let country = iban.get(..2).unwrap_or("");
    let Some(&(_, expected)) = IBAN_LENGTHS.iter().find(|(c, _)| *c == country) else {
        return Err(IdentifierError::UnknownCountry);
    };
    if iban.len() != expected {
        return Err(IdentifierError::Length);
    }
    if !iban_format().is_match(&iban) {
        return Err(IdentifierError::Format);
    }

    // Move the first four characters to the end and reduce mod 97 digit by
    // digit so the numeral never has to fit in an integer.
    let rearranged = format!("{}{}", &iban[4..], &iban[..4]);
    let mut digits = Vec::with_capacity(rearranged.len() * 2);
    for c in rearranged.chars() {
        push_digits(c, &mut digits);
    }
    let remainder = digits.iter().fold(0u32, |acc, d| (acc * 10 + d) % 97);
    if remainder != 1 {
        return Err(IdentifierError::Checksum);
    }
    Ok(())
}

pub fn validate_isin(raw: &str) -> Validation {
    let isin = normalize(raw);
    if isin.is_empty() {
        return Err(IdentifierError::Required);
    }
    if isin.len() != 12 {
        return Err(IdentifierError::Length);
    }
    if !isin_format().is_match(&isin) {
        return Err(IdentifierError::Format);
    }
    if !ISIN_COUNTRIES.contains(&&isin[..2]) {
        return Err(IdentifierError::UnknownCountry);
    }

    let mut digits = Vec::with_capacity(22);
    for c in isin[..11].chars() {
        push_digits(c, &mut digits);
    }
    // Double every second digit starting with the rightmost one.
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    let check = (10 - sum % 10) % 10;
    let given = isin[11..].chars().next().and_then(|c| c.to_digit(10));
    if given != Some(check) {
        return Err(IdentifierError::Checksum);
    }
    Ok(())
}

pub fn validate_swift(raw: &str) -> Validation {
    let bic = normalize(raw);
    if bic.is_empty() {
        return Err(IdentifierError::Required);
    }
    if bic.len() != 8 && bic.len() != 11 {
        return Err(IdentifierError::Length);
    }
    if !swift_format().is_match(&bic) {
        return Err(IdentifierError::Format);
    }
    if !bic[0..4].chars().all(|c| c.is_ascii_uppercase()) {
        return Err(IdentifierError::BankCode);
    }
    if !bic[4..6].chars().all(|c| c.is_ascii_uppercase()) {
        return Err(IdentifierError::CountryCode);
    }
    let location = &bic[6..8];
    if !location.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IdentifierError::LocationCode);
    }
    if bic.len() == 11 && !bic[8..11].chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(IdentifierError::BranchCode);
    }
    if location.starts_with('0') {
        return Err(IdentifierError::TestBic);
    }
    Ok(())
}
