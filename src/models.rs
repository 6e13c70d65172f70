use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const LEGACY_IMPORT_VERSION: i64 = 25;
pub const CURRENT_VERSION: i64 = 27;

/// Placeholder for "no date yet", e.g. fresh ask-date tracking.
pub const DEFAULT_ISO_DATE: &str = "1970-01-01";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "cID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "cSwift", default)]
    pub swift_bic: String,
    #[serde(rename = "cIban", default)]
    pub iban: String,
    #[serde(rename = "cLogoUrl", default)]
    pub logo_url: String,
    #[serde(rename = "cWithDepot", default)]
    pub with_depot: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingType {
    #[serde(rename = "cID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "cName", default)]
    pub name: String,
    #[serde(rename = "cAccountNumberID", default)]
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(rename = "cID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "cISIN", default)]
    pub isin: String,
    #[serde(rename = "cSymbol", default)]
    pub symbol: String,
    #[serde(rename = "cCompany", default)]
    pub company: String,
    #[serde(rename = "cMeetingDay", default)]
    pub meeting_day: String,
    #[serde(rename = "cQuarterDay", default)]
    pub quarter_day: String,
    /// 1 marks a retired holding.
    #[serde(rename = "cFadeOut", default)]
    pub fade_out: i64,
    #[serde(rename = "cFirstPage", default)]
    pub first_page: i64,
    #[serde(rename = "cURL", default)]
    pub url: String,
    #[serde(rename = "cAccountNumberID", default)]
    pub account_id: i64,
    #[serde(rename = "cAskDates", default)]
    pub ask_dates: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "cID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "cBookDate", default)]
    pub book_date: String,
    #[serde(rename = "cExDate", default)]
    pub ex_date: String,
    #[serde(rename = "cDebit", default)]
    pub debit: f64,
    #[serde(rename = "cCredit", default)]
    pub credit: f64,
    #[serde(rename = "cDescription", default)]
    pub description: String,
    #[serde(rename = "cCount", default)]
    pub count: f64,
    #[serde(rename = "cBookingTypeID", default)]
    pub booking_type_id: i64,
    #[serde(rename = "cAccountNumberID", default)]
    pub account_id: i64,
    /// 0 when the booking is not tied to a stock.
    #[serde(rename = "cStockID", default)]
    pub stock_id: i64,
    #[serde(rename = "cSoliCredit", default)]
    pub soli_credit: f64,
    #[serde(rename = "cSoliDebit", default)]
    pub soli_debit: f64,
    #[serde(rename = "cTaxCredit", default)]
    pub tax_credit: f64,
    #[serde(rename = "cTaxDebit", default)]
    pub tax_debit: f64,
    #[serde(rename = "cFeeCredit", default)]
    pub fee_credit: f64,
    #[serde(rename = "cFeeDebit", default)]
    pub fee_debit: f64,
    #[serde(rename = "cSourceTaxCredit", default)]
    pub source_tax_credit: f64,
    #[serde(rename = "cSourceTaxDebit", default)]
    pub source_tax_debit: f64,
    #[serde(rename = "cTransactionTaxCredit", default)]
    pub transaction_tax_credit: f64,
    #[serde(rename = "cTransactionTaxDebit", default)]
    pub transaction_tax_debit: f64,
    #[serde(rename = "cMarketPlace", default)]
    pub market_place: String,
}

/// A pre-split booking ("transfer") as stored by schema version 25.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyBooking {
    #[serde(rename = "cID", default)]
    pub id: i64,
    /// Epoch milliseconds.
    #[serde(rename = "cDate", default)]
    pub date: f64,
    /// Epoch milliseconds.
    #[serde(rename = "cExDay", default)]
    pub ex_day: f64,
    #[serde(rename = "cUnitQuotation", default)]
    pub unit_quotation: f64,
    #[serde(rename = "cAmount", default)]
    pub amount: f64,
    #[serde(rename = "cDescription", default)]
    pub description: String,
    #[serde(rename = "cCount", default)]
    pub count: f64,
    #[serde(rename = "cType", default)]
    pub kind: i64,
    #[serde(rename = "cStockID", default)]
    pub stock_id: i64,
    #[serde(rename = "cSoli", default)]
    pub soli: f64,
    #[serde(rename = "cTax", default)]
    pub tax: f64,
    #[serde(rename = "cFees", default)]
    pub fees: f64,
    #[serde(rename = "cSTax", default)]
    pub source_tax: f64,
    #[serde(rename = "cFTax", default)]
    pub transaction_tax: f64,
    #[serde(rename = "cMarketPlace", default)]
    pub market_place: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyStock {
    #[serde(rename = "cID", default)]
    pub id: Option<i64>,
    #[serde(rename = "cISIN", default)]
    pub isin: String,
    #[serde(rename = "cWKN", default)]
    pub wkn: String,
    #[serde(rename = "cCompany", default)]
    pub company: String,
    #[serde(rename = "cMeetingDay", default)]
    pub meeting_day: f64,
    #[serde(rename = "cQuarterDay", default)]
    pub quarter_day: f64,
    #[serde(rename = "cFadeOut", default)]
    pub fade_out: i64,
    #[serde(rename = "cFirstPage", default)]
    pub first_page: i64,
    #[serde(rename = "cURL", default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMeta {
    #[serde(rename = "cVersion", default)]
    pub version: String,
    #[serde(rename = "cDBVersion", deserialize_with = "integral_version")]
    pub db_version: i64,
    #[serde(rename = "cEngine", default)]
    pub engine: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(rename = "sm")]
    pub meta: BackupMeta,
    pub accounts: Vec<Account>,
    pub bookings: Vec<Booking>,
    #[serde(rename = "bookingTypes")]
    pub booking_types: Vec<BookingType>,
    pub stocks: Vec<Stock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBackup {
    #[serde(rename = "sm")]
    pub meta: BackupMeta,
    pub stocks: Vec<LegacyStock>,
    pub transfers: Vec<LegacyBooking>,
}

impl Backup {
    pub fn record_count(&self) -> usize {
        self.accounts.len() + self.bookings.len() + self.booking_types.len() + self.stocks.len()
    }
}

/// Reads a JSON number as an integer, accepting integral floats such as
/// `27.0`.
pub fn as_integral(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn integral_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    as_integral(&value).ok_or_else(|| D::Error::custom(format!("invalid database version: {value}")))
}

/// Renders an optional id the way error messages show it.
pub fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "undefined".to_string(), |v| v.to_string())
}
