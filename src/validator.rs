use std::collections::HashSet;

use serde_json::Value;

use crate::models::{as_integral, display_id, Backup, LegacyBackup, LEGACY_IMPORT_VERSION};

const LEGACY_FIELDS: &[&str] = &["stocks", "transfers"];
const CURRENT_FIELDS: &[&str] = &["accounts", "stocks", "bookingTypes", "bookings"];

/// Outcome of the structural check. `version` is -1 when it could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupCheck {
    pub is_valid: bool,
    pub version: i64,
    pub error: Option<String>,
}

impl BackupCheck {
    fn ok(version: i64) -> Self {
        Self { is_valid: true, version, error: None }
    }

    fn fail(version: i64, error: String) -> Self {
        Self { is_valid: false, version, error: Some(error) }
    }

    pub fn is_legacy(&self) -> bool {
        self.is_valid && self.version == LEGACY_IMPORT_VERSION
    }
}

// ---------------------------------------------------------------------------
// Pass 1: structure and version
// ---------------------------------------------------------------------------

/// Cheap structural check of a raw backup. Stops at the first problem.
pub fn validate_backup(data: &Value) -> BackupCheck {
    let Some(obj) = data.as_object() else {
        return BackupCheck::fail(-1, "Backup is not a JSON object".to_string());
    };
    let Some(version) = obj
        .get("sm")
        .and_then(|meta| meta.get("cDBVersion"))
        .and_then(as_integral)
    else {
        return BackupCheck::fail(-1, "Backup has no database version (sm.cDBVersion)".to_string());
    };

    if version < LEGACY_IMPORT_VERSION {
        return BackupCheck::fail(
            version,
            format!(
                "Backup database version {version} is older than the oldest supported version {LEGACY_IMPORT_VERSION}"
            ),
        );
    }

    let required = if version == LEGACY_IMPORT_VERSION {
        LEGACY_FIELDS
    } else {
        CURRENT_FIELDS
    };
    for field in required {
        if !obj.get(*field).is_some_and(Value::is_array) {
            return BackupCheck::fail(version, format!("Backup is missing the {field} list"));
        }
    }
    BackupCheck::ok(version)
}

// ---------------------------------------------------------------------------
// Pass 2: referential integrity and business rules
// ---------------------------------------------------------------------------

/// Deep check of a current-schema backup. Returns every problem found; an
/// empty list means the data can be trusted.
pub fn validate_data_integrity(backup: &Backup) -> Vec<String> {
    let mut errors = Vec::new();
    errors.extend(check_undefined_ids(backup));
    errors.extend(check_foreign_keys(backup));
    errors.extend(check_duplicate_ids(backup));
    errors.extend(check_business_rules(backup));
    errors
}

// Booking types are not covered here, only accounts, stocks and bookings.
fn check_undefined_ids(backup: &Backup) -> Vec<String> {
    let counts = [
        ("accounts", backup.accounts.iter().filter(|a| a.id.is_none()).count()),
        ("stocks", backup.stocks.iter().filter(|s| s.id.is_none()).count()),
        ("bookings", backup.bookings.iter().filter(|b| b.id.is_none()).count()),
    ];
    counts
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(entity, n)| format!("{n} {entity} have undefined IDs"))
        .collect()
}

fn check_foreign_keys(backup: &Backup) -> Vec<String> {
    let account_ids: HashSet<i64> = backup.accounts.iter().filter_map(|a| a.id).collect();
    let stock_ids: HashSet<i64> = backup.stocks.iter().filter_map(|s| s.id).collect();
    let type_ids: HashSet<i64> = backup.booking_types.iter().filter_map(|t| t.id).collect();
    let mut errors = Vec::new();

    for b in &backup.bookings {
        let id = display_id(b.id);
        if !account_ids.contains(&b.account_id) {
            errors.push(format!("Booking {id} references missing account {}", b.account_id));
        }
        if b.stock_id != 0 && !stock_ids.contains(&b.stock_id) {
            errors.push(format!("Booking {id} references missing stock {}", b.stock_id));
        }
        if !type_ids.contains(&b.booking_type_id) {
            errors.push(format!(
                "Booking {id} references missing booking type {}",
                b.booking_type_id
            ));
        }
    }
    for s in &backup.stocks {
        if !account_ids.contains(&s.account_id) {
            errors.push(format!(
                "Stock {} references missing account {}",
                display_id(s.id),
                s.account_id
            ));
        }
    }
    for t in &backup.booking_types {
        if !account_ids.contains(&t.account_id) {
            errors.push(format!(
                "Booking type {} references missing account {}",
                display_id(t.id),
                t.account_id
            ));
        }
    }
    errors
}

/// Ids seen more than once, each listed once in order of first repetition.
fn duplicates(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut dups = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            dups.push(id);
        }
    }
    dups
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

fn check_duplicate_ids(backup: &Backup) -> Vec<String> {
    let groups = [
        ("account", duplicates(backup.accounts.iter().filter_map(|a| a.id))),
        ("stock", duplicates(backup.stocks.iter().filter_map(|s| s.id))),
        ("booking", duplicates(backup.bookings.iter().filter_map(|b| b.id))),
    ];
    groups
        .into_iter()
        .filter(|(_, dups)| !dups.is_empty())
        .map(|(entity, dups)| format!("Duplicate {entity} IDs: {}", join_ids(&dups)))
        .collect()
}

fn check_business_rules(backup: &Backup) -> Vec<String> {
    let mut errors = Vec::new();
    for b in &backup.bookings {
        let id = display_id(b.id);
        if b.credit < 0.0 && b.debit < 0.0 {
            errors.push(format!("Booking {id} has negative credit and negative debit"));
        }
        if b.credit > 0.0 && b.debit > 0.0 {
            errors.push(format!("Booking {id} has both credit and debit set"));
        }
    }
    errors
}

// ---------------------------------------------------------------------------
// Legacy data
// ---------------------------------------------------------------------------

/// Gate for the legacy transformer: stock ids present and unique, every
/// transfer pointing at an existing stock.
pub fn validate_legacy_data_integrity(backup: &LegacyBackup) -> Vec<String> {
    let mut errors = Vec::new();
    let undefined = backup.stocks.iter().filter(|s| s.id.is_none()).count();
    if undefined > 0 {
        errors.push(format!("{undefined} stocks have undefined IDs"));
    }
    let dups = duplicates(backup.stocks.iter().filter_map(|s| s.id));
    if !dups.is_empty() {
        errors.push(format!("Duplicate stock IDs: {}", join_ids(&dups)));
    }
    let stock_ids: HashSet<i64> = backup.stocks.iter().filter_map(|s| s.id).collect();
    for t in &backup.transfers {
        if t.stock_id != 0 && !stock_ids.contains(&t.stock_id) {
            errors.push(format!("Transfer {} references missing stock {}", t.id, t.stock_id));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Account, BackupMeta, Booking, BookingType, LegacyBooking, LegacyStock, Stock};

    fn account(id: Option<i64>) -> Account {
        Account {
            id,
            swift_bic: "DEUTDEFF".to_string(),
            iban: format!("DE13120300001064506999{}", id.unwrap_or(0)),
            logo_url: String::new(),
            with_depot: 1,
        }
    }

    fn stock(id: Option<i64>, account_id: i64) -> Stock {
        Stock {
            id,
            isin: "US0378331005".to_string(),
            symbol: "AAPL".to_string(),
            company: "Apple".to_string(),
            meeting_day: "1970-01-01".to_string(),
            quarter_day: "1970-01-01".to_string(),
            fade_out: 0,
            first_page: 0,
            url: String::new(),
            account_id,
            ask_dates: "1970-01-01".to_string(),
        }
    }

    fn booking(id: Option<i64>, account_id: i64) -> Booking {
        Booking {
            id,
            book_date: "2024-01-02".to_string(),
            credit: 10.0,
            booking_type_id: 1,
            account_id,
            ..Default::default()
        }
    }

    fn valid_backup() -> Backup {
        Backup {
            meta: BackupMeta { version: "1.0.0".to_string(), db_version: 27, engine: "sqlite".to_string() },
            accounts: vec![account(Some(1))],
            bookings: vec![booking(Some(1), 1), Booking { stock_id: 1, ..booking(Some(2), 1) }],
            booking_types: vec![BookingType { id: Some(1), name: "Buy".to_string(), account_id: 1 }],
            stocks: vec![stock(Some(1), 1)],
        }
    }

    #[test]
    fn test_pass1_rejects_non_object() {
        let check = validate_backup(&json!([1, 2, 3]));
        assert!(!check.is_valid);
        assert_eq!(check.version, -1);
        assert_eq!(validate_backup(&json!("text")).version, -1);
    }

    #[test]
    fn test_pass1_rejects_missing_version() {
        let check = validate_backup(&json!({"sm": {"cVersion": "1"}, "accounts": []}));
        assert!(!check.is_valid);
        assert_eq!(check.version, -1);
    }

    #[test]
    fn test_pass1_accepts_integral_float_version() {
        let check = validate_backup(&json!({
            "sm": {"cDBVersion": 27.0},
            "accounts": [], "stocks": [], "bookingTypes": [], "bookings": []
        }));
        assert!(check.is_valid);
        assert_eq!(check.version, 27);
        assert!(validate_backup(&json!({"sm": {"cDBVersion": 25.0}, "stocks": [], "transfers": []})).is_legacy());

        let fractional = validate_backup(&json!({"sm": {"cDBVersion": 26.5}}));
        assert!(!fractional.is_valid);
        assert_eq!(fractional.version, -1);
    }

    #[test]
    fn test_pass1_version_floor_precedes_field_checks() {
        let check = validate_backup(&json!({
            "sm": {"cDBVersion": 20},
            "accounts": [], "stocks": [], "bookingTypes": [], "bookings": []
        }));
        assert!(!check.is_valid);
        let msg = check.error.unwrap();
        assert!(msg.contains("20") && msg.contains("25"), "{msg}");
    }

    #[test]
    fn test_pass1_legacy_requires_stocks_and_transfers_only() {
        let ok = validate_backup(&json!({"sm": {"cDBVersion": 25}, "stocks": [], "transfers": []}));
        assert!(ok.is_valid);
        assert!(ok.is_legacy());
        let missing = validate_backup(&json!({"sm": {"cDBVersion": 25}, "stocks": []}));
        assert!(!missing.is_valid);
        assert!(missing.error.unwrap().contains("transfers"));
    }

    #[test]
    fn test_pass1_current_reports_first_missing_field() {
        let check = validate_backup(&json!({
            "sm": {"cDBVersion": 27}, "accounts": [], "stocks": {}, "bookings": []
        }));
        assert!(!check.is_valid);
        assert_eq!(check.version, 27);
        assert!(check.error.unwrap().contains("stocks"));

        let ok = validate_backup(&json!({
            "sm": {"cDBVersion": 26}, "accounts": [], "stocks": [], "bookingTypes": [], "bookings": []
        }));
        assert_eq!(ok, BackupCheck { is_valid: true, version: 26, error: None });
        assert!(!ok.is_legacy());
    }

    #[test]
    fn test_pass2_valid_backup_is_clean_and_idempotent() {
        let backup = valid_backup();
        assert!(validate_data_integrity(&backup).is_empty());
        assert!(validate_data_integrity(&backup).is_empty());
    }

    #[test]
    fn test_pass2_missing_account_scenario() {
        let mut backup = valid_backup();
        backup.bookings.push(booking(Some(42), 99));
        let errors = validate_data_integrity(&backup);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("99") && errors[0].contains("42"), "{}", errors[0]);
    }

    #[test]
    fn test_pass2_duplicate_account_scenario() {
        let mut backup = valid_backup();
        backup.accounts.push(account(Some(1)));
        let errors = validate_data_integrity(&backup);
        assert_eq!(errors, vec!["Duplicate account IDs: 1".to_string()]);
    }

    #[test]
    fn test_pass2_aggregates_in_order() {
        let mut backup = valid_backup();
        backup.accounts.push(account(None));
        backup.accounts.push(account(None));
        backup.stocks.push(stock(Some(1), 7));
        backup.bookings.push(Booking { debit: 5.0, ..booking(Some(2), 1) });
        backup.booking_types.push(BookingType { id: Some(2), name: "Sell".to_string(), account_id: 8 });
        let errors = validate_data_integrity(&backup);
        assert_eq!(
            errors,
            vec![
                "2 accounts have undefined IDs".to_string(),
                "Stock 1 references missing account 7".to_string(),
                "Booking type 2 references missing account 8".to_string(),
                "Duplicate stock IDs: 1".to_string(),
                "Duplicate booking IDs: 2".to_string(),
                "Booking 2 has both credit and debit set".to_string(),
            ]
        );
        assert_eq!(errors, validate_data_integrity(&backup));
    }

    #[test]
    fn test_pass2_booking_types_skip_id_checks() {
        let mut backup = valid_backup();
        backup.booking_types.push(BookingType { id: Some(1), name: "Buy again".to_string(), account_id: 1 });
        assert!(validate_data_integrity(&backup).is_empty());
    }

    #[test]
    fn test_pass2_foreign_keys_for_stock_and_type() {
        let mut backup = valid_backup();
        backup.bookings.push(Booking { stock_id: 5, booking_type_id: 9, ..booking(None, 1) });
        let errors = validate_data_integrity(&backup);
        assert_eq!(
            errors,
            vec![
                "1 bookings have undefined IDs".to_string(),
                "Booking undefined references missing stock 5".to_string(),
                "Booking undefined references missing booking type 9".to_string(),
            ]
        );
    }

    #[test]
    fn test_pass2_business_rules() {
        let mut backup = valid_backup();
        backup.bookings = vec![
            Booking { credit: -1.0, debit: -2.0, ..booking(Some(1), 1) },
            Booking { credit: 3.0, debit: 4.0, ..booking(Some(2), 1) },
            Booking { credit: 0.0, debit: 4.0, ..booking(Some(3), 1) },
            Booking { credit: -1.0, debit: 0.0, ..booking(Some(4), 1) },
        ];
        let errors = validate_data_integrity(&backup);
        assert_eq!(
            errors,
            vec![
                "Booking 1 has negative credit and negative debit".to_string(),
                "Booking 2 has both credit and debit set".to_string(),
            ]
        );
    }

    #[test]
    fn test_legacy_integrity() {
        let backup = LegacyBackup {
            meta: BackupMeta { version: String::new(), db_version: 25, engine: String::new() },
            stocks: vec![
                LegacyStock { id: Some(1), ..Default::default() },
                LegacyStock { id: Some(1), ..Default::default() },
                LegacyStock { id: Some(2), ..Default::default() },
            ],
            transfers: vec![
                LegacyBooking { id: 1, stock_id: 2, ..Default::default() },
                LegacyBooking { id: 2, stock_id: 0, ..Default::default() },
                LegacyBooking { id: 3, stock_id: 6, ..Default::default() },
            ],
        };
        assert_eq!(
            validate_legacy_data_integrity(&backup),
            vec![
                "Duplicate stock IDs: 1".to_string(),
                "Transfer 3 references missing stock 6".to_string(),
            ]
        );
    }

    #[test]
    fn test_pass2_reports_booking_type_without_id_as_missing_reference() {
        let mut backup = valid_backup();
        backup.booking_types[0].id = None;
        backup.booking_types.push(BookingType { id: None, name: "Sell".to_string(), account_id: 4 });
        assert_eq!(
            validate_data_integrity(&backup),
            vec![
                "Booking 1 references missing booking type 1".to_string(),
                "Booking 2 references missing booking type 1".to_string(),
                "Booking type undefined references missing account 4".to_string(),
            ]
        );
    }

    #[test]
    fn test_legacy_integrity_counts_stocks_without_id() {
        let backup = LegacyBackup {
            meta: BackupMeta { version: String::new(), db_version: 25, engine: String::new() },
            stocks: vec![LegacyStock::default(), LegacyStock { id: Some(2), ..Default::default() }],
            transfers: vec![LegacyBooking { id: 1, stock_id: 2, ..Default::default() }],
        };
        assert_eq!(
            validate_legacy_data_integrity(&backup),
            vec!["1 stocks have undefined IDs".to_string()]
        );
    }

    #[test]
    fn test_duplicates_listed_once() {
        assert_eq!(duplicates([3, 1, 3, 3, 1, 2].into_iter()), vec![3, 1]);
        assert_eq!(join_ids(&[3, 1]), "3, 1");
    }
}
