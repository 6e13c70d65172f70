use tracing::debug;

use crate::error::{DepotError, Result};
use crate::identifiers::normalize;
use crate::models::{
    Account, Backup, BackupMeta, Booking, BookingType, LegacyBackup, LegacyBooking, LegacyStock,
    Stock, CURRENT_VERSION, DEFAULT_ISO_DATE,
};
use crate::numbers::iso_date;

/// Booking type id given to legacy CREDIT/DEBIT entries whose amounts are all zero.
pub const UNDEFINED_BOOKING_TYPE: i64 = -1;

/// `cType` values of schema version 25 transfers.
#[derive(Debug, Clone, Copy)]
pub struct LegacyTypeCodes {
    pub buy: i64,
    pub sell: i64,
    pub dividend: i64,
    pub credit: i64,
    pub debit: i64,
}

/// Ids of the booking types seeded for an account migrated from a legacy backup.
#[derive(Debug, Clone, Copy)]
pub struct BookingTypeIds {
    pub buy: i64,
    pub sell: i64,
    pub dividend: i64,
    pub other: i64,
    pub fee: i64,
    pub tax: i64,
}

impl BookingTypeIds {
    pub fn defaults(&self) -> [(i64, &'static str); 6] {
        [
            (self.buy, "Buy"),
            (self.sell, "Sell"),
            (self.dividend, "Dividend"),
            (self.other, "Other"),
            (self.fee, "Fee"),
            (self.tax, "Tax"),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct LegacyConfig {
    pub legacy_types: LegacyTypeCodes,
    pub booking_types: BookingTypeIds,
    /// Stocks start with fresh ask-date tracking at this date.
    pub default_iso_date: String,
    pub iso_date: fn(f64) -> Result<String>,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            legacy_types: LegacyTypeCodes { buy: 1, sell: 2, dividend: 3, credit: 4, debit: 5 },
            booking_types: BookingTypeIds { buy: 1, sell: 2, dividend: 3, other: 4, fee: 5, tax: 6 },
            default_iso_date: DEFAULT_ISO_DATE.to_string(),
            iso_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyKind {
    Buy,
    Sell,
    Dividend,
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CreditDebit {
    value: f64,
    booking_type_id: i64,
}

/// Signed legacy value to a (credit, debit) pair.
fn split(v: f64) -> (f64, f64) {
    (if v > 0.0 { v } else { 0.0 }, if v < 0.0 { -v } else { 0.0 })
}

pub struct LegacyTransformer {
    config: LegacyConfig,
}

impl LegacyTransformer {
    pub fn new(config: LegacyConfig) -> Self {
        Self { config }
    }

    fn kind_of(&self, code: i64) -> Result<LegacyKind> {
        let t = &self.config.legacy_types;
        match code {
            c if c == t.buy => Ok(LegacyKind::Buy),
            c if c == t.sell => Ok(LegacyKind::Sell),
            c if c == t.dividend => Ok(LegacyKind::Dividend),
            c if c == t.credit => Ok(LegacyKind::Credit),
            c if c == t.debit => Ok(LegacyKind::Debit),
            other => Err(DepotError::UnknownLegacyType(other)),
        }
    }

    /// Which booking type a CREDIT/DEBIT entry becomes. Checked in order:
    /// any amount → Other, any fee → Fee, any tax component → Tax.
    fn infer_type(&self, legacy: &LegacyBooking) -> i64 {
        let ids = &self.config.booking_types;
        let tax_fee = legacy.fees
            + legacy.source_tax
            + legacy.transaction_tax
            + legacy.tax
            + legacy.soli;
        if legacy.amount != 0.0 {
            ids.other
        } else if legacy.fees != 0.0 {
            ids.fee
        } else if tax_fee != 0.0 {
            ids.tax
        } else {
            UNDEFINED_BOOKING_TYPE
        }
    }

    fn credit_debit(&self, legacy: &LegacyBooking, kind: LegacyKind) -> CreditDebit {
        let ids = &self.config.booking_types;
        let total = legacy.amount
            + legacy.fees
            + legacy.source_tax
            + legacy.transaction_tax
            + legacy.tax
            + legacy.soli;
        match kind {
            LegacyKind::Buy => CreditDebit {
                value: legacy.unit_quotation * legacy.count,
                booking_type_id: ids.buy,
            },
            // Legacy sells carry a negative count.
            LegacyKind::Sell => CreditDebit {
                value: legacy.unit_quotation * -legacy.count,
                booking_type_id: ids.sell,
            },
            LegacyKind::Dividend => CreditDebit {
                value: legacy.unit_quotation * legacy.count,
                booking_type_id: ids.dividend,
            },
            LegacyKind::Credit => CreditDebit {
                value: total,
                booking_type_id: self.infer_type(legacy),
            },
            LegacyKind::Debit => CreditDebit {
                value: -total,
                booking_type_id: self.infer_type(legacy),
            },
        }
    }

    pub fn transform_booking(
        &self,
        legacy: &LegacyBooking,
        index: usize,
        account_id: i64,
    ) -> Result<Booking> {
        let kind = self.kind_of(legacy.kind)?;
        let to_iso = self.config.iso_date;

        let (transaction_tax_credit, transaction_tax_debit) = split(legacy.transaction_tax);
        let (source_tax_credit, source_tax_debit) = split(legacy.source_tax);
        let (fee_credit, fee_debit) = split(legacy.fees);
        let (tax_credit, tax_debit) = split(legacy.tax);
        let (soli_credit, soli_debit) = split(legacy.soli);
        let (credit, debit) = split(legacy.amount);

        let mut booking = Booking {
            id: Some(index as i64 + 1),
            book_date: to_iso(legacy.date)?,
            ex_date: to_iso(legacy.ex_day)?,
            debit,
            credit,
            description: legacy.description.clone(),
            count: legacy.count.abs(),
            booking_type_id: UNDEFINED_BOOKING_TYPE,
            account_id,
            stock_id: legacy.stock_id,
            soli_credit,
            soli_debit,
            tax_credit,
            tax_debit,
            fee_credit,
            fee_debit,
            source_tax_credit,
            source_tax_debit,
            transaction_tax_credit,
            transaction_tax_debit,
            market_place: legacy.market_place.clone(),
        };

        let cd = self.credit_debit(legacy, kind);
        booking.booking_type_id = cd.booking_type_id;
        match kind {
            LegacyKind::Buy => {
                booking.debit = cd.value;
                booking.credit = 0.0;
            }
            LegacyKind::Sell | LegacyKind::Dividend => {
                booking.credit = cd.value;
                booking.debit = 0.0;
            }
            LegacyKind::Credit => {
                clear_tax_fee(&mut booking);
                booking.credit = cd.value;
                booking.debit = 0.0;
            }
            LegacyKind::Debit => {
                clear_tax_fee(&mut booking);
                booking.credit = 0.0;
                booking.debit = cd.value;
            }
        }
        Ok(booking)
    }

    pub fn transform_stock(&self, legacy: &LegacyStock, account_id: i64) -> Result<Stock> {
        let to_iso = self.config.iso_date;
        Ok(Stock {
            id: legacy.id,
            isin: legacy.isin.clone(),
            symbol: legacy.wkn.clone(),
            company: legacy.company.clone(),
            meeting_day: to_iso(legacy.meeting_day)?,
            quarter_day: to_iso(legacy.quarter_day)?,
            fade_out: legacy.fade_out,
            first_page: legacy.first_page,
            url: legacy.url.clone(),
            account_id,
            ask_dates: self.config.default_iso_date.clone(),
        })
    }

    /// Build a current-version backup from a legacy one. Legacy backups have
    /// no accounts, so `account` becomes account 1 and owns everything. Its
    /// IBAN and BIC are stored normalized, as for accounts added by hand.
    pub fn migrate(&self, legacy: &LegacyBackup, account: Account) -> Result<Backup> {
        let account_id = 1;
        let accounts = vec![Account {
            id: Some(account_id),
            iban: normalize(&account.iban),
            swift_bic: normalize(&account.swift_bic),
            ..account
        }];
        let booking_types = self
            .config
            .booking_types
            .defaults()
            .into_iter()
            .map(|(id, name)| BookingType { id: Some(id), name: name.to_string(), account_id })
            .collect();
        let stocks = legacy
            .stocks
            .iter()
            .map(|s| self.transform_stock(s, account_id))
            .collect::<Result<Vec<_>>>()?;
        let bookings = legacy
            .transfers
            .iter()
            .enumerate()
            .map(|(i, t)| self.transform_booking(t, i, account_id))
            .collect::<Result<Vec<_>>>()?;
        debug!(stocks = stocks.len(), bookings = bookings.len(), "migrated legacy backup");

        Ok(Backup {
            meta: BackupMeta {
                version: legacy.meta.version.clone(),
                db_version: CURRENT_VERSION,
                engine: legacy.meta.engine.clone(),
            },
            accounts,
            bookings,
            booking_types,
            stocks,
        })
    }
}

fn clear_tax_fee(b: &mut Booking) {
    b.soli_credit = 0.0;
    b.soli_debit = 0.0;
    b.tax_credit = 0.0;
    b.tax_debit = 0.0;
    b.fee_credit = 0.0;
    b.fee_debit = 0.0;
    b.source_tax_credit = 0.0;
    b.source_tax_debit = 0.0;
    b.transaction_tax_credit = 0.0;
    b.transaction_tax_debit = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: f64 = 86_400_000.0;

    fn transformer() -> LegacyTransformer {
        LegacyTransformer::new(LegacyConfig::default())
    }

    fn legacy(kind: i64) -> LegacyBooking {
        LegacyBooking {
            id: 10,
            date: 19_000.0 * DAY_MS,
            ex_day: 0.0,
            kind,
            stock_id: 0,
            description: "entry".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_split() {
        assert_eq!(split(5.0), (5.0, 0.0));
        assert_eq!(split(-5.0), (0.0, 5.0));
        assert_eq!(split(0.0), (0.0, 0.0));
    }

    #[test]
    fn test_buy_becomes_debit() {
        let mut l = legacy(1);
        l.unit_quotation = 12.5;
        l.count = 8.0;
        l.amount = -100.0;
        l.fees = -4.9;
        l.stock_id = 3;
        let b = transformer().transform_booking(&l, 0, 1).unwrap();
        assert_eq!(b.id, Some(1));
        assert_eq!(b.debit, 100.0);
        assert_eq!(b.credit, 0.0);
        assert_eq!(b.booking_type_id, 1);
        assert_eq!(b.fee_debit, 4.9);
        assert_eq!(b.book_date, "2022-01-08");
        assert_eq!(b.ex_date, "1970-01-01");
        assert_eq!(b.stock_id, 3);
    }

    #[test]
    fn test_sell_with_negative_legacy_count_is_positive_credit() {
        let mut l = legacy(2);
        l.unit_quotation = 20.0;
        l.count = -5.0;
        l.tax = -10.0;
        l.soli = -0.55;
        let b = transformer().transform_booking(&l, 4, 1).unwrap();
        assert_eq!(b.id, Some(5));
        assert_eq!(b.credit, 100.0);
        assert_eq!(b.debit, 0.0);
        assert_eq!(b.count, 5.0);
        assert_eq!(b.booking_type_id, 2);
        assert_eq!(b.tax_debit, 10.0);
        assert_eq!(b.soli_debit, 0.55);
    }

    #[test]
    fn test_sell_with_positive_count_keeps_sign_arithmetic() {
        let mut l = legacy(2);
        l.unit_quotation = 20.0;
        l.count = 5.0;
        let b = transformer().transform_booking(&l, 0, 1).unwrap();
        assert_eq!(b.credit, -100.0);
        assert_eq!(b.debit, 0.0);
    }

    #[test]
    fn test_dividend_becomes_credit() {
        let mut l = legacy(3);
        l.unit_quotation = 0.5;
        l.count = 40.0;
        l.source_tax = -3.0;
        let b = transformer().transform_booking(&l, 0, 1).unwrap();
        assert_eq!(b.credit, 20.0);
        assert_eq!(b.debit, 0.0);
        assert_eq!(b.booking_type_id, 3);
        assert_eq!(b.source_tax_debit, 3.0);
    }

    #[test]
    fn test_credit_round_trip_and_type_inference() {
        let t = transformer();
        let ids = t.config.booking_types;
        // (amount, fees, sTax, fTax, tax, soli, expected type)
        let cases = [
            (250.0, 0.0, 0.0, 0.0, 0.0, 0.0, ids.other),
            (250.0, -2.0, 0.0, 0.0, -10.0, 0.0, ids.other),
            (0.0, -2.5, 0.0, 0.0, 0.0, 0.0, ids.fee),
            (0.0, -2.5, 0.0, 0.0, -7.0, 0.0, ids.fee),
            (0.0, 0.0, 0.0, 0.0, 18.0, 0.99, ids.tax),
            (0.0, 0.0, -1.5, 0.0, 0.0, 0.0, ids.tax),
            (0.0, 0.0, 0.0, 0.3, 0.0, 0.0, ids.tax),
            (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, UNDEFINED_BOOKING_TYPE),
        ];
        for (amount, fees, s_tax, f_tax, tax, soli, expected) in cases {
            let mut l = legacy(4);
            l.amount = amount;
            l.fees = fees;
            l.source_tax = s_tax;
            l.transaction_tax = f_tax;
            l.tax = tax;
            l.soli = soli;
            let b = t.transform_booking(&l, 0, 1).unwrap();
            assert_eq!(b.credit - b.debit, amount + fees + s_tax + f_tax + tax + soli);
            assert_eq!(b.booking_type_id, expected, "amount={amount} fees={fees}");
            assert_eq!(b.fee_debit + b.tax_debit + b.soli_credit + b.tax_credit, 0.0);
        }
    }

    #[test]
    fn test_debit_uses_negated_total() {
        let mut l = legacy(5);
        l.amount = -80.0;
        l.fees = -1.0;
        let b = transformer().transform_booking(&l, 0, 1).unwrap();
        assert_eq!(b.debit, 81.0);
        assert_eq!(b.credit, 0.0);
        assert_eq!(b.booking_type_id, 4);
        assert_eq!(b.fee_debit, 0.0);
    }

    #[test]
    fn test_debit_fee_only() {
        let mut l = legacy(5);
        l.fees = -12.0;
        let b = transformer().transform_booking(&l, 0, 1).unwrap();
        assert_eq!(b.debit, 12.0);
        assert_eq!(b.booking_type_id, 5);
    }

    #[test]
    fn test_unknown_legacy_type_fails() {
        let err = transformer().transform_booking(&legacy(9), 0, 1).unwrap_err();
        assert!(matches!(err, DepotError::UnknownLegacyType(9)));
    }

    #[test]
    fn test_invalid_date_fails() {
        let mut l = legacy(1);
        l.date = f64::NAN;
        assert!(matches!(
            transformer().transform_booking(&l, 0, 1),
            Err(DepotError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_injected_iso_date() {
        fn fixed(_: f64) -> Result<String> {
            Ok("2000-01-01".to_string())
        }
        let t = LegacyTransformer::new(LegacyConfig { iso_date: fixed, ..Default::default() });
        let b = t.transform_booking(&legacy(1), 0, 1).unwrap();
        assert_eq!(b.book_date, "2000-01-01");
    }

    #[test]
    fn test_transform_stock() {
        let l = LegacyStock {
            id: Some(4),
            isin: "DE0007164600".to_string(),
            wkn: "716460".to_string(),
            company: "SAP SE".to_string(),
            meeting_day: 19_500.0 * DAY_MS,
            quarter_day: 0.0,
            fade_out: 1,
            first_page: 0,
            url: "https://example.org/sap".to_string(),
        };
        let s = transformer().transform_stock(&l, 1).unwrap();
        assert_eq!(s.id, Some(4));
        assert_eq!(s.symbol, "716460");
        assert_eq!(s.meeting_day, "2023-05-23");
        assert_eq!(s.quarter_day, "1970-01-01");
        assert_eq!(s.ask_dates, "1970-01-01");
        assert_eq!(s.fade_out, 1);
        assert_eq!(s.account_id, 1);
    }

    #[test]
    fn test_migrate_seeds_account_and_types() {
        let backup = LegacyBackup {
            meta: BackupMeta { version: "0.9".to_string(), db_version: 25, engine: "idb".to_string() },
            stocks: vec![LegacyStock { id: Some(1), ..Default::default() }],
            transfers: vec![
                LegacyBooking { kind: 1, count: 1.0, unit_quotation: 10.0, stock_id: 1, ..Default::default() },
                LegacyBooking { kind: 4, amount: 5.0, ..Default::default() },
            ],
        };
        let account = Account {
            id: None,
            swift_bic: "deut deff".to_string(),
            iban: "de13 1203 0000 1064 5069 99".to_string(),
            logo_url: String::new(),
            with_depot: 1,
        };
        let out = transformer().migrate(&backup, account).unwrap();
        assert_eq!(out.meta.db_version, CURRENT_VERSION);
        assert_eq!(out.accounts[0].id, Some(1));
        assert_eq!(out.accounts[0].iban, "DE13120300001064506999");
        assert_eq!(out.accounts[0].swift_bic, "DEUTDEFF");
        assert_eq!(out.booking_types.len(), 6);
        assert!(out.booking_types.iter().all(|t| t.account_id == 1));
        assert_eq!(out.bookings.len(), 2);
        assert_eq!(out.bookings[1].id, Some(2));
        assert_eq!(out.bookings[1].booking_type_id, 4);
        assert_eq!(out.stocks[0].account_id, 1);
    }
}
