use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::open_db;
use crate::db::{account_exists, insert_booking, list_booking_types, list_bookings, list_stocks};
use crate::error::{DepotError, Result};
use crate::fmt::amount;
use crate::models::Booking;
use crate::numbers::{to_number, utc_date, NumberLocale, NumberOptions};
use crate::settings::load_settings;

/// Raw command line input for a new booking; amounts are still strings.
pub struct NewBooking {
    pub account: i64,
    pub booking_type: i64,
    pub date: String,
    pub credit: Option<String>,
    pub debit: Option<String>,
    pub stock: Option<i64>,
    pub count: String,
    pub fee: String,
    pub tax: String,
    pub description: String,
}

fn parse_amount(raw: &str, locale: Option<NumberLocale>) -> Result<f64> {
    let opts = NumberOptions { locale, fallback: None, throw_on_error: true };
    let value = to_number(raw, &opts)?;
    if value < 0.0 {
        return Err(DepotError::InvalidNumber(format!("{raw} (amounts must not be negative)")));
    }
    Ok(value)
}

fn build_booking(input: &NewBooking, locale: Option<NumberLocale>) -> Result<Booking> {
    let book_date = utc_date(&input.date)?.format("%Y-%m-%d").to_string();
    let (credit, debit) = match (&input.credit, &input.debit) {
        (Some(c), None) => (parse_amount(c, locale)?, 0.0),
        (None, Some(d)) => (0.0, parse_amount(d, locale)?),
        _ => return Err(DepotError::Other("give exactly one of --credit or --debit".to_string())),
    };
    let count_opts = NumberOptions { locale, fallback: None, throw_on_error: true };

    Ok(Booking {
        id: None,
        book_date,
        credit,
        debit,
        description: input.description.trim().to_string(),
        count: to_number(&input.count, &count_opts)?,
        booking_type_id: input.booking_type,
        account_id: input.account,
        stock_id: input.stock.unwrap_or(0),
        fee_debit: parse_amount(&input.fee, locale)?,
        tax_debit: parse_amount(&input.tax, locale)?,
        ..Booking::default()
    })
}

pub fn add(input: NewBooking) -> Result<()> {
    let settings = load_settings();
    let booking = build_booking(&input, settings.locale())?;

    let conn = open_db()?;
    if !account_exists(&conn, booking.account_id)? {
        return Err(DepotError::NotFound(format!("account {}", booking.account_id)));
    }
    let known_type = list_booking_types(&conn, Some(booking.account_id))?
        .iter()
        .any(|t| t.id == Some(booking.booking_type_id));
    if !known_type {
        return Err(DepotError::NotFound(format!(
            "booking type {} for account {}",
            booking.booking_type_id, booking.account_id
        )));
    }
    if let Some(stock) = input.stock {
        let known_stock = list_stocks(&conn, Some(booking.account_id))?
            .iter()
            .any(|s| s.id == Some(stock));
        if !known_stock {
            return Err(DepotError::NotFound(format!("stock {stock}")));
        }
    }

    let id = insert_booking(&conn, &booking)?;
    println!("Added booking {id} on {}", booking.book_date);
    Ok(())
}

pub fn list(account: Option<i64>) -> Result<()> {
    let conn = open_db()?;
    let locale = load_settings().locale().unwrap_or(NumberLocale::De);
    let types = list_booking_types(&conn, account)?;
    let rows = list_bookings(&conn, account)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Type", "Credit", "Debit", "Count", "Description"]);
    for b in rows {
        let type_name = types
            .iter()
            .find(|t| t.id == Some(b.booking_type_id))
            .map(|t| t.name.clone())
            .unwrap_or_else(|| b.booking_type_id.to_string());
        table.add_row(vec![
            Cell::new(b.id.unwrap_or_default()),
            Cell::new(b.book_date),
            Cell::new(type_name),
            Cell::new(amount(b.credit, locale)).set_alignment(CellAlignment::Right),
            Cell::new(amount(b.debit, locale)).set_alignment(CellAlignment::Right),
            Cell::new(b.count),
            Cell::new(b.description),
        ]);
    }
    println!("Bookings\n{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewBooking {
        NewBooking {
            account: 1,
            booking_type: 4,
            date: "2024-03-01".to_string(),
            credit: Some("1.234,56".to_string()),
            debit: None,
            stock: None,
            count: "0".to_string(),
            fee: "0".to_string(),
            tax: "0".to_string(),
            description: "  Salary ".to_string(),
        }
    }

    #[test]
    fn test_build_booking_detects_number_format() {
        let b = build_booking(&input(), None).unwrap();
        assert_eq!(b.credit, 1234.56);
        assert_eq!(b.debit, 0.0);
        assert_eq!(b.book_date, "2024-03-01");
        assert_eq!(b.description, "Salary");
        assert_eq!(b.stock_id, 0);
    }

    #[test]
    fn test_build_booking_honors_configured_locale() {
        let mut i = input();
        i.credit = None;
        i.debit = Some("1,5".to_string());
        let b = build_booking(&i, Some(NumberLocale::De)).unwrap();
        assert_eq!(b.debit, 1.5);
    }

    #[test]
    fn test_build_booking_rejects_bad_input() {
        let mut i = input();
        i.credit = Some("-5".to_string());
        assert!(matches!(build_booking(&i, None), Err(DepotError::InvalidNumber(_))));

        let mut i = input();
        i.credit = Some("abc".to_string());
        assert!(matches!(build_booking(&i, None), Err(DepotError::InvalidNumber(_))));

        let mut i = input();
        i.date = "01.03.2024".to_string();
        assert!(matches!(build_booking(&i, None), Err(DepotError::InvalidDate(_))));

        let mut i = input();
        i.debit = Some("3".to_string());
        assert!(build_booking(&i, None).is_err());
    }
}
