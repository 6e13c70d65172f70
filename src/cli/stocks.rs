use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{account_exists, insert_stock, list_stocks};
use crate::error::{DepotError, Result};
use crate::identifiers::{normalize, validate_isin};
use crate::models::{display_id, Stock, DEFAULT_ISO_DATE};

pub fn add(account: i64, isin: &str, symbol: &str, company: &str, url: &str) -> Result<()> {
    validate_isin(isin).map_err(|source| DepotError::Identifier { field: "ISIN", source })?;

    let conn = open_db()?;
    if !account_exists(&conn, account)? {
        return Err(DepotError::NotFound(format!("account {account}")));
    }
    let stock = Stock {
        id: None,
        isin: normalize(isin),
        symbol: symbol.to_string(),
        company: company.to_string(),
        meeting_day: String::new(),
        quarter_day: String::new(),
        fade_out: 0,
        first_page: 0,
        url: url.to_string(),
        account_id: account,
        ask_dates: DEFAULT_ISO_DATE.to_string(),
    };
    let id = insert_stock(&conn, &stock)?;
    println!("Added stock {id}: {} ({company})", stock.isin);
    Ok(())
}

pub fn list(account: Option<i64>) -> Result<()> {
    let conn = open_db()?;
    let rows = list_stocks(&conn, account)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "ISIN", "Symbol", "Company", "Account", "Faded"]);
    for s in rows {
        table.add_row(vec![
            Cell::new(display_id(s.id)),
            Cell::new(s.isin),
            Cell::new(s.symbol),
            Cell::new(s.company),
            Cell::new(s.account_id),
            Cell::new(if s.fade_out == 1 { "yes" } else { "" }),
        ]);
    }
    println!("Stocks\n{table}");
    Ok(())
}
