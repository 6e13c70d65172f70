use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{add_account, list_accounts};
use crate::error::{DepotError, Result};
use crate::identifiers::{validate_iban, validate_swift};
use crate::models::{display_id, Account};

pub fn add(iban: &str, swift: &str, logo_url: &str, with_depot: bool) -> Result<()> {
    validate_iban(iban).map_err(|source| DepotError::Identifier { field: "IBAN", source })?;
    validate_swift(swift).map_err(|source| DepotError::Identifier { field: "SWIFT/BIC", source })?;

    let conn = open_db()?;
    let account = Account {
        id: None,
        swift_bic: swift.to_string(),
        iban: iban.to_string(),
        logo_url: logo_url.to_string(),
        with_depot: i64::from(with_depot),
    };
    let id = add_account(&conn, &account)?;
    println!("Added account {id}: {iban}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let rows = list_accounts(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "IBAN", "SWIFT/BIC", "Depot", "Logo"]);
    for a in rows {
        table.add_row(vec![
            Cell::new(display_id(a.id)),
            Cell::new(a.iban),
            Cell::new(a.swift_bic),
            Cell::new(if a.with_depot == 1 { "yes" } else { "no" }),
            Cell::new(a.logo_url),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
