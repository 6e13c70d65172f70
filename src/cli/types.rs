use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::db::{add_booking_type, list_booking_types, remove_booking_type, rename_booking_type};
use crate::error::Result;
use crate::models::display_id;

pub fn add(account: i64, name: &str) -> Result<()> {
    let conn = open_db()?;
    let id = add_booking_type(&conn, account, name)?;
    println!("Added booking type {id}: {}", name.trim());
    Ok(())
}

pub fn rename(id: i64, name: &str) -> Result<()> {
    let conn = open_db()?;
    rename_booking_type(&conn, id, name)?;
    println!("Renamed booking type {id}");
    Ok(())
}

pub fn remove(id: i64) -> Result<()> {
    let conn = open_db()?;
    remove_booking_type(&conn, id)?;
    println!("Removed booking type {id}");
    Ok(())
}

pub fn list(account: Option<i64>) -> Result<()> {
    let conn = open_db()?;
    let rows = list_booking_types(&conn, account)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Account"]);
    for t in rows {
        table.add_row(vec![Cell::new(display_id(t.id)), Cell::new(t.name), Cell::new(t.account_id)]);
    }
    println!("Booking types\n{table}");
    Ok(())
}
