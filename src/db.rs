use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{DepotError, Result};
use crate::identifiers;
use crate::models::{Account, Backup, BackupMeta, Booking, BookingType, Stock, CURRENT_VERSION};
use crate::numbers::normalize_booking_type_name;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    swift TEXT NOT NULL,
    iban TEXT NOT NULL UNIQUE,
    logo_url TEXT NOT NULL DEFAULT '',
    with_depot INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS booking_types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS stocks (
    id INTEGER PRIMARY KEY,
    isin TEXT NOT NULL,
    symbol TEXT NOT NULL DEFAULT '',
    company TEXT NOT NULL DEFAULT '',
    meeting_day TEXT NOT NULL DEFAULT '1970-01-01',
    quarter_day TEXT NOT NULL DEFAULT '1970-01-01',
    fade_out INTEGER NOT NULL DEFAULT 0,
    first_page INTEGER NOT NULL DEFAULT 0,
    url TEXT NOT NULL DEFAULT '',
    account_id INTEGER NOT NULL,
    ask_dates TEXT NOT NULL DEFAULT '1970-01-01',
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS bookings (
    id INTEGER PRIMARY KEY,
    book_date TEXT NOT NULL,
    ex_date TEXT NOT NULL DEFAULT '',
    debit REAL NOT NULL DEFAULT 0,
    credit REAL NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    count REAL NOT NULL DEFAULT 0,
    booking_type_id INTEGER NOT NULL,
    account_id INTEGER NOT NULL,
    stock_id INTEGER,
    soli_credit REAL NOT NULL DEFAULT 0,
    soli_debit REAL NOT NULL DEFAULT 0,
    tax_credit REAL NOT NULL DEFAULT 0,
    tax_debit REAL NOT NULL DEFAULT 0,
    fee_credit REAL NOT NULL DEFAULT 0,
    fee_debit REAL NOT NULL DEFAULT 0,
    source_tax_credit REAL NOT NULL DEFAULT 0,
    source_tax_debit REAL NOT NULL DEFAULT 0,
    transaction_tax_credit REAL NOT NULL DEFAULT 0,
    transaction_tax_debit REAL NOT NULL DEFAULT 0,
    market_place TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (booking_type_id) REFERENCES booking_types(id),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (stock_id) REFERENCES stocks(id)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    db_version INTEGER NOT NULL,
    record_count INTEGER NOT NULL,
    checksum TEXT NOT NULL
);
";

const BOOKING_COLUMNS: &str = "id, book_date, ex_date, debit, credit, description, count, \
    booking_type_id, account_id, stock_id, soli_credit, soli_debit, tax_credit, tax_debit, \
    fee_credit, fee_debit, source_tax_credit, source_tax_debit, transaction_tax_credit, \
    transaction_tax_debit, market_place";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Whole-dataset load and dump
// ---------------------------------------------------------------------------

/// Drop every account, stock, booking type and booking.
pub fn clean(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM bookings; DELETE FROM stocks; DELETE FROM booking_types; DELETE FROM accounts;",
    )?;
    Ok(())
}

/// The file a backup was read from, logged in `imports`.
pub struct ImportSource<'a> {
    pub filename: &'a str,
    pub db_version: i64,
    pub checksum: &'a str,
}

/// Replace the stored dataset with a validated backup and log where it came
/// from, all or nothing.
pub fn replace_all(conn: &mut Connection, backup: &Backup, source: &ImportSource) -> Result<()> {
    let tx = conn.transaction()?;
    clean(&tx)?;
    for a in &backup.accounts {
        insert_account(&tx, a)?;
    }
    for t in &backup.booking_types {
        if t.id.is_none() {
            return Err(DepotError::InvalidBackup(format!("Booking type {:?} has no ID", t.name)));
        }
        tx.execute(
            "INSERT INTO booking_types (id, name, account_id) VALUES (?1, ?2, ?3)",
            params![t.id, t.name, t.account_id],
        )?;
    }
    for s in &backup.stocks {
        insert_stock(&tx, s)?;
    }
    for b in &backup.bookings {
        insert_booking(&tx, b)?;
    }
    record_import(&tx, source.filename, source.db_version, backup.record_count(), source.checksum)?;
    tx.commit()?;
    info!(
        accounts = backup.accounts.len(),
        stocks = backup.stocks.len(),
        booking_types = backup.booking_types.len(),
        bookings = backup.bookings.len(),
        "stored backup"
    );
    Ok(())
}

pub fn read_backup(conn: &Connection) -> Result<Backup> {
    Ok(Backup {
        meta: BackupMeta {
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_version: CURRENT_VERSION,
            engine: "sqlite".to_string(),
        },
        accounts: list_accounts(conn)?,
        bookings: list_bookings(conn, None)?,
        booking_types: list_booking_types(conn, None)?,
        stocks: list_stocks(conn, None)?,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub accounts: i64,
    pub booking_types: i64,
    pub stocks: i64,
    pub bookings: i64,
}

pub fn counts(conn: &Connection) -> Result<Counts> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
    };
    Ok(Counts {
        accounts: count("accounts")?,
        booking_types: count("booking_types")?,
        stocks: count("stocks")?,
        bookings: count("bookings")?,
    })
}

/// File name, date and source version of the most recent import.
pub fn last_import(conn: &Connection) -> Result<Option<(String, String, i64)>> {
    Ok(conn
        .query_row(
            "SELECT filename, import_date, db_version FROM imports ORDER BY id DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

fn insert_account(conn: &Connection, a: &Account) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (id, swift, iban, logo_url, with_depot) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![a.id, a.swift_bic, a.iban, a.logo_url, a.with_depot],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a new account; the IBAN must not be on file yet.
pub fn add_account(conn: &Connection, account: &Account) -> Result<i64> {
    let iban = identifiers::normalize(&account.iban);
    let exists = conn
        .prepare("SELECT 1 FROM accounts WHERE iban = ?1")?
        .exists([&iban])?;
    if exists {
        return Err(DepotError::DuplicateIban(iban));
    }
    let stored = Account {
        iban,
        swift_bic: identifiers::normalize(&account.swift_bic),
        ..account.clone()
    };
    let id = insert_account(conn, &stored)?;
    debug!(id, "added account");
    Ok(id)
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt =
        conn.prepare("SELECT id, swift, iban, logo_url, with_depot FROM accounts ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Account {
                id: Some(row.get(0)?),
                swift_bic: row.get(1)?,
                iban: row.get(2)?,
                logo_url: row.get(3)?,
                with_depot: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn account_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.prepare("SELECT 1 FROM accounts WHERE id = ?1")?.exists([id])?)
}

// ---------------------------------------------------------------------------
// Booking types
// ---------------------------------------------------------------------------

/// Whether `name` (after whitespace normalization) is already used by another
/// booking type of the account. `exclude` skips the type being renamed.
pub fn booking_type_name_taken(
    conn: &Connection,
    account_id: i64,
    name: &str,
    exclude: Option<i64>,
) -> Result<bool> {
    let wanted = normalize_booking_type_name(name);
    let taken = list_booking_types(conn, Some(account_id))?
        .iter()
        .filter(|t| t.id != exclude)
        .any(|t| normalize_booking_type_name(&t.name) == wanted);
    Ok(taken)
}

pub fn add_booking_type(conn: &Connection, account_id: i64, name: &str) -> Result<i64> {
    if !account_exists(conn, account_id)? {
        return Err(DepotError::NotFound(format!("account {account_id}")));
    }
    let name = normalize_booking_type_name(name);
    if booking_type_name_taken(conn, account_id, &name, None)? {
        return Err(DepotError::DuplicateBookingType(name));
    }
    conn.execute(
        "INSERT INTO booking_types (name, account_id) VALUES (?1, ?2)",
        params![name, account_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn rename_booking_type(conn: &Connection, id: i64, name: &str) -> Result<()> {
    let account_id: Option<i64> = conn
        .query_row("SELECT account_id FROM booking_types WHERE id = ?1", [id], |r| r.get(0))
        .optional()?;
    let Some(account_id) = account_id else {
        return Err(DepotError::NotFound(format!("booking type {id}")));
    };
    let name = normalize_booking_type_name(name);
    if booking_type_name_taken(conn, account_id, &name, Some(id))? {
        return Err(DepotError::DuplicateBookingType(name));
    }
    conn.execute("UPDATE booking_types SET name = ?1 WHERE id = ?2", params![name, id])?;
    Ok(())
}

/// Delete a booking type that no booking refers to.
pub fn remove_booking_type(conn: &Connection, id: i64) -> Result<()> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM bookings WHERE booking_type_id = ?1",
        [id],
        |r| r.get(0),
    )?;
    if count > 0 {
        return Err(DepotError::BookingTypeInUse { id, count });
    }
    let deleted = conn.execute("DELETE FROM booking_types WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(DepotError::NotFound(format!("booking type {id}")));
    }
    Ok(())
}

pub fn list_booking_types(conn: &Connection, account_id: Option<i64>) -> Result<Vec<BookingType>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, account_id FROM booking_types \
         WHERE ?1 IS NULL OR account_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([account_id], |row| {
            Ok(BookingType {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                account_id: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Stocks
// ---------------------------------------------------------------------------

pub fn insert_stock(conn: &Connection, s: &Stock) -> Result<i64> {
    conn.execute(
        "INSERT INTO stocks (id, isin, symbol, company, meeting_day, quarter_day, fade_out, \
         first_page, url, account_id, ask_dates) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            s.id,
            s.isin,
            s.symbol,
            s.company,
            s.meeting_day,
            s.quarter_day,
            s.fade_out,
            s.first_page,
            s.url,
            s.account_id,
            s.ask_dates,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_stocks(conn: &Connection, account_id: Option<i64>) -> Result<Vec<Stock>> {
    let mut stmt = conn.prepare(
        "SELECT id, isin, symbol, company, meeting_day, quarter_day, fade_out, first_page, url, \
         account_id, ask_dates FROM stocks WHERE ?1 IS NULL OR account_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map([account_id], |row| {
            Ok(Stock {
                id: Some(row.get(0)?),
                isin: row.get(1)?,
                symbol: row.get(2)?,
                company: row.get(3)?,
                meeting_day: row.get(4)?,
                quarter_day: row.get(5)?,
                fade_out: row.get(6)?,
                first_page: row.get(7)?,
                url: row.get(8)?,
                account_id: row.get(9)?,
                ask_dates: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

pub fn insert_booking(conn: &Connection, b: &Booking) -> Result<i64> {
    let stock_id = (b.stock_id != 0).then_some(b.stock_id);
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
        ),
        params![
            b.id,
            b.book_date,
            b.ex_date,
            b.debit,
            b.credit,
            b.description,
            b.count,
            b.booking_type_id,
            b.account_id,
            stock_id,
            b.soli_credit,
            b.soli_debit,
            b.tax_credit,
            b.tax_debit,
            b.fee_credit,
            b.fee_debit,
            b.source_tax_credit,
            b.source_tax_debit,
            b.transaction_tax_credit,
            b.transaction_tax_debit,
            b.market_place,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: Some(row.get(0)?),
        book_date: row.get(1)?,
        ex_date: row.get(2)?,
        debit: row.get(3)?,
        credit: row.get(4)?,
        description: row.get(5)?,
        count: row.get(6)?,
        booking_type_id: row.get(7)?,
        account_id: row.get(8)?,
        stock_id: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
        soli_credit: row.get(10)?,
        soli_debit: row.get(11)?,
        tax_credit: row.get(12)?,
        tax_debit: row.get(13)?,
        fee_credit: row.get(14)?,
        fee_debit: row.get(15)?,
        source_tax_credit: row.get(16)?,
        source_tax_debit: row.get(17)?,
        transaction_tax_credit: row.get(18)?,
        transaction_tax_debit: row.get(19)?,
        market_place: row.get(20)?,
    })
}

pub fn list_bookings(conn: &Connection, account_id: Option<i64>) -> Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE ?1 IS NULL OR account_id = ?1 \
         ORDER BY book_date, id"
    ))?;
    let rows = stmt
        .query_map([account_id], booking_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Import log
// ---------------------------------------------------------------------------

pub fn import_checksum_known(conn: &Connection, checksum: &str) -> Result<bool> {
    Ok(conn
        .prepare("SELECT 1 FROM imports WHERE checksum = ?1")?
        .exists([checksum])?)
}

pub fn record_import(
    conn: &Connection,
    filename: &str,
    db_version: i64,
    record_count: usize,
    checksum: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO imports (filename, db_version, record_count, checksum) VALUES (?1, ?2, ?3, ?4)",
        params![filename, db_version, record_count as i64, checksum],
    )?;
    Ok(())
}
