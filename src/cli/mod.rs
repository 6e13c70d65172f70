pub mod accounts;
pub mod bookings;
pub mod check;
pub mod export;
pub mod import;
pub mod init;
pub mod load;
pub mod status;
pub mod stocks;
pub mod types;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;

use crate::alerts::{AlertThrottle, SystemClock};
use crate::db::{get_connection, init_db};
use crate::error::{DepotError, Result};
use crate::settings::get_db_path;

/// Open the configured database, refusing to create one implicitly.
pub(crate) fn open_db() -> Result<Connection> {
    let db_path = get_db_path();
    if !db_path.exists() {
        return Err(DepotError::Settings(format!(
            "No database found at {}\nRun `depot init` first.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// Print validation problems, each distinct message once.
pub(crate) fn report_problems(header: &str, problems: &[String]) {
    eprintln!("{header}");
    let mut throttle = AlertThrottle::new(SystemClock, 60_000);
    throttle.report(problems);
}

#[derive(Parser)]
#[command(name = "depot", version, about = "Bank account and stock depot bookkeeping.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for depot data (default: ~/Documents/depot)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Decimal convention for typed amounts: de, en or auto
        #[arg(long)]
        locale: Option<String>,
    },
    /// Switch to an existing depot data directory.
    Load {
        /// Path to data directory containing depot.db
        path: String,
    },
    /// Show current database and record counts.
    Status,
    /// Check an IBAN, ISIN or SWIFT/BIC.
    Check {
        #[arg(value_enum)]
        kind: IdentifierKind,
        value: String,
    },
    /// Validate a backup file without importing it.
    Validate {
        /// Path to a JSON backup
        file: String,
    },
    /// Replace the stored data with a JSON backup.
    Import {
        /// Path to a JSON backup
        file: String,
        /// IBAN of the account created for a legacy (version 25) backup
        #[arg(long)]
        iban: Option<String>,
        /// SWIFT/BIC of the account created for a legacy backup
        #[arg(long)]
        swift: Option<String>,
        /// Import even if this file was imported before
        #[arg(long)]
        force: bool,
    },
    /// Write the stored data as a JSON backup.
    Export {
        /// Output path (default: <data_dir>/exports/depot-YYYYMMDD-HHMMSS.json)
        #[arg(long)]
        output: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage stocks.
    Stocks {
        #[command(subcommand)]
        command: StocksCommands,
    },
    /// Manage booking types.
    Types {
        #[command(subcommand)]
        command: TypesCommands,
    },
    /// Manage bookings.
    Bookings {
        #[command(subcommand)]
        command: BookingsCommands,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum IdentifierKind {
    Iban,
    Isin,
    Swift,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        #[arg(long)]
        iban: String,
        #[arg(long)]
        swift: String,
        #[arg(long = "logo-url", default_value = "")]
        logo_url: String,
        /// The account holds a securities depot
        #[arg(long = "with-depot")]
        with_depot: bool,
    },
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum StocksCommands {
    /// Add a stock to an account's depot.
    Add {
        #[arg(long)]
        account: i64,
        #[arg(long)]
        isin: String,
        #[arg(long, default_value = "")]
        symbol: String,
        #[arg(long)]
        company: String,
        #[arg(long, default_value = "")]
        url: String,
    },
    /// List stocks.
    List {
        #[arg(long)]
        account: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum TypesCommands {
    /// Add a booking type to an account.
    Add {
        #[arg(long)]
        account: i64,
        name: String,
    },
    /// Rename a booking type.
    Rename { id: i64, name: String },
    /// Remove a booking type no booking uses.
    Remove { id: i64 },
    /// List booking types.
    List {
        #[arg(long)]
        account: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum BookingsCommands {
    /// Add a booking. Amounts accept 1.234,56 or 1,234.56.
    Add {
        #[arg(long)]
        account: i64,
        /// Booking type id
        #[arg(long = "type")]
        booking_type: i64,
        /// Booking date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long, conflicts_with = "debit", required_unless_present = "debit")]
        credit: Option<String>,
        #[arg(long)]
        debit: Option<String>,
        #[arg(long)]
        stock: Option<i64>,
        #[arg(long, default_value = "0")]
        count: String,
        #[arg(long, default_value = "0")]
        fee: String,
        #[arg(long, default_value = "0")]
        tax: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List bookings.
    List {
        #[arg(long)]
        account: Option<i64>,
    },
}
