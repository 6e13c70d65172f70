use colored::Colorize;

use crate::db::{counts, get_connection, init_db, last_import};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    let locale = if settings.number_locale.is_empty() { "(auto)" } else { &settings.number_locale };
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Numbers:    {locale}");

    if !db_path.exists() {
        println!();
        println!("{}", "Database not found. Run `depot init` to set up.".yellow());
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    let c = counts(&conn)?;

    println!();
    println!("Accounts:       {}", c.accounts);
    println!("Booking types:  {}", c.booking_types);
    println!("Stocks:         {}", c.stocks);
    println!("Bookings:       {}", c.bookings);

    if let Some((filename, date, version)) = last_import(&conn)? {
        println!("Last import:    {filename} ({date}, version {version})");
    }

    Ok(())
}
