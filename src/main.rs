mod alerts;
mod cli;
mod db;
mod error;
mod fmt;
mod identifiers;
mod importer;
mod legacy;
mod models;
mod numbers;
mod settings;
mod validator;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{AccountsCommands, BookingsCommands, Cli, Commands, StocksCommands, TypesCommands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, locale } => cli::init::run(data_dir, locale),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Status => cli::status::run(),
        Commands::Check { kind, value } => cli::check::run(kind, &value),
        Commands::Validate { file } => cli::validate::run(&file),
        Commands::Import {
            file,
            iban,
            swift,
            force,
        } => cli::import::run(&file, iban, swift, force),
        Commands::Export { output } => cli::export::run(output),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                iban,
                swift,
                logo_url,
                with_depot,
            } => cli::accounts::add(&iban, &swift, &logo_url, with_depot),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Stocks { command } => match command {
            StocksCommands::Add {
                account,
                isin,
                symbol,
                company,
                url,
            } => cli::stocks::add(account, &isin, &symbol, &company, &url),
            StocksCommands::List { account } => cli::stocks::list(account),
        },
        Commands::Types { command } => match command {
            TypesCommands::Add { account, name } => cli::types::add(account, &name),
            TypesCommands::Rename { id, name } => cli::types::rename(id, &name),
            TypesCommands::Remove { id } => cli::types::remove(id),
            TypesCommands::List { account } => cli::types::list(account),
        },
        Commands::Bookings { command } => match command {
            BookingsCommands::Add {
                account,
                booking_type,
                date,
                credit,
                debit,
                stock,
                count,
                fee,
                tax,
                description,
            } => cli::bookings::add(cli::bookings::NewBooking {
                account,
                booking_type,
                date,
                credit,
                debit,
                stock,
                count,
                fee,
                tax,
                description,
            }),
            BookingsCommands::List { account } => cli::bookings::list(account),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
