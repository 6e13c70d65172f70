use colored::Colorize;

use crate::cli::IdentifierKind;
use crate::error::{DepotError, Result};
use crate::identifiers::{normalize, validate_iban, validate_isin, validate_swift};

pub fn run(kind: IdentifierKind, value: &str) -> Result<()> {
    let (field, outcome) = match kind {
        IdentifierKind::Iban => ("IBAN", validate_iban(value)),
        IdentifierKind::Isin => ("ISIN", validate_isin(value)),
        IdentifierKind::Swift => ("SWIFT/BIC", validate_swift(value)),
    };
    match outcome {
        Ok(()) => {
            println!("{} {field} {}", "ok".green().bold(), normalize(value));
            Ok(())
        }
        Err(source) => {
            eprintln!("{} {field} ({})", "rejected".red().bold(), source.code());
            Err(DepotError::Identifier { field, source })
        }
    }
}
