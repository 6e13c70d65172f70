use std::path::PathBuf;

use crate::cli::{open_db, report_problems};
use crate::error::{DepotError, Result};
use crate::identifiers::{validate_iban, validate_swift};
use crate::importer::import_file;
use crate::legacy::{LegacyConfig, LegacyTransformer};
use crate::models::Account;

/// The account a legacy backup is attached to. Both identifiers are needed
/// together; a current backup carries its own accounts.
fn legacy_account(iban: Option<String>, swift: Option<String>) -> Result<Option<Account>> {
    match (iban, swift) {
        (None, None) => Ok(None),
        (Some(iban), Some(swift)) => {
            validate_iban(&iban).map_err(|source| DepotError::Identifier { field: "IBAN", source })?;
            validate_swift(&swift)
                .map_err(|source| DepotError::Identifier { field: "SWIFT/BIC", source })?;
            Ok(Some(Account {
                id: None,
                swift_bic: swift,
                iban,
                logo_url: String::new(),
                with_depot: 1,
            }))
        }
        _ => Err(DepotError::Other("--iban and --swift must be given together".to_string())),
    }
}

pub fn run(file: &str, iban: Option<String>, swift: Option<String>, force: bool) -> Result<()> {
    let file_path = PathBuf::from(file);
    let account = legacy_account(iban, swift)?;
    let transformer = LegacyTransformer::new(LegacyConfig::default());
    let mut conn = open_db()?;

    let result = match import_file(&mut conn, &file_path, account, force, &transformer) {
        Ok(r) => r,
        Err(DepotError::Integrity(errors)) => {
            report_problems("Backup problems:", &errors);
            return Err(DepotError::Integrity(errors));
        }
        Err(e) => return Err(e),
    };

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum). Use --force to import again.");
        return Ok(());
    }

    println!(
        "{} records imported from version {} backup",
        result.imported, result.source_version
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_account_requires_both_identifiers() {
        assert!(legacy_account(None, None).unwrap().is_none());
        assert!(legacy_account(Some("DE13120300001064506999".into()), None).is_err());
    }

    #[test]
    fn test_legacy_account_validates_identifiers() {
        let account = legacy_account(
            Some("DE13120300001064506999".into()),
            Some("DEUTDEFF".into()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(account.with_depot, 1);

        let err = legacy_account(Some("DE00120300001064506999".into()), Some("DEUTDEFF".into()))
            .unwrap_err();
        assert!(matches!(err, DepotError::Identifier { field: "IBAN", .. }));
    }
}
