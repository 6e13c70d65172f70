use std::path::Path;

use rusqlite::Connection;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::db::{import_checksum_known, read_backup, replace_all, ImportSource};
use crate::error::{DepotError, Result};
use crate::identifiers::{validate_iban, validate_swift};
use crate::legacy::LegacyTransformer;
use crate::models::{Account, Backup, LegacyBackup};
use crate::validator::{validate_backup, validate_data_integrity, validate_legacy_data_integrity};

pub const MAX_BACKUP_BYTES: u64 = 64 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RawBackup {
    pub data: Value,
    pub checksum: String,
}

pub fn read_backup_file(file_path: &Path) -> Result<RawBackup> {
    let size = std::fs::metadata(file_path)?.len();
    if size > MAX_BACKUP_BYTES {
        return Err(DepotError::FileTooLarge { size, limit: MAX_BACKUP_BYTES });
    }
    let bytes = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let checksum = hex::encode(hasher.finalize());
    let data = serde_json::from_slice(&bytes)?;
    debug!(path = %file_path.display(), size, "read backup file");
    Ok(RawBackup { data, checksum })
}

fn check_legacy_account(account: &Account) -> Result<()> {
    validate_iban(&account.iban).map_err(|source| DepotError::Identifier { field: "IBAN", source })?;
    validate_swift(&account.swift_bic)
        .map_err(|source| DepotError::Identifier { field: "SWIFT/BIC", source })?;
    Ok(())
}

/// Run the validation passes over raw backup data, migrating legacy data on
/// the way. Only returns data that passed every check.
pub fn prepare_backup(
    data: Value,
    legacy_account: Option<Account>,
    transformer: &LegacyTransformer,
) -> Result<Backup> {
    let check = validate_backup(&data);
    if !check.is_valid {
        return Err(DepotError::InvalidBackup(check.error.unwrap_or_default()));
    }

    let backup = if check.is_legacy() {
        let legacy: LegacyBackup = serde_json::from_value(data)?;
        let errors = validate_legacy_data_integrity(&legacy);
        if !errors.is_empty() {
            return Err(DepotError::Integrity(errors));
        }
        let account = legacy_account.ok_or_else(|| {
            DepotError::InvalidBackup(format!(
                "version {} backups have no accounts; pass --iban and --swift for the account to create",
                check.version
            ))
        })?;
        check_legacy_account(&account)?;
        info!(
            stocks = legacy.stocks.len(),
            transfers = legacy.transfers.len(),
            "migrating legacy backup"
        );
        transformer.migrate(&legacy, account)?
    } else {
        serde_json::from_value(data)?
    };

    let errors = validate_data_integrity(&backup);
    if !errors.is_empty() {
        warn!(problems = errors.len(), "backup failed integrity validation");
        return Err(DepotError::Integrity(errors));
    }
    Ok(backup)
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FileReport {
    pub version: i64,
    pub legacy: bool,
    pub records: usize,
    pub errors: Vec<String>,
}

/// Validate a backup file without storing anything. Legacy files are checked
/// after migration against a placeholder account.
pub fn check_file(file_path: &Path, transformer: &LegacyTransformer) -> Result<FileReport> {
    let raw = read_backup_file(file_path)?;
    let check = validate_backup(&raw.data);
    let legacy = check.is_legacy();
    let placeholder = legacy.then(|| Account {
        id: None,
        swift_bic: "DEUTDEFF".to_string(),
        iban: "DE13120300001064506999".to_string(),
        logo_url: String::new(),
        with_depot: 1,
    });

    let (records, errors) = match prepare_backup(raw.data, placeholder, transformer) {
        Ok(backup) => (backup.record_count(), Vec::new()),
        Err(DepotError::Integrity(errors)) => (0, errors),
        Err(DepotError::InvalidBackup(msg)) => (0, vec![msg]),
        Err(DepotError::Json(e)) => (0, vec![format!("Malformed record: {e}")]),
        Err(DepotError::UnknownLegacyType(code)) => {
            (0, vec![format!("Unknown legacy booking type: {code}")])
        }
        Err(e) => return Err(e),
    };
    Ok(FileReport { version: check.version, legacy, records, errors })
}

// ---------------------------------------------------------------------------
// import / export
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ImportResult {
    pub imported: usize,
    pub source_version: i64,
    pub duplicate_file: bool,
}

pub fn import_file(
    conn: &mut Connection,
    file_path: &Path,
    legacy_account: Option<Account>,
    force: bool,
    transformer: &LegacyTransformer,
) -> Result<ImportResult> {
    let raw = read_backup_file(file_path)?;
    if !force && import_checksum_known(conn, &raw.checksum)? {
        info!(checksum = %raw.checksum, "backup already imported");
        return Ok(ImportResult { imported: 0, source_version: -1, duplicate_file: true });
    }

    let source_version = validate_backup(&raw.data).version;
    let backup = prepare_backup(raw.data, legacy_account, transformer)?;
    let source = ImportSource {
        filename: file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
        db_version: source_version,
        checksum: &raw.checksum,
    };
    replace_all(conn, &backup, &source)?;

    let imported = backup.record_count();
    info!(imported, source_version, "import finished");

    Ok(ImportResult { imported, source_version, duplicate_file: false })
}

/// Write the stored dataset as a current-version backup. Returns the number
/// of records written.
pub fn export_file(conn: &Connection, file_path: &Path) -> Result<usize> {
    let backup = read_backup(conn)?;
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&backup)?;
    std::fs::write(file_path, format!("{json}\n"))?;
    info!(path = %file_path.display(), records = backup.record_count(), "exported backup");
    Ok(backup.record_count())
}
