use std::path::PathBuf;

use colored::Colorize;

use crate::cli::report_problems;
use crate::error::{DepotError, Result};
use crate::importer::check_file;
use crate::legacy::{LegacyConfig, LegacyTransformer};

pub fn run(file: &str) -> Result<()> {
    let transformer = LegacyTransformer::new(LegacyConfig::default());
    let report = check_file(&PathBuf::from(file), &transformer)?;

    let kind = if report.legacy { " (legacy)" } else { "" };
    println!("Version:  {}{kind}", report.version);

    if report.errors.is_empty() {
        println!("Records:  {}", report.records);
        println!("{}", "Backup is valid.".green());
        return Ok(());
    }

    report_problems("Backup problems:", &report.errors);
    Err(DepotError::Integrity(report.errors))
}
