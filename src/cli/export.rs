use std::path::PathBuf;

use crate::cli::open_db;
use crate::error::Result;
use crate::importer::export_file;
use crate::settings::get_data_dir;

fn default_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    get_data_dir().join("exports").join(format!("depot-{stamp}.json"))
}

pub fn run(output: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let path = output.map(PathBuf::from).unwrap_or_else(default_path);
    let records = export_file(&conn, &path)?;
    println!("Wrote {records} records to {}", path.display());
    Ok(())
}
