use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(
    data_dir: Option<String>,
    business_name: Option<String>,
    currency: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(name) = business_name {
        settings.business_name = name.trim().to_string();
    }
    if let Some(symbol) = currency {
        settings.currency_symbol = symbol;
    }

    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(data_dir.join("exports"))?;

    let db_path = data_dir.join("ledgerbook.db");
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;
    tracing::info!(db = %db_path.display(), "initialized ledger");

    println!("Initialized ledgerbook at {}", data_dir.display());
    println!("  Database: {}", db_path.display());
    if !settings.business_name.is_empty() {
        println!("  Business: {}", settings.business_name);
    }
    println!();
    println!("Try these next:");
    println!("  ledgerbook expense-types list");
    println!("  ledgerbook sales add 120 --date 2024-01-15 --type fiscal");
    println!("  ledgerbook report pnl --year 2024");
    Ok(())
}
