use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{db_path, load_settings};
use crate::store::count_records;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = db_path();

    println!(
        "Business:   {}",
        if settings.business_name.is_empty() { "(not set)" } else { &settings.business_name }
    );
    println!("Currency:   {}", settings.currency_symbol);
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {size} bytes");

        let conn = get_connection(&db_path)?;
        init_db(&conn)?;
        let counts = count_records(&conn)?;
        println!();
        println!("Sales:          {}", counts.sales);
        println!("Invoices:       {}", counts.invoices);
        println!("Expenses:       {}", counts.expenses);
        println!("Expense types:  {}", counts.expense_types);
    } else {
        println!();
        println!("Database not found. Run `ledgerbook init` to set up.");
    }
    Ok(())
}
